use crate::error::{AppError, AppResult, FileError};
use crate::models::property::{join_features, PropertyField};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;

/// 指定要修改的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemSelector {
    /// 按选择顺序（从0开始）
    Index(usize),
    /// 按文件名
    FileName(String),
}

/// 一条字段修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEdit {
    pub target: ItemSelector,
    pub field: PropertyField,
    pub value: String,
}

#[derive(Debug, Deserialize)]
struct EditsFile {
    #[serde(default)]
    edit: Vec<EditEntry>,
}

#[derive(Debug, Deserialize)]
struct EditEntry {
    file: Option<String>,
    index: Option<usize>,
    #[serde(flatten)]
    fields: BTreeMap<String, toml::Value>,
}

/// 从 TOML 文件加载字段修改
///
/// ```toml
/// [[edit]]
/// file = "物件A.pdf"
/// price = "3,980万円"
/// features = "駐車場、南向き"
/// ```
pub async fn load_edits(path: &Path) -> AppResult<Vec<FieldEdit>> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

    parse_edits(&content).map_err(|e| match e {
        AppError::File(FileError::TomlParseFailed { source, .. }) => {
            AppError::File(FileError::TomlParseFailed {
                path: path.display().to_string(),
                source,
            })
        }
        other => other,
    })
}

/// 解析 TOML 格式的字段修改
pub fn parse_edits(content: &str) -> AppResult<Vec<FieldEdit>> {
    let parsed: EditsFile = toml::from_str(content)?;

    let mut edits = Vec::new();
    for (position, entry) in parsed.edit.into_iter().enumerate() {
        let target = match (entry.index, entry.file) {
            (Some(index), _) => ItemSelector::Index(index),
            (None, Some(file)) => ItemSelector::FileName(file),
            (None, None) => {
                return Err(AppError::Other(format!(
                    "第 {} 条修改缺少 file 或 index",
                    position + 1
                )))
            }
        };

        for (key, value) in entry.fields {
            let field: PropertyField = key.parse()?;
            let value = match value {
                toml::Value::String(s) => s,
                toml::Value::Array(items) => {
                    let items: Vec<String> = items
                        .into_iter()
                        .map(|item| match item {
                            toml::Value::String(s) => s,
                            other => other.to_string(),
                        })
                        .collect();
                    join_features(&items)
                }
                other => other.to_string(),
            };

            edits.push(FieldEdit {
                target: target.clone(),
                field,
                value,
            });
        }
    }

    tracing::debug!("加载了 {} 条字段修改", edits.len());

    Ok(edits)
}
