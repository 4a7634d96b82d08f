use crate::error::{AppError, AppResult, FileError};
use crate::models::company::{CompanyInfo, CompanySettings};
use crate::models::SelectedFile;
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

#[derive(Debug, Deserialize)]
struct CompanyFile {
    /// Logo 图片路径，相对于本文件所在目录
    logo: Option<String>,
    #[serde(default)]
    company: CompanyInfo,
}

/// 从 TOML 文件加载会社情報
///
/// ```toml
/// logo = "logo.png"
///
/// [company]
/// company_name = "渋谷不動産株式会社"
/// address = "東京都渋谷区道玄坂1-2-3"
/// phone = "03-1234-5678"
/// license_number = "東京都知事(1)第12345号"
/// ```
///
/// 超过 `max_logo_bytes` 的 Logo 不读取内容，登记时由校验拒绝
pub async fn load_company(path: &Path, max_logo_bytes: u64) -> AppResult<CompanySettings> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

    let parsed: CompanyFile = toml::from_str(&content).map_err(|e| {
        AppError::File(FileError::TomlParseFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })
    })?;

    let logo = match parsed.logo.filter(|logo| !logo.trim().is_empty()) {
        Some(logo) => {
            let logo_path = path.parent().unwrap_or(Path::new(".")).join(logo.trim());
            Some(SelectedFile::load_with_limit(&logo_path, max_logo_bytes).await?)
        }
        None => None,
    };

    Ok(CompanySettings {
        info: parsed.company,
        logo,
    })
}
