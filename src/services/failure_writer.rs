//! 失败记录服务 - 业务能力层
//!
//! 只负责“写 warn.txt”能力，不关心流程

use crate::error::AppResult;
use crate::workflow::ItemFailure;
use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// 失败记录服务
///
/// 职责：
/// - 将处理失败的文件追加写入 warn.txt
/// - 每次只写一条失败记录
pub struct FailureWriter {
    failure_file_path: String,
}

impl FailureWriter {
    /// 创建新的失败记录服务
    pub fn new() -> Self {
        Self {
            failure_file_path: "warn.txt".to_string(),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            failure_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        Path::new(&self.failure_file_path)
    }

    /// 写入失败信息
    pub async fn write(&self, failure: &ItemFailure) -> AppResult<()> {
        debug!(
            "写入失败记录: {} | 文件 {} | {}",
            failure.stage, failure.index, failure.name
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.failure_file_path)
            .await?;

        let line = format!(
            "[{}] {} | 文件 {} | {} | 原因: {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            failure.stage,
            failure.index + 1,
            failure.name,
            failure.message
        );

        file.write_all(line.as_bytes()).await?;

        Ok(())
    }
}

impl Default for FailureWriter {
    fn default() -> Self {
        Self::new()
    }
}
