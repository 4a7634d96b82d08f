//! 用户选择的文件

use std::path::Path;

use tokio::fs;

use crate::error::{AppError, AppResult};

/// 用户选择的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// 文件名
    pub name: String,
    /// 字节数
    pub size: u64,
    /// 媒体类型，例如 `application/pdf`
    pub media_type: String,
    /// 文件内容
    pub data: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: data.len() as u64,
            media_type: media_type.into(),
            data,
        }
    }

    /// 从磁盘读取文件，媒体类型按扩展名推断
    pub async fn load(path: &Path) -> AppResult<Self> {
        Self::load_with_limit(path, u64::MAX).await
    }

    /// 从磁盘读取文件，超过 `max_bytes` 时不读取内容
    ///
    /// 超限文件只带有真实大小、内容为空，由选择阶段的校验整批拒绝
    pub async fn load_with_limit(path: &Path, max_bytes: u64) -> AppResult<Self> {
        let size = fs::metadata(path)
            .await
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?
            .len();

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let media_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream");

        if size > max_bytes {
            return Ok(Self {
                name,
                size,
                media_type: media_type.to_string(),
                data: Vec::new(),
            });
        }

        let data = fs::read(path)
            .await
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

        Ok(Self::new(name, media_type, data))
    }

    /// 便于显示的文件大小
    pub fn display_size(&self) -> String {
        format_file_size(self.size)
    }
}

/// 格式化文件大小，例如 `1.5 KB`
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
