use crate::error::{AppError, AppResult, FileError};
use crate::models::SelectedFile;
use std::path::PathBuf;
use tokio::fs;

/// 从文件夹中加载所有待转换的文件（按文件名排序）
///
/// 隐藏文件会被跳过；类型和大小的校验交给选择阶段，
/// 超过 `max_bytes` 的文件不读取内容
pub async fn load_selected_files(
    folder_path: &str,
    max_bytes: u64,
) -> AppResult<Vec<SelectedFile>> {
    let folder = PathBuf::from(folder_path);

    if !folder.is_dir() {
        return Err(AppError::File(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        }));
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let hidden = path
            .file_name()
            .map(|n| n.to_string_lossy().starts_with('.'))
            .unwrap_or(true);
        if path.is_file() && !hidden {
            paths.push(path);
        }
    }

    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = SelectedFile::load_with_limit(&path, max_bytes).await?;
        tracing::info!("正在加载: {} ({})", file.name, file.display_size());
        files.push(file);
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{FileConstraints, FileValidator};

    #[tokio::test]
    async fn test_load_selected_files_sorted_and_skips_hidden() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.pdf"), b"%PDF-b").unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"%PDF-a").unwrap();
        std::fs::write(dir.path().join(".DS_Store"), b"x").unwrap();

        let files = load_selected_files(dir.path().to_str().unwrap(), u64::MAX)
            .await
            .unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
    }

    #[tokio::test]
    async fn test_oversized_file_rejected_at_select_without_loading() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"%PDF-a").unwrap();
        std::fs::write(dir.path().join("b.pdf"), vec![b'x'; 2048]).unwrap();

        let files = load_selected_files(dir.path().to_str().unwrap(), 1024)
            .await
            .unwrap();
        assert_eq!(files[1].size, 2048);
        assert!(files[1].data.is_empty());

        let validator = FileValidator::new(FileConstraints::document_with_limit(1024));
        let err = validator.validate_batch(files).unwrap_err();
        assert_eq!(err.messages.len(), 1);
        assert!(err.messages[0].starts_with("b.pdf: ファイルサイズが大きすぎます"));
    }

    #[tokio::test]
    async fn test_load_selected_files_missing_folder() {
        let result = load_selected_files("/nonexistent/listing_converter", u64::MAX).await;
        assert!(matches!(
            result,
            Err(AppError::File(FileError::DirectoryNotFound { .. }))
        ));
    }
}
