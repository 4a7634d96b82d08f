//! PDF 保存服务 - 业务能力层
//!
//! 只负责把生成的 PDF 写入输出目录（相当于“下载”）

use crate::error::{AppError, AppResult};
use crate::models::GeneratedArtifact;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// PDF 保存服务
pub struct ArtifactWriter {
    output_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 保存单个 PDF，返回写入路径
    pub async fn write(&self, artifact: &GeneratedArtifact) -> AppResult<PathBuf> {
        fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| AppError::file_write_failed(self.output_dir.display().to_string(), e))?;

        let path = self.output_dir.join(&artifact.filename);

        // 文件名必须是单独一段，不能带目录
        let plain = Path::new(&artifact.filename).file_name() == Some(OsStr::new(&artifact.filename));
        if !plain || artifact.filename.contains('\\') {
            return Err(AppError::file_write_failed(
                path.display().to_string(),
                io::Error::new(io::ErrorKind::InvalidInput, "文件名不能包含路径"),
            ));
        }

        debug!("保存 PDF: {} ({} 字节)", path.display(), artifact.data.len());

        fs::write(&path, &artifact.data)
            .await
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;

        Ok(path)
    }

    /// 保存全部 PDF
    ///
    /// 同一批中出现重复文件名时报错，不覆盖已写入的文件
    pub async fn write_all(&self, artifacts: &[GeneratedArtifact]) -> AppResult<Vec<PathBuf>> {
        let mut seen = HashSet::new();
        if let Some(duplicate) = artifacts.iter().find(|a| !seen.insert(a.filename.as_str())) {
            let path = self.output_dir.join(&duplicate.filename);
            return Err(AppError::file_write_failed(
                path.display().to_string(),
                io::Error::new(io::ErrorKind::AlreadyExists, "同一批中文件名重复"),
            ));
        }

        let mut paths = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            paths.push(self.write(artifact).await?);
        }
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FileError;

    fn artifact(index: usize, filename: &str, data: &[u8]) -> GeneratedArtifact {
        GeneratedArtifact {
            index,
            filename: filename.to_string(),
            data: data.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_write_all_creates_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path().join("out"));
        let artifacts = vec![
            artifact(0, "mysouku_a.pdf", b"%PDF-a"),
            artifact(1, "mysouku_b.pdf", b"%PDF-b"),
        ];

        let paths = writer.write_all(&artifacts).await.unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(std::fs::read(&paths[0]).unwrap(), b"%PDF-a");
        assert_eq!(paths[1], dir.path().join("out").join("mysouku_b.pdf"));
    }

    #[tokio::test]
    async fn test_write_rejects_names_with_directories() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path());

        for name in ["../escape.pdf", "x/m.pdf", "x\\m.pdf", ".."] {
            let result = writer.write(&artifact(0, name, b"%PDF")).await;
            assert!(
                matches!(result, Err(AppError::File(FileError::WriteFailed { .. }))),
                "{} should be rejected",
                name
            );
        }
        assert!(!dir.path().parent().unwrap().join("escape.pdf").exists());
    }

    #[tokio::test]
    async fn test_write_all_never_overwrites_within_batch() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path());
        let artifacts = vec![artifact(0, "m.pdf", b"A"), artifact(1, "m.pdf", b"B")];

        assert!(writer.write_all(&artifacts).await.is_err());
        assert!(!dir.path().join("m.pdf").exists());
    }
}
