//! 文件校验服务 - 业务能力层
//!
//! 在发送任何请求之前检查媒体类型和文件大小

use crate::error::ValidationError;
use crate::models::SelectedFile;

/// PDF 上传大小上限
pub const MAX_DOCUMENT_BYTES: u64 = 16 * 1024 * 1024;
/// 公司 Logo 等图片素材大小上限
pub const MAX_IMAGE_ASSET_BYTES: u64 = 2 * 1024 * 1024;

/// 文件约束
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileConstraints {
    pub allowed_types: Vec<String>,
    pub max_bytes: u64,
    /// 类型不符时的提示
    pub type_message: String,
}

impl FileConstraints {
    /// 物件 PDF
    pub fn document() -> Self {
        Self::document_with_limit(MAX_DOCUMENT_BYTES)
    }

    /// 物件 PDF（自定义大小上限）
    pub fn document_with_limit(max_bytes: u64) -> Self {
        Self {
            allowed_types: vec!["application/pdf".to_string()],
            max_bytes,
            type_message: "PDFファイルではありません".to_string(),
        }
    }

    /// 图片素材（公司 Logo）
    pub fn image_asset() -> Self {
        Self {
            allowed_types: vec![
                "image/png".to_string(),
                "image/jpeg".to_string(),
                "image/jpg".to_string(),
            ],
            max_bytes: MAX_IMAGE_ASSET_BYTES,
            type_message: "PNG、JPG形式のファイルを選択してください".to_string(),
        }
    }

    /// 检查单个文件，返回失败原因
    pub fn check(&self, file: &SelectedFile) -> Option<String> {
        if !self.allowed_types.iter().any(|t| t == &file.media_type) {
            return Some(format!("{}: {}", file.name, self.type_message));
        }

        if file.size > self.max_bytes {
            return Some(format!(
                "{}: ファイルサイズが大きすぎます（{}以下）",
                file.name,
                crate::models::format_file_size(self.max_bytes)
            ));
        }

        None
    }
}

impl Default for FileConstraints {
    fn default() -> Self {
        Self::document()
    }
}

/// 文件校验服务
///
/// 职责：
/// - 逐个检查文件类型和大小
/// - 任意一个文件不合格则整批拒绝
pub struct FileValidator {
    constraints: FileConstraints,
}

impl FileValidator {
    pub fn new(constraints: FileConstraints) -> Self {
        Self { constraints }
    }

    pub fn constraints(&self) -> &FileConstraints {
        &self.constraints
    }

    /// 校验整批文件
    ///
    /// 全部合格时原样返回；否则返回逐条的错误信息
    pub fn validate_batch(
        &self,
        files: Vec<SelectedFile>,
    ) -> Result<Vec<SelectedFile>, ValidationError> {
        let errors: Vec<String> = files
            .iter()
            .filter_map(|file| self.constraints.check(file))
            .collect();

        if errors.is_empty() {
            Ok(files)
        } else {
            Err(ValidationError::new(errors))
        }
    }
}

impl Default for FileValidator {
    fn default() -> Self {
        Self::new(FileConstraints::document())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str, size: usize) -> SelectedFile {
        SelectedFile::new(name, "application/pdf", vec![0u8; size])
    }

    #[test]
    fn test_accepts_valid_pdfs() {
        let validator = FileValidator::default();
        let files = vec![pdf("a.pdf", 10), pdf("b.pdf", 20)];
        assert_eq!(validator.validate_batch(files.clone()).unwrap(), files);
    }

    #[test]
    fn test_rejects_batch_with_itemized_messages() {
        let validator = FileValidator::new(FileConstraints::document_with_limit(100));
        let files = vec![
            pdf("a.pdf", 10),
            SelectedFile::new("memo.txt", "text/plain", b"hi".to_vec()),
            pdf("big.pdf", 101),
        ];

        let err = validator.validate_batch(files).unwrap_err();
        assert_eq!(err.messages.len(), 2);
        assert!(err.messages[0].starts_with("memo.txt"));
        assert!(err.messages[1].starts_with("big.pdf"));
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let constraints = FileConstraints::document_with_limit(100);
        assert!(constraints.check(&pdf("edge.pdf", 100)).is_none());
        assert!(constraints.check(&pdf("over.pdf", 101)).is_some());
    }

    #[test]
    fn test_image_asset_constraints() {
        let constraints = FileConstraints::image_asset();
        let logo = SelectedFile::new("logo.png", "image/png", vec![0u8; 1024]);
        assert!(constraints.check(&logo).is_none());

        let gif = SelectedFile::new("logo.gif", "image/gif", vec![0u8; 1024]);
        assert!(constraints.check(&gif).is_some());

        let huge = SelectedFile::new(
            "logo.jpg",
            "image/jpeg",
            vec![0u8; (MAX_IMAGE_ASSET_BYTES + 1) as usize],
        );
        let message = constraints.check(&huge).unwrap();
        assert!(message.contains("2 MB"));
    }
}
