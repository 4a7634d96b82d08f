//! 转换服务接口
//!
//! 流程层只依赖这个 trait，HTTP 细节由 `ConversionClient` 实现

use async_trait::async_trait;
use std::time::Duration;

use crate::error::ApiError;
use crate::models::{CompanySettings, OutputFormat, PropertyData, SelectedFile};

/// 解析接口返回的数据
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedDocument {
    /// 服务器分配的文件ID，生成时回传
    pub file_id: String,
    /// 服务器整理后的文件名
    pub filename: Option<String>,
    pub data: PropertyData,
    /// PDF 文本预览
    pub raw_text: Option<String>,
}

/// 生成接口返回的 PDF
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPdf {
    pub filename: Option<String>,
    pub data: Vec<u8>,
}

/// 转换服务
#[async_trait]
pub trait ConversionBackend: Send + Sync {
    /// 上传 PDF 并解析物件数据
    async fn extract(
        &self,
        file: &SelectedFile,
        timeout: Duration,
    ) -> Result<ExtractedDocument, ApiError>;

    /// 根据（修改后的）物件数据生成 マイソク PDF
    async fn generate(
        &self,
        data: &PropertyData,
        file_id: &str,
        timeout: Duration,
    ) -> Result<GeneratedPdf, ApiError>;

    /// 单次请求完成解析和生成
    async fn convert(
        &self,
        file: &SelectedFile,
        output_format: OutputFormat,
        timeout: Duration,
    ) -> Result<GeneratedPdf, ApiError>;

    /// 登记会社情報（含可选 Logo），返回服务器的提示信息
    async fn save_company(
        &self,
        company: &CompanySettings,
        timeout: Duration,
    ) -> Result<String, ApiError>;
}
