//! 单个文件在 选择 → 解析 → 生成 流程中的状态

use crate::models::{PropertyData, SelectedFile};

/// 工作项
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    /// 选择顺序（从0开始）
    pub index: usize,
    pub file: SelectedFile,
    /// 解析结果，解析成功前为 None
    pub extraction: Option<PropertyData>,
    /// 服务器分配的文件ID
    pub file_id: Option<String>,
    /// 服务器返回的文件名
    pub server_filename: Option<String>,
    /// PDF 文本预览
    pub raw_text: Option<String>,
    /// 最近一次失败原因
    pub error: Option<String>,
}

impl WorkItem {
    pub fn new(index: usize, file: SelectedFile) -> Self {
        Self {
            index,
            file,
            extraction: None,
            file_id: None,
            server_filename: None,
            raw_text: None,
            error: None,
        }
    }

    /// 是否已解析成功（可以进入生成阶段）
    pub fn is_extracted(&self) -> bool {
        self.extraction.is_some() && self.file_id.is_some()
    }

    pub fn label(&self) -> &str {
        &self.file.name
    }

    /// 清除解析结果
    pub(crate) fn clear_extraction(&mut self) {
        self.extraction = None;
        self.file_id = None;
        self.server_filename = None;
        self.raw_text = None;
        self.error = None;
    }
}

/// 生成的 PDF
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    /// 对应工作项的索引
    pub index: usize,
    pub filename: String,
    pub data: Vec<u8>,
}

/// 简易模式的输出形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// 每个物件一个文件
    #[default]
    Separate,
    /// 合并为一个文件
    Combined,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Separate => "separate",
            OutputFormat::Combined => "combined",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "separate" => Ok(OutputFormat::Separate),
            "combined" => Ok(OutputFormat::Combined),
            other => Err(format!("未知的输出形式: {}", other)),
        }
    }
}
