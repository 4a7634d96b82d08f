use std::fmt;

use crate::workflow::{ItemFailure, Stage};

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 文件校验错误（发送前）
    Validation(ValidationError),
    /// API 调用错误（网络 / 超时 / 服务器返回错误）
    Api(ApiError),
    /// 文件操作错误
    File(FileError),
    /// 流程错误
    Workflow(WorkflowError),
    /// 配置错误
    Config(ConfigError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "校验错误: {}", e),
            AppError::Api(e) => write!(f, "API错误: {}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Workflow(e) => write!(f, "流程错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Validation(e) => Some(e),
            AppError::Api(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::Workflow(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 文件校验错误
///
/// 只要有一个文件不合格，整批文件都会被拒绝，`messages` 中逐条列出原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub messages: Vec<String>,
}

impl ValidationError {
    pub fn new(messages: Vec<String>) -> Self {
        Self { messages }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages.join("; "))
    }
}

impl std::error::Error for ValidationError {}

/// API 调用错误
#[derive(Debug)]
pub enum ApiError {
    /// 网络请求失败
    RequestFailed {
        endpoint: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 请求超时
    Timeout {
        endpoint: String,
        timeout_secs: u64,
    },
    /// HTTP 状态码异常
    BadStatus {
        endpoint: String,
        status: u16,
        message: Option<String>,
    },
    /// 服务器返回 status=error
    ServerReported {
        endpoint: String,
        message: String,
    },
    /// 响应缺少必要字段
    MissingField {
        endpoint: String,
        field: &'static str,
    },
    /// JSON 解析失败
    JsonParseFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// PDF 数据解码失败
    DecodeFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApiError {
    /// 是否属于传输层错误（网络 / 超时 / 状态码）
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ApiError::RequestFailed { .. } | ApiError::Timeout { .. } | ApiError::BadStatus { .. }
        )
    }

    /// 面向用户的简短说明
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Timeout { .. } => "处理超时".to_string(),
            ApiError::BadStatus {
                message: Some(message),
                ..
            }
            | ApiError::ServerReported { message, .. } => message.clone(),
            ApiError::BadStatus { status, .. } => format!("HTTP {}", status),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::RequestFailed { endpoint, source } => {
                write!(f, "API请求失败 ({}): {}", endpoint, source)
            }
            ApiError::Timeout {
                endpoint,
                timeout_secs,
            } => {
                write!(f, "API请求超时 ({}): 超过 {} 秒", endpoint, timeout_secs)
            }
            ApiError::BadStatus {
                endpoint,
                status,
                message,
            } => {
                write!(
                    f,
                    "API返回异常状态码 ({}): HTTP {}, message={:?}",
                    endpoint, status, message
                )
            }
            ApiError::ServerReported { endpoint, message } => {
                write!(f, "服务器返回错误 ({}): {}", endpoint, message)
            }
            ApiError::MissingField { endpoint, field } => {
                write!(f, "API响应缺少字段 ({}): {}", endpoint, field)
            }
            ApiError::JsonParseFailed { source } => {
                write!(f, "JSON解析失败: {}", source)
            }
            ApiError::DecodeFailed { source } => {
                write!(f, "PDF数据解码失败: {}", source)
            }
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::RequestFailed { source, .. }
            | ApiError::JsonParseFailed { source }
            | ApiError::DecodeFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 文件操作错误
#[derive(Debug)]
pub enum FileError {
    /// 文件不存在
    NotFound {
        path: String,
    },
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// TOML 解析失败
    TomlParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 目录不存在
    DirectoryNotFound {
        path: String,
    },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::NotFound { path } => write!(f, "文件不存在: {}", path),
            FileError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            FileError::WriteFailed { path, source } => {
                write!(f, "写入文件失败 ({}): {}", path, source)
            }
            FileError::TomlParseFailed { path, source } => {
                write!(f, "TOML解析失败 ({}): {}", path, source)
            }
            FileError::DirectoryNotFound { path } => write!(f, "目录不存在: {}", path),
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::ReadFailed { source, .. }
            | FileError::WriteFailed { source, .. }
            | FileError::TomlParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 流程错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// 没有选择任何文件
    NoFilesSelected,
    /// 没有解析成功的文件，无法生成
    NothingExtracted,
    /// 索引超出范围
    IndexOutOfRange {
        index: usize,
        len: usize,
    },
    /// 该文件尚未解析成功
    NotExtracted {
        index: usize,
    },
    /// 未知的字段名
    UnknownField {
        field: String,
    },
    /// 指定的文件不在本批中
    FileNotSelected {
        name: String,
    },
    /// 整批全部失败
    AllFailed {
        stage: Stage,
        failures: Vec<ItemFailure>,
    },
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowError::NoFilesSelected => write!(f, "请先选择PDF文件"),
            WorkflowError::NothingExtracted => write!(f, "请先上传并解析PDF"),
            WorkflowError::IndexOutOfRange { index, len } => {
                write!(f, "索引 {} 超出范围 (共 {} 个文件)", index, len)
            }
            WorkflowError::NotExtracted { index } => {
                write!(f, "第 {} 个文件尚未解析成功", index + 1)
            }
            WorkflowError::UnknownField { field } => write!(f, "未知字段: {}", field),
            WorkflowError::FileNotSelected { name } => write!(f, "未选择该文件: {}", name),
            WorkflowError::AllFailed { stage, failures } => {
                let details: Vec<String> = failures
                    .iter()
                    .map(|failure| format!("{}: {}", failure.name, failure.message))
                    .collect();
                write!(f, "{}全部失败: {}", stage, details.join("; "))
            }
        }
    }
}

impl std::error::Error for WorkflowError {}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 环境变量解析失败
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// HTTP 客户端创建失败
    ClientBuildFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EnvVarParseFailed {
                var_name,
                value,
                expected_type,
            } => {
                write!(
                    f,
                    "环境变量 {} 解析失败: 值 '{}' 无法转换为 {}",
                    var_name, value, expected_type
                )
            }
            ConfigError::ClientBuildFailed { source } => {
                write!(f, "HTTP客户端创建失败: {}", source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ClientBuildFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

// ========== 从常见错误类型转换 ==========

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        AppError::Api(err)
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        AppError::Workflow(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Api(ApiError::JsonParseFailed {
            source: Box::new(err),
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::File(FileError::TomlParseFailed {
            path: String::new(), // TOML错误通常不包含路径信息
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
