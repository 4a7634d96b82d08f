use std::str::FromStr;

use crate::error::ConfigError;
use crate::models::OutputFormat;

/// 转换模式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ConversionMode {
    /// 解析 → 编辑 → 生成（三步）
    #[default]
    Staged,
    /// 单次请求直接转换
    Simple,
}

impl FromStr for ConversionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "staged" => Ok(ConversionMode::Staged),
            "simple" => Ok(ConversionMode::Simple),
            other => Err(format!("未知的转换模式: {}", other)),
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 转换服务器地址
    pub server_base_url: String,
    /// 待转换 PDF 所在目录
    pub input_folder: String,
    /// 生成的 PDF 输出目录
    pub output_folder: String,
    /// 字段修改文件（TOML，可选）
    pub edits_file: Option<String>,
    /// 会社情報文件（TOML，可选），生成前登记到服务器
    pub company_file: Option<String>,
    /// 解析请求超时（秒）
    pub extract_timeout_secs: u64,
    /// 生成请求超时（秒）
    pub generate_timeout_secs: u64,
    /// 单个文件上传大小上限（字节）
    pub max_upload_bytes: u64,
    /// 转换模式
    pub mode: ConversionMode,
    /// 简易模式的输出形式
    pub output_format: OutputFormat,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 失败记录文件
    pub failure_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_base_url: "http://127.0.0.1:5000".to_string(),
            input_folder: "input_pdf".to_string(),
            output_folder: "output_pdf".to_string(),
            edits_file: None,
            company_file: None,
            extract_timeout_secs: 120,
            generate_timeout_secs: 60,
            max_upload_bytes: 16 * 1024 * 1024,
            mode: ConversionMode::Staged,
            output_format: OutputFormat::Separate,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            failure_log_file: "warn.txt".to_string(),
        }
    }
}

impl Config {
    /// 从环境变量读取配置，未设置的项使用默认值
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 按名称查找配置项；值无法解析时报错
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let default = Self::default();
        let text = |name: &str, default: String| lookup(name).unwrap_or(default);
        let optional = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            server_base_url: text("SERVER_BASE_URL", default.server_base_url),
            input_folder: text("INPUT_FOLDER", default.input_folder),
            output_folder: text("OUTPUT_FOLDER", default.output_folder),
            edits_file: optional("EDITS_FILE").or(default.edits_file),
            company_file: optional("COMPANY_FILE").or(default.company_file),
            extract_timeout_secs: parse_var(&lookup, "EXTRACT_TIMEOUT_SECS", "u64", default.extract_timeout_secs)?,
            generate_timeout_secs: parse_var(&lookup, "GENERATE_TIMEOUT_SECS", "u64", default.generate_timeout_secs)?,
            max_upload_bytes: parse_var(&lookup, "MAX_UPLOAD_BYTES", "u64", default.max_upload_bytes)?,
            mode: parse_var(&lookup, "CONVERSION_MODE", "staged | simple", default.mode)?,
            output_format: parse_var(&lookup, "OUTPUT_FORMAT", "separate | combined", default.output_format)?,
            verbose_logging: parse_var(&lookup, "VERBOSE_LOGGING", "bool", default.verbose_logging)?,
            output_log_file: text("OUTPUT_LOG_FILE", default.output_log_file),
            failure_log_file: text("FAILURE_LOG_FILE", default.failure_log_file),
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    expected_type: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
    }
}
