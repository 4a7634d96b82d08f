//! # Listing Converter
//!
//! 一个用于批量转换物件 PDF（マイソク）的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 与转换服务器通信，只暴露能力
//! - `ConversionBackend` - 解析 / 生成 / 简易转换 / 会社情報登记 四个接口
//! - `ConversionClient` - 基于 reqwest 的 HTTP 实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个文件
//! - `FileValidator` - 文件类型和大小校验
//! - `ArtifactWriter` - 保存生成的 PDF
//! - `FailureWriter` - 写 warn.txt 能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义一批文件的完整处理流程
//! - `WorkflowState` - 整批状态（由调用方持有）
//! - `BatchController` - 流程编排（select → extract → edit → generate），
//!   以及会社情報登记和实时进度订阅
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 加载文件、调度阶段、输出统计
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{ConversionBackend, ConversionClient};
pub use config::{Config, ConversionMode};
pub use error::{AppError, AppResult};
pub use models::{
    CompanyInfo, CompanySettings, GeneratedArtifact, PropertyData, PropertyField, SelectedFile,
    WorkItem,
};
pub use orchestrator::App;
pub use workflow::{BatchController, PhaseReport, WorkflowState};
