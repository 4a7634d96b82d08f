//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责整批文件的加载、阶段调度和结果统计，是整个系统的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<SelectedFile>)
//!     ↓
//! workflow::BatchController (逐个文件：解析 / 生成 / 转换)
//!     ↓
//! services (能力层：校验 / 保存 PDF / 写 warn.txt)
//!     ↓
//! clients (转换服务器：ConversionBackend)
//! ```
//!
//! ## 设计原则
//!
//! 1. **状态显式传递**：`WorkflowState` 由编排层创建，以 `&mut` 传给每个阶段
//! 2. **向下依赖**：编排层 → workflow → services / clients
//! 3. **无业务逻辑**：只做调度和统计，不做具体业务判断

pub mod batch_processor;

// 重新导出主要类型
pub use batch_processor::App;
