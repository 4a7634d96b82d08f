//! 批量文件处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一批文件的加载、调度和结果输出。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：初始化日志文件、创建转换服务器客户端
//! 2. **批量加载**：扫描输入目录中的所有文件（`Vec<SelectedFile>`）
//! 3. **流程调度**：登记会社情報 → 选择 → 解析 → 应用字段修改 → 生成（或简易模式直接转换）
//! 4. **结果输出**：保存生成的 PDF，失败记录写入 warn.txt
//! 5. **全局统计**：汇总整批的处理结果
//!
//! ## 设计特点
//!
//! - **状态所有者**：`WorkflowState` 只在 `run()` 中创建并显式传给每个阶段
//! - **向下委托**：单个文件的请求和失败处理交给 `BatchController`

use crate::clients::ConversionClient;
use crate::config::{Config, ConversionMode};
use crate::error::{AppError, AppResult, WorkflowError};
use crate::models::{self, PropertyField, SelectedFile};
use crate::services::file_validator::MAX_IMAGE_ASSET_BYTES;
use crate::services::{ArtifactWriter, FailureWriter};
use crate::utils::logging::{
    init_log_file, log_files_loaded, log_stage_complete, log_stage_start, log_startup,
    print_final_stats, truncate_text,
};
use crate::workflow::{BatchController, PhaseReport, WorkflowState};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    controller: BatchController<ConversionClient>,
    artifact_writer: ArtifactWriter,
    failure_writer: FailureWriter,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)?;

        log_startup(&config.server_base_url, mode_name(config.mode));

        let client = ConversionClient::new(&config)?;
        let controller = BatchController::new(client, &config);

        Ok(Self {
            artifact_writer: ArtifactWriter::new(&config.output_folder),
            failure_writer: FailureWriter::with_path(&config.failure_log_file),
            controller,
            config,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        let files = self.load_files().await?;

        if files.is_empty() {
            warn!("⚠️ 没有找到待处理的PDF文件，程序结束");
            return Ok(());
        }

        log_files_loaded(files.len(), &self.config.input_folder);

        let mut state = WorkflowState::new();
        self.controller
            .select(&mut state, files)
            .context("文件校验未通过，整批取消")?;

        let total = state.items().len();
        let outcome = match self.config.mode {
            ConversionMode::Staged => self.run_staged(&mut state).await,
            ConversionMode::Simple => self.run_simple(&mut state).await,
        };

        let (generated, failure) = match outcome {
            Ok(()) => {
                let paths = self.artifact_writer.write_all(state.artifacts()).await?;
                for path in &paths {
                    info!("💾 已保存: {}", path.display());
                }
                (paths.len(), None)
            }
            Err(e) => {
                error!("❌ 处理错误: {:#}", e);
                (0, Some(e))
            }
        };

        print_final_stats(
            generated,
            total - generated,
            total,
            &self.config.output_folder,
            &self.config.output_log_file,
        );

        self.controller.reset(&mut state);

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// 加载待处理文件
    async fn load_files(&self) -> Result<Vec<SelectedFile>> {
        info!("\n📁 正在扫描待处理的文件...");
        let files =
            models::load_selected_files(&self.config.input_folder, self.config.max_upload_bytes)
                .await?;
        Ok(files)
    }

    /// 解析 → 修改 → 生成
    async fn run_staged(&self, state: &mut WorkflowState) -> Result<()> {
        self.register_company().await?;

        log_stage_start("上传解析", state.items().len());
        let extracted = self
            .finish_stage(self.controller.extract_all(state).await)
            .await?;
        log_stage_complete("上传解析", extracted.success_count(), extracted.total);

        self.apply_edits(state).await?;

        if self.config.verbose_logging {
            log_extracted_data(state);
        }

        log_stage_start("マイソク生成", extracted.success_count());
        let generated = self
            .finish_stage(self.controller.generate_all(state).await)
            .await?;
        log_stage_complete("マイソク生成", generated.success_count(), generated.total);

        Ok(())
    }

    /// 简易模式
    async fn run_simple(&self, state: &mut WorkflowState) -> Result<()> {
        log_stage_start("转换", state.items().len());
        let report = self
            .finish_stage(
                self.controller
                    .convert_all(state, self.config.output_format)
                    .await,
            )
            .await?;
        log_stage_complete("转换", report.success_count(), report.total);

        Ok(())
    }

    /// 登记会社情報（未配置时跳过，由服务器已有的设置决定能否生成）
    async fn register_company(&self) -> Result<()> {
        let Some(company_file) = &self.config.company_file else {
            warn!("⚠️ 未配置 COMPANY_FILE，将使用服务器上已登记的会社情報");
            return Ok(());
        };

        let company = models::load_company(Path::new(company_file), MAX_IMAGE_ASSET_BYTES)
            .await
            .with_context(|| format!("无法加载会社情報: {}", company_file))?;
        self.controller
            .register_company(&company)
            .await
            .context("会社情報登记失败")?;

        Ok(())
    }

    /// 应用字段修改文件
    async fn apply_edits(&self, state: &mut WorkflowState) -> Result<()> {
        let Some(edits_file) = &self.config.edits_file else {
            return Ok(());
        };

        let edits = models::load_edits(Path::new(edits_file)).await?;
        info!("✏️ 正在应用 {} 条字段修改...", edits.len());

        for edit in &edits {
            match state.apply_edit(edit) {
                Ok(()) => info!("  ✓ {:?} {} = {}", edit.target, edit.field, edit.value),
                Err(e) => warn!("  ⚠️ 字段修改未应用 ({:?} {}): {}", edit.target, edit.field, e),
            }
        }

        Ok(())
    }

    /// 记录失败并区分“部分失败”和“全部失败”
    async fn finish_stage(&self, result: AppResult<PhaseReport>) -> Result<PhaseReport> {
        match result {
            Ok(report) => {
                for failure in &report.failures {
                    self.failure_writer.write(failure).await?;
                }
                if report.is_partial() {
                    warn!(
                        "⚠️ {}部分失败: {}/{} 个文件失败，详见 {}",
                        report.stage,
                        report.failures.len(),
                        report.total,
                        self.failure_writer.path().display()
                    );
                }
                Ok(report)
            }
            Err(AppError::Workflow(WorkflowError::AllFailed { stage, failures })) => {
                for failure in &failures {
                    self.failure_writer.write(failure).await?;
                }
                error!("❌ 所有文件的{}都失败了", stage);
                Err(AppError::Workflow(WorkflowError::AllFailed { stage, failures }).into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn mode_name(mode: ConversionMode) -> &'static str {
    match mode {
        ConversionMode::Staged => "解析 → 编辑 → 生成",
        ConversionMode::Simple => "简易转换",
    }
}

/// 显示解析结果
fn log_extracted_data(state: &WorkflowState) {
    for item in state.extracted_items() {
        info!("📋 [{}] {}", item.index + 1, item.file.name);
        if let Some(data) = &item.extraction {
            for field in PropertyField::ALL {
                let value = data.get(field);
                if !value.is_empty() {
                    info!("    {}: {}", field, truncate_text(&value, 60));
                }
            }
        }
        if let Some(raw_text) = &item.raw_text {
            info!("    📝 {}", truncate_text(&raw_text.replace('\n', " "), 100));
        }
    }
}
