//! 批量文件处理流程 - 流程层
//!
//! 核心职责：驱动整批文件依次经过 选择 → 解析 → 生成
//!
//! - 每个阶段逐个文件处理，按选择顺序，一次只有一个请求在途
//! - 单个文件失败（网络 / 超时 / 服务器错误）只记录，不影响后续文件
//! - 整批全部失败时返回 `WorkflowError::AllFailed`，与部分失败区分
//! - 不持有批处理状态，状态由调用方通过 `&mut WorkflowState` 传入
//! - 进度事件在发生时立即送给订阅者（`subscribe`），同时汇总到 `PhaseReport`

use std::collections::HashSet;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::clients::ConversionBackend;
use crate::config::Config;
use crate::error::{AppResult, ValidationError, WorkflowError};
use crate::models::{
    CompanySettings, GeneratedArtifact, OutputFormat, PropertyField, SelectedFile, WorkItem,
};
use crate::services::{FileConstraints, FileValidator};
use crate::workflow::progress::{PhaseReport, ProgressEvent, ProgressStatus, Stage};
use crate::workflow::state::{Phase, WorkflowState};

/// 批量处理控制器
pub struct BatchController<B: ConversionBackend> {
    backend: B,
    validator: FileValidator,
    extract_timeout: Duration,
    generate_timeout: Duration,
    progress: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl<B: ConversionBackend> BatchController<B> {
    /// 按配置创建控制器
    pub fn new(backend: B, config: &Config) -> Self {
        Self {
            backend,
            validator: FileValidator::new(FileConstraints::document_with_limit(
                config.max_upload_bytes,
            )),
            extract_timeout: Duration::from_secs(config.extract_timeout_secs),
            generate_timeout: Duration::from_secs(config.generate_timeout_secs),
            progress: None,
        }
    }

    /// 自定义校验规则和超时
    pub fn with_settings(
        backend: B,
        validator: FileValidator,
        extract_timeout: Duration,
        generate_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            validator,
            extract_timeout,
            generate_timeout,
            progress: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// 订阅实时进度
    ///
    /// 每个事件在处理过程中立即送出；再次订阅会替换之前的订阅者
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ProgressEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.progress = Some(tx);
        rx
    }

    /// 向服务器登记会社情報
    ///
    /// 必填项、格式和 Logo（PNG / JPG，2MB 以下）全部合格后才发送
    pub async fn register_company(&self, company: &CompanySettings) -> AppResult<String> {
        let mut errors = match company.info.validate() {
            Ok(()) => Vec::new(),
            Err(e) => e.messages,
        };
        if let Some(message) = company
            .logo
            .as_ref()
            .and_then(|logo| FileConstraints::image_asset().check(logo))
        {
            errors.push(message);
        }

        if !errors.is_empty() {
            warn!("❌ 会社情報校验失败:\n{}", errors.join("\n"));
            return Err(ValidationError::new(errors).into());
        }

        let message = self
            .backend
            .save_company(company, self.generate_timeout)
            .await?;
        info!("🏢 {}: {}", company.info.company_name, message);
        Ok(message)
    }

    /// 选择文件
    ///
    /// 先清空当前状态；任意文件不合格则整批拒绝，状态保持为空
    pub fn select(&self, state: &mut WorkflowState, files: Vec<SelectedFile>) -> AppResult<usize> {
        state.reset();

        if files.is_empty() {
            return Err(WorkflowError::NoFilesSelected.into());
        }

        let files = self.validator.validate_batch(files).map_err(|e| {
            warn!("❌ 文件校验失败:\n{}", e.messages.join("\n"));
            e
        })?;

        state.items = files
            .into_iter()
            .enumerate()
            .map(|(index, file)| WorkItem::new(index, file))
            .collect();
        state.phase = Phase::Selected;

        info!("✓ 选择了 {} 个文件", state.items.len());
        for item in &state.items {
            info!("  📄 {} ({})", item.file.name, item.file.display_size());
        }

        Ok(state.items.len())
    }

    /// 依次上传并解析所有文件
    pub async fn extract_all(&self, state: &mut WorkflowState) -> AppResult<PhaseReport> {
        if state.items.is_empty() {
            return Err(WorkflowError::NoFilesSelected.into());
        }

        state.artifacts.clear();
        let total = state.items.len();
        let mut report = PhaseReport::new(Stage::Extract, total);

        for (position, item) in state.items.iter_mut().enumerate() {
            item.clear_extraction();
            let mut event = progress_event(Stage::Extract, item, position + 1, total);
            self.report_event(&mut report, event.clone());

            match self.backend.extract(&item.file, self.extract_timeout).await {
                Ok(document) => {
                    item.extraction = Some(document.data);
                    item.file_id = Some(document.file_id);
                    item.server_filename = document.filename;
                    item.raw_text = document.raw_text;
                    event.status = ProgressStatus::Succeeded;
                }
                Err(e) => {
                    warn!(
                        "[文件 {}/{}] ⚠️ {} 的处理出错: {}",
                        position + 1,
                        total,
                        item.file.name,
                        e
                    );
                    let message = e.user_message();
                    item.error = Some(message.clone());
                    event.status = ProgressStatus::Failed(message);
                }
            }
            self.report_event(&mut report, event);
        }

        info!(
            "✓ 全部 {} 个文件处理完成，成功解析 {} 个",
            total,
            report.success_count()
        );

        if report.succeeded.is_empty() {
            state.phase = Phase::Selected;
            return Err(WorkflowError::AllFailed {
                stage: Stage::Extract,
                failures: report.failures,
            }
            .into());
        }

        state.phase = Phase::Extracted;
        Ok(report)
    }

    /// 修改解析结果中的字段
    pub fn edit_field(
        &self,
        state: &mut WorkflowState,
        index: usize,
        field: PropertyField,
        value: &str,
    ) -> AppResult<()> {
        state.edit_field(index, field, value)?;
        Ok(())
    }

    /// 为每个解析成功的文件生成 マイソク
    pub async fn generate_all(&self, state: &mut WorkflowState) -> AppResult<PhaseReport> {
        let targets: Vec<usize> = state.extracted_items().map(|item| item.index).collect();
        if targets.is_empty() {
            return Err(WorkflowError::NothingExtracted.into());
        }

        state.artifacts.clear();
        let total = targets.len();
        let mut report = PhaseReport::new(Stage::Generate, total);
        let mut artifacts = Vec::with_capacity(total);

        for (position, index) in targets.into_iter().enumerate() {
            let item = &mut state.items[index];
            let mut event = progress_event(Stage::Generate, item, position + 1, total);
            self.report_event(&mut report, event.clone());

            let (Some(data), Some(file_id)) = (item.extraction.as_ref(), item.file_id.as_deref())
            else {
                continue;
            };

            match self
                .backend
                .generate(data, file_id, self.generate_timeout)
                .await
            {
                Ok(pdf) => {
                    let filename =
                        artifact_filename(pdf.filename, || format!("mysouku_{}.pdf", position + 1));
                    artifacts.push(GeneratedArtifact {
                        index,
                        filename: unique_filename(&artifacts, &filename),
                        data: pdf.data,
                    });
                    item.error = None;
                    event.status = ProgressStatus::Succeeded;
                }
                Err(e) => {
                    warn!(
                        "[文件 {}/{}] ⚠️ {} 的生成出错: {}",
                        position + 1,
                        total,
                        item.file.name,
                        e
                    );
                    let message = e.user_message();
                    item.error = Some(message.clone());
                    event.status = ProgressStatus::Failed(message);
                }
            }
            self.report_event(&mut report, event);
        }

        info!("✓ マイソク生成完成: 成功 {}/{}", artifacts.len(), total);

        if artifacts.is_empty() {
            return Err(WorkflowError::AllFailed {
                stage: Stage::Generate,
                failures: report.failures,
            }
            .into());
        }

        state.artifacts = artifacts;
        state.phase = Phase::Generated;
        Ok(report)
    }

    /// 简易模式：每个文件单次请求直接转换
    pub async fn convert_all(
        &self,
        state: &mut WorkflowState,
        output_format: OutputFormat,
    ) -> AppResult<PhaseReport> {
        if state.items.is_empty() {
            return Err(WorkflowError::NoFilesSelected.into());
        }

        state.artifacts.clear();
        let total = state.items.len();
        let mut report = PhaseReport::new(Stage::Convert, total);
        let mut artifacts = Vec::with_capacity(total);

        for (position, item) in state.items.iter_mut().enumerate() {
            let mut event = progress_event(Stage::Convert, item, position + 1, total);
            self.report_event(&mut report, event.clone());

            match self
                .backend
                .convert(&item.file, output_format, self.extract_timeout)
                .await
            {
                Ok(pdf) => {
                    let filename = artifact_filename(pdf.filename, || {
                        format!("converted_{}.pdf", position + 1)
                    });
                    artifacts.push(GeneratedArtifact {
                        index: item.index,
                        filename: unique_filename(&artifacts, &filename),
                        data: pdf.data,
                    });
                    item.error = None;
                    event.status = ProgressStatus::Succeeded;
                }
                Err(e) => {
                    warn!(
                        "[文件 {}/{}] ⚠️ {} 的处理出错: {}",
                        position + 1,
                        total,
                        item.file.name,
                        e
                    );
                    let message = e.user_message();
                    item.error = Some(message.clone());
                    event.status = ProgressStatus::Failed(message);
                }
            }
            self.report_event(&mut report, event);
        }

        if artifacts.is_empty() {
            return Err(WorkflowError::AllFailed {
                stage: Stage::Convert,
                failures: report.failures,
            }
            .into());
        }

        info!("✓ 转换完成: {} 个PDF", artifacts.len());

        state.artifacts = artifacts;
        state.phase = Phase::Generated;
        Ok(report)
    }

    /// 清空状态
    pub fn reset(&self, state: &mut WorkflowState) {
        state.reset();
        info!("🔄 已重置");
    }

    /// 记录、输出并推送进度
    fn report_event(&self, report: &mut PhaseReport, event: ProgressEvent) {
        match &event.status {
            ProgressStatus::Started => info!("📤 {}", event),
            ProgressStatus::Succeeded => info!("✓ {}", event),
            ProgressStatus::Failed(_) => {}
        }
        if let Some(progress) = &self.progress {
            // 订阅者已关闭时忽略
            let _ = progress.send(event.clone());
        }
        report.record(event);
    }
}

fn progress_event(stage: Stage, item: &WorkItem, position: usize, total: usize) -> ProgressEvent {
    ProgressEvent {
        stage,
        index: item.index,
        position,
        total,
        label: item.file.name.clone(),
        status: ProgressStatus::Started,
    }
}

/// 只保留服务器文件名的最后一段，为空时使用默认名
fn artifact_filename(server_filename: Option<String>, fallback: impl FnOnce() -> String) -> String {
    server_filename
        .as_deref()
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .map(str::to_string)
        .unwrap_or_else(fallback)
}

/// 文件名重复时追加序号，例如 `mysouku_1.pdf` → `mysouku_1_2.pdf`
fn unique_filename(existing: &[GeneratedArtifact], filename: &str) -> String {
    let taken: HashSet<&str> = existing.iter().map(|a| a.filename.as_str()).collect();
    if !taken.contains(filename) {
        return filename.to_string();
    }

    let (stem, ext) = match filename.rfind('.') {
        Some(dot) if dot > 0 => (&filename[..dot], &filename[dot..]),
        _ => (filename, ""),
    };

    (2..)
        .map(|n| format!("{}_{}{}", stem, n, ext))
        .find(|candidate| !taken.contains(candidate.as_str()))
        .unwrap_or_else(|| filename.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(filename: &str) -> GeneratedArtifact {
        GeneratedArtifact {
            index: 0,
            filename: filename.to_string(),
            data: Vec::new(),
        }
    }

    #[test]
    fn test_unique_filename() {
        let existing = vec![artifact("mysouku_x.pdf"), artifact("mysouku_x_2.pdf")];
        assert_eq!(unique_filename(&existing, "other.pdf"), "other.pdf");
        assert_eq!(unique_filename(&existing, "mysouku_x.pdf"), "mysouku_x_3.pdf");

        let no_ext = vec![artifact("result")];
        assert_eq!(unique_filename(&no_ext, "result"), "result_2");
    }

    #[test]
    fn test_artifact_filename_keeps_last_segment() {
        let fallback = || "mysouku_1.pdf".to_string();
        assert_eq!(artifact_filename(Some("x/m.pdf".to_string()), fallback), "m.pdf");
        assert_eq!(artifact_filename(Some("..\\a\\m.pdf".to_string()), fallback), "m.pdf");
        assert_eq!(artifact_filename(Some("m.pdf".to_string()), fallback), "m.pdf");
        assert_eq!(artifact_filename(Some("out/".to_string()), fallback), "mysouku_1.pdf");
        assert_eq!(artifact_filename(Some("..".to_string()), fallback), "mysouku_1.pdf");
        assert_eq!(artifact_filename(None, fallback), "mysouku_1.pdf");
    }
}
