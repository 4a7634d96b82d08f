//! 进度事件与阶段报告

use std::fmt::Display;

/// 处理阶段（每个阶段逐个文件发送请求）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// 上传并解析
    Extract,
    /// 生成 マイソク
    Generate,
    /// 简易模式：单次请求转换
    Convert,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Extract => "解析",
            Stage::Generate => "生成",
            Stage::Convert => "转换",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 单个文件的处理状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressStatus {
    Started,
    Succeeded,
    Failed(String),
}

/// 进度事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub stage: Stage,
    /// 工作项索引（选择顺序）
    pub index: usize,
    /// 本阶段中的序号（从1开始）
    pub position: usize,
    /// 本阶段要处理的文件数
    pub total: usize,
    /// 文件名
    pub label: String,
    pub status: ProgressStatus,
}

impl Display for ProgressEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.status {
            ProgressStatus::Started => "处理中...".to_string(),
            ProgressStatus::Succeeded => "完成".to_string(),
            ProgressStatus::Failed(message) => format!("失败: {}", message),
        };
        write!(
            f,
            "{}/{}: {} {}{}",
            self.position, self.total, self.label, self.stage, state
        )
    }
}

/// 单个文件的失败记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub stage: Stage,
    pub index: usize,
    pub name: String,
    pub message: String,
}

/// 一个阶段的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseReport {
    pub stage: Stage,
    /// 本阶段处理的文件数
    pub total: usize,
    /// 成功的工作项索引（保持选择顺序）
    pub succeeded: Vec<usize>,
    pub failures: Vec<ItemFailure>,
    events: Vec<ProgressEvent>,
}

impl PhaseReport {
    pub(crate) fn new(stage: Stage, total: usize) -> Self {
        Self {
            stage,
            total,
            succeeded: Vec::new(),
            failures: Vec::new(),
            events: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, event: ProgressEvent) {
        match &event.status {
            ProgressStatus::Started => {}
            ProgressStatus::Succeeded => self.succeeded.push(event.index),
            ProgressStatus::Failed(message) => self.failures.push(ItemFailure {
                stage: event.stage,
                index: event.index,
                name: event.label.clone(),
                message: message.clone(),
            }),
        }
        self.events.push(event);
    }

    /// 进度事件序列，可以重复遍历
    pub fn progress(&self) -> std::slice::Iter<'_, ProgressEvent> {
        self.events.iter()
    }

    pub fn success_count(&self) -> usize {
        self.succeeded.len()
    }

    /// 部分成功、部分失败
    pub fn is_partial(&self) -> bool {
        !self.succeeded.is_empty() && !self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(index: usize, status: ProgressStatus) -> ProgressEvent {
        ProgressEvent {
            stage: Stage::Extract,
            index,
            position: index + 1,
            total: 2,
            label: format!("{}.pdf", index),
            status,
        }
    }

    #[test]
    fn test_report_records_success_and_failure() {
        let mut report = PhaseReport::new(Stage::Extract, 2);
        report.record(event(0, ProgressStatus::Started));
        report.record(event(0, ProgressStatus::Succeeded));
        report.record(event(1, ProgressStatus::Started));
        report.record(event(1, ProgressStatus::Failed("处理超时".to_string())));

        assert_eq!(report.succeeded, vec![0]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "1.pdf");
        assert!(report.is_partial());

        // 可以重复遍历
        assert_eq!(report.progress().count(), 4);
        assert_eq!(report.progress().count(), 4);
    }

    #[test]
    fn test_event_display() {
        let text = event(1, ProgressStatus::Started).to_string();
        assert_eq!(text, "2/2: 1.pdf 解析处理中...");
    }
}
