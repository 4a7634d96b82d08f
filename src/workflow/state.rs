//! 批处理状态
//!
//! 整批文件的全部状态都放在一个 `WorkflowState` 里，由调用方持有，
//! 每个阶段以 `&mut WorkflowState` 显式传入

use crate::error::WorkflowError;
use crate::models::{FieldEdit, GeneratedArtifact, ItemSelector, PropertyField, WorkItem};

/// 流程阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// 初始状态
    #[default]
    Idle,
    /// 已选择文件
    Selected,
    /// 至少一个文件解析成功
    Extracted,
    /// 至少一个 PDF 生成成功
    Generated,
}

/// 批处理状态
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkflowState {
    pub(crate) phase: Phase,
    pub(crate) items: Vec<WorkItem>,
    pub(crate) artifacts: Vec<GeneratedArtifact>,
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&WorkItem> {
        self.items.get(index)
    }

    /// 解析成功的工作项（保持选择顺序）
    pub fn extracted_items(&self) -> impl Iterator<Item = &WorkItem> + '_ {
        self.items.iter().filter(|item| item.is_extracted())
    }

    pub fn artifacts(&self) -> &[GeneratedArtifact] {
        &self.artifacts
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 修改某个文件的解析结果
    pub fn edit_field(
        &mut self,
        index: usize,
        field: PropertyField,
        value: &str,
    ) -> Result<(), WorkflowError> {
        let len = self.items.len();
        let item = self
            .items
            .get_mut(index)
            .ok_or(WorkflowError::IndexOutOfRange { index, len })?;
        let data = item
            .extraction
            .as_mut()
            .ok_or(WorkflowError::NotExtracted { index })?;

        data.set(field, value);
        Ok(())
    }

    /// 按字段名修改
    pub fn edit_field_by_key(
        &mut self,
        index: usize,
        key: &str,
        value: &str,
    ) -> Result<(), WorkflowError> {
        let field: PropertyField = key.parse()?;
        self.edit_field(index, field, value)
    }

    /// 应用一条来自修改文件的字段修改
    pub fn apply_edit(&mut self, edit: &FieldEdit) -> Result<(), WorkflowError> {
        let index = self.resolve(&edit.target)?;
        self.edit_field(index, edit.field, &edit.value)
    }

    fn resolve(&self, target: &ItemSelector) -> Result<usize, WorkflowError> {
        match target {
            ItemSelector::Index(index) => Ok(*index),
            ItemSelector::FileName(name) => self
                .items
                .iter()
                .position(|item| &item.file.name == name)
                .ok_or_else(|| WorkflowError::FileNotSelected { name: name.clone() }),
        }
    }

    /// 清空全部状态
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
