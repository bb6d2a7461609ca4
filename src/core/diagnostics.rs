//! 映射诊断
//!
//! 单个字段的问题都不会中断映射，只会记录为诊断并跳过该字段。

use crate::core::resolver::ResolveError;
use thiserror::Error;

/// 字段赋值失败的原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignmentError {
    /// 字段名不是合法的属性名（包含空白或路径符号）
    #[error("字段名不是合法的属性名")]
    InvalidName,
    /// 保留字段不能通过通用流程赋值
    #[error("保留字段不能直接赋值")]
    Reserved,
    /// 严格模式下的未知字段
    #[error("节点定义中没有此字段")]
    UnknownField,
}

/// 诊断类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    ConfigurationConflict,
    ResolutionFailure,
    AssignmentFailure,
    ValidationFailure,
}

/// 映射过程中产生的非致命问题
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    /// 同时声明了 default 和 path
    #[error("属性 '{field}' 配置错误：不能同时声明 default 和 path")]
    ConfigurationConflict { field: String },
    /// 路径导航失败
    #[error("属性 '{field}' 无法解析路径 '{path}': {reason}")]
    ResolutionFailure {
        field: String,
        path: String,
        reason: ResolveError,
    },
    /// 无法设置节点属性
    #[error("无法设置节点属性 '{field}'，值: '{value}': {reason}")]
    AssignmentFailure {
        field: String,
        value: String,
        reason: AssignmentError,
    },
    /// 节点定义未通过校验
    #[error("节点定义未通过校验")]
    ValidationFailure,
}

impl Diagnostic {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Diagnostic::ConfigurationConflict { .. } => DiagnosticKind::ConfigurationConflict,
            Diagnostic::ResolutionFailure { .. } => DiagnosticKind::ResolutionFailure,
            Diagnostic::AssignmentFailure { .. } => DiagnosticKind::AssignmentFailure,
            Diagnostic::ValidationFailure => DiagnosticKind::ValidationFailure,
        }
    }

    /// 出问题的字段名
    pub fn field(&self) -> Option<&str> {
        match self {
            Diagnostic::ConfigurationConflict { field }
            | Diagnostic::ResolutionFailure { field, .. }
            | Diagnostic::AssignmentFailure { field, .. } => Some(field),
            Diagnostic::ValidationFailure => None,
        }
    }
}
