//! factmap - 从清单事实到节点定义的映射工具
//!
//! 核心设计原则：
//! - 映射是纯函数，不做任何 I/O
//! - 单个字段出错不影响其他字段
//! - 是否接受不完整的节点由调用方决定

pub mod core;
pub mod storage;

pub use crate::core::diagnostics::{AssignmentError, Diagnostic, DiagnosticKind};
pub use crate::core::mapper::{transform, Mapper, MappingOutcome};
pub use crate::core::models::{
    FieldRule, MapperConfig, MapperOptions, MappingSpecification, NodeDefinition, NodeField,
    SourceRecord,
};
pub use crate::core::resolver::{resolve, try_resolve, ResolveError};
