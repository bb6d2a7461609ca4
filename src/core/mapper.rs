//! 映射引擎模块
//!
//! 按映射规格把源记录转换为节点定义。
//! 每条规则要么给出字面默认值，要么给出解析路径；
//! 单个字段出错只记录诊断并跳过，整个映射总会完成一遍。

use crate::core::diagnostics::{AssignmentError, Diagnostic};
use crate::core::models::{
    is_blank, is_reserved_field, FieldRule, MapperOptions, MappingSpecification, NodeDefinition,
    NodeField, SourceRecord,
};
use crate::core::resolver;

/// 一次映射的结果
#[derive(Debug, Clone, PartialEq)]
pub struct MappingOutcome {
    /// 节点定义；未通过校验时为 None
    pub node: Option<NodeDefinition>,
    /// 非致命问题，按规则顺序排列
    pub diagnostics: Vec<Diagnostic>,
}

impl MappingOutcome {
    /// 是否被拒绝
    pub fn is_rejected(&self) -> bool {
        self.node.is_none()
    }

    /// 取出节点定义，丢弃诊断
    pub fn into_node(self) -> Option<NodeDefinition> {
        self.node
    }
}

/// 映射引擎
///
/// 只持有不可变选项，可在多个线程间共享。
#[derive(Debug, Clone, Default)]
pub struct Mapper {
    options: MapperOptions,
}

impl Mapper {
    /// 创建映射引擎
    pub fn new(options: MapperOptions) -> Self {
        Self { options }
    }

    /// 当前引擎选项
    pub fn options(&self) -> &MapperOptions {
        &self.options
    }

    /// 转换单条记录，只返回节点定义
    pub fn transform(
        &self,
        record: &SourceRecord,
        spec: &MappingSpecification,
    ) -> Option<NodeDefinition> {
        self.map_record(record, spec).node
    }

    /// 转换单条记录，同时返回诊断
    pub fn map_record(&self, record: &SourceRecord, spec: &MappingSpecification) -> MappingOutcome {
        // 1. 新建节点，tags 与 attributes 已初始化为空
        let mut node = NodeDefinition::new();
        let mut diagnostics = Vec::new();

        // 2. 按规格逐个字段映射
        for (name, rule) in spec.iter() {
            // 集合字段由外部流程处理
            if is_reserved_field(name) {
                continue;
            }
            self.apply_rule(record, name, rule, &mut node, &mut diagnostics);
        }

        if self.options.nodename_fallback {
            apply_nodename_fallback(&mut node, record);
        }

        // 3. 校验
        let node = validate_state(Some(node), &mut diagnostics);

        MappingOutcome { node, diagnostics }
    }

    /// 批量转换，结果与输入顺序一致
    pub fn map_all(
        &self,
        records: &[SourceRecord],
        spec: &MappingSpecification,
    ) -> Vec<MappingOutcome> {
        records.iter().map(|r| self.map_record(r, spec)).collect()
    }

    fn apply_rule(
        &self,
        record: &SourceRecord,
        name: &str,
        rule: &FieldRule,
        node: &mut NodeDefinition,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        if rule.is_conflicting() {
            let diagnostic = Diagnostic::ConfigurationConflict {
                field: name.to_string(),
            };
            tracing::warn!(field = %name, "{}", diagnostic);
            diagnostics.push(diagnostic);
            return;
        }

        if let Some(value) = rule.default_text() {
            if !is_blank(&value) {
                self.assign(node, name, &value, diagnostics);
            }
            return;
        }

        if let Some(path) = rule.path_text() {
            match resolver::try_resolve(record, &path) {
                Ok(Some(value)) if !is_blank(&value) => {
                    self.assign(node, name, &value, diagnostics);
                }
                Ok(_) => {
                    tracing::debug!(field = %name, path = %path, "路径没有可用的值");
                }
                Err(reason) => {
                    let diagnostic = Diagnostic::ResolutionFailure {
                        field: name.to_string(),
                        path,
                        reason,
                    };
                    tracing::warn!(field = %name, "{}", diagnostic);
                    diagnostics.push(diagnostic);
                }
            }
        }
    }

    fn assign(
        &self,
        node: &mut NodeDefinition,
        name: &str,
        value: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        if let Err(reason) = set_node_property(node, name, value, self.options.strict_fields) {
            let diagnostic = Diagnostic::AssignmentFailure {
                field: name.to_string(),
                value: value.to_string(),
                reason,
            };
            tracing::warn!(field = %name, "{}", diagnostic);
            diagnostics.push(diagnostic);
        }
    }
}

/// 节点校验：唯一的要求是节点存在
fn validate_state(
    node: Option<NodeDefinition>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<NodeDefinition> {
    if node.is_none() {
        tracing::warn!("{}", Diagnostic::ValidationFailure);
        diagnostics.push(Diagnostic::ValidationFailure);
    }
    node
}

/// 使用默认选项转换单条记录
pub fn transform(record: &SourceRecord, spec: &MappingSpecification) -> Option<NodeDefinition> {
    Mapper::default().transform(record, spec)
}

/// 合法属性名：非空，且不含空白与路径符号
fn is_property_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '.' | '[' | ']' | '(' | ')'))
}

/// 按名称设置节点属性
///
/// 名称或值为空白时什么也不做。
pub fn set_node_property(
    node: &mut NodeDefinition,
    name: &str,
    value: &str,
    strict: bool,
) -> Result<(), AssignmentError> {
    if is_blank(name) || is_blank(value) {
        return Ok(());
    }

    if let Some(field) = NodeField::from_name(name) {
        node.set(field, value);
        return Ok(());
    }

    if is_reserved_field(name) {
        return Err(AssignmentError::Reserved);
    }
    if !is_property_name(name) {
        return Err(AssignmentError::InvalidName);
    }
    if strict {
        return Err(AssignmentError::UnknownField);
    }

    node.properties.insert(name.to_string(), value.to_string());
    Ok(())
}

/// nodename 未设置时回退到 hostname，再回退到 certname
fn apply_nodename_fallback(node: &mut NodeDefinition, record: &SourceRecord) {
    if node.nodename.is_some() {
        return;
    }

    let fallback = node
        .hostname
        .clone()
        .or_else(|| record.certname().filter(|c| !is_blank(c)).map(str::to_string));

    if let Some(name) = fallback {
        tracing::debug!("nodename 回退为: {}", name);
        node.nodename = Some(name);
    }
}
