//! 核心数据模型定义
//!
//! 源记录、映射规则、节点定义以及引擎配置都在这里定义。

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// 由通用映射流程跳过的保留字段（由外部流程负责填充）
pub const RESERVED_FIELDS: [&str; 2] = ["tags", "attributes"];

/// 判断字段名是否为保留的集合字段
pub fn is_reserved_field(name: &str) -> bool {
    RESERVED_FIELDS.contains(&name)
}

/// 空白判断：空字符串或仅包含空白字符
///
/// 不换行空格（U+00A0、U+2007、U+202F）不算空白。
pub fn is_blank(text: &str) -> bool {
    text.chars()
        .all(|c| c.is_whitespace() && !matches!(c, '\u{00A0}' | '\u{2007}' | '\u{202F}'))
}

/// 值的文本形式
///
/// 字符串原样返回，null 为空串，其他标量使用其文本表示，
/// 数组和对象使用紧凑 JSON。
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 源记录 - 一个节点的原始事实数据
///
/// 任意嵌套的只读结构，映射过程中不会被修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceRecord {
    root: Value,
}

impl SourceRecord {
    /// 从任意值创建源记录
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// 从JSON文本解析
    pub fn from_json(json_str: &str) -> serde_json::Result<Self> {
        Ok(Self::new(serde_json::from_str(json_str)?))
    }

    /// 由节点标识和事实集合组装，形如 `{"certname": ..., "facts": ...}`
    pub fn with_facts(certname: impl Into<String>, facts: Value) -> Self {
        let mut root = serde_json::Map::new();
        root.insert("certname".to_string(), Value::String(certname.into()));
        root.insert("facts".to_string(), facts);
        Self::new(Value::Object(root))
    }

    /// 根节点
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// 节点标识（如果有）
    pub fn certname(&self) -> Option<&str> {
        self.root.get("certname").and_then(Value::as_str)
    }
}

impl Default for SourceRecord {
    fn default() -> Self {
        Self::new(Value::Object(serde_json::Map::new()))
    }
}

impl From<Value> for SourceRecord {
    fn from(root: Value) -> Self {
        Self::new(root)
    }
}

/// 字段规则
///
/// 至多声明 default 与 path 其中之一；两者同时声明属于配置错误，
/// 在映射时才会被发现。只能从对象反序列化。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "serde_json::Map<String, Value>")]
pub struct FieldRule {
    /// 字面默认值
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// 解析路径
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Value>,
}

/// 只要键出现（即使值为 null）就视为已声明
impl From<serde_json::Map<String, Value>> for FieldRule {
    fn from(mut map: serde_json::Map<String, Value>) -> Self {
        Self {
            default: map.remove("default"),
            path: map.remove("path"),
        }
    }
}

impl FieldRule {
    /// 只有默认值的规则
    pub fn with_default(value: impl Into<Value>) -> Self {
        Self {
            default: Some(value.into()),
            path: None,
        }
    }

    /// 只有路径的规则
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            default: None,
            path: Some(Value::String(path.into())),
        }
    }

    /// 同时声明了 default 和 path
    pub fn is_conflicting(&self) -> bool {
        self.default.is_some() && self.path.is_some()
    }

    /// 默认值的文本形式
    pub fn default_text(&self) -> Option<String> {
        self.default.as_ref().map(value_text)
    }

    /// 路径的文本形式
    pub fn path_text(&self) -> Option<String> {
        self.path.as_ref().map(value_text)
    }
}

/// 映射规格 - 字段名到规则的有序表
///
/// 保留声明顺序，保证诊断信息输出顺序稳定。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MappingSpecification {
    rules: Vec<(String, FieldRule)>,
}

impl MappingSpecification {
    /// 创建空规格
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加规则；同名字段原位替换
    pub fn insert(&mut self, name: impl Into<String>, rule: FieldRule) {
        let name = name.into();
        if let Some(slot) = self.rules.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = rule;
        } else {
            self.rules.push((name, rule));
        }
    }

    /// 链式添加规则
    pub fn with(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.insert(name, rule);
        self
    }

    /// 按字段名查找规则
    pub fn get(&self, name: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    /// 按声明顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldRule)> {
        self.rules.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, FieldRule)> for MappingSpecification {
    fn from_iter<I: IntoIterator<Item = (N, FieldRule)>>(iter: I) -> Self {
        let mut spec = Self::new();
        for (name, rule) in iter {
            spec.insert(name, rule);
        }
        spec
    }
}

impl Serialize for MappingSpecification {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.rules.len()))?;
        for (name, rule) in &self.rules {
            map.serialize_entry(name, rule)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for MappingSpecification {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SpecVisitor;

        impl<'de> Visitor<'de> for SpecVisitor {
            type Value = MappingSpecification;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of field names to field rules")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut spec = MappingSpecification::new();
                while let Some(name) = access.next_key::<String>()? {
                    // 保留字段的内容由外部流程解释，非对象形式按空规则处理
                    let rule = if is_reserved_field(&name) {
                        match access.next_value::<Value>()? {
                            Value::Object(map) => FieldRule::from(map),
                            _ => FieldRule::default(),
                        }
                    } else {
                        access.next_value::<FieldRule>().map_err(|e| {
                            <A::Error as de::Error>::custom(format!("field '{}': {}", name, e))
                        })?
                    };
                    spec.insert(name, rule);
                }
                Ok(spec)
            }
        }

        deserializer.deserialize_map(SpecVisitor)
    }
}

/// 节点定义中可设置的标量字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeField {
    Hostname,
    Username,
    Nodename,
    Description,
    OsFamily,
    OsArch,
    OsName,
    OsVersion,
    EditUrl,
    RemoteUrl,
}

impl NodeField {
    /// 全部已知字段
    pub const ALL: [NodeField; 10] = [
        NodeField::Hostname,
        NodeField::Username,
        NodeField::Nodename,
        NodeField::Description,
        NodeField::OsFamily,
        NodeField::OsArch,
        NodeField::OsName,
        NodeField::OsVersion,
        NodeField::EditUrl,
        NodeField::RemoteUrl,
    ];

    /// 配置中使用的规范名称
    pub fn name(&self) -> &'static str {
        match self {
            NodeField::Hostname => "hostname",
            NodeField::Username => "username",
            NodeField::Nodename => "nodename",
            NodeField::Description => "description",
            NodeField::OsFamily => "osFamily",
            NodeField::OsArch => "osArch",
            NodeField::OsName => "osName",
            NodeField::OsVersion => "osVersion",
            NodeField::EditUrl => "editUrl",
            NodeField::RemoteUrl => "remoteUrl",
        }
    }

    /// 按名称查找，同时接受 camelCase 和 snake_case
    pub fn from_name(name: &str) -> Option<Self> {
        let field = match name {
            "hostname" => NodeField::Hostname,
            "username" => NodeField::Username,
            "nodename" => NodeField::Nodename,
            "description" => NodeField::Description,
            "osFamily" | "os_family" => NodeField::OsFamily,
            "osArch" | "os_arch" => NodeField::OsArch,
            "osName" | "os_name" => NodeField::OsName,
            "osVersion" | "os_version" => NodeField::OsVersion,
            "editUrl" | "edit_url" => NodeField::EditUrl,
            "remoteUrl" | "remote_url" => NodeField::RemoteUrl,
            _ => return None,
        };
        Some(field)
    }
}

impl fmt::Display for NodeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 节点定义 - 映射的输出
///
/// tags 与 attributes 始终存在（可能为空），其余字段仅在规则产生非空值时设置。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_arch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    /// 标签集合
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// 属性表
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// 已知字段表之外的自定义属性
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl NodeDefinition {
    /// 创建空节点，tags 与 attributes 初始化为空
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, field: NodeField) -> &Option<String> {
        match field {
            NodeField::Hostname => &self.hostname,
            NodeField::Username => &self.username,
            NodeField::Nodename => &self.nodename,
            NodeField::Description => &self.description,
            NodeField::OsFamily => &self.os_family,
            NodeField::OsArch => &self.os_arch,
            NodeField::OsName => &self.os_name,
            NodeField::OsVersion => &self.os_version,
            NodeField::EditUrl => &self.edit_url,
            NodeField::RemoteUrl => &self.remote_url,
        }
    }

    fn slot_mut(&mut self, field: NodeField) -> &mut Option<String> {
        match field {
            NodeField::Hostname => &mut self.hostname,
            NodeField::Username => &mut self.username,
            NodeField::Nodename => &mut self.nodename,
            NodeField::Description => &mut self.description,
            NodeField::OsFamily => &mut self.os_family,
            NodeField::OsArch => &mut self.os_arch,
            NodeField::OsName => &mut self.os_name,
            NodeField::OsVersion => &mut self.os_version,
            NodeField::EditUrl => &mut self.edit_url,
            NodeField::RemoteUrl => &mut self.remote_url,
        }
    }

    /// 读取已知字段
    pub fn get(&self, field: NodeField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    /// 设置已知字段
    pub fn set(&mut self, field: NodeField, value: impl Into<String>) {
        *self.slot_mut(field) = Some(value.into());
    }

    /// 按名称读取属性：先查已知字段，再查自定义属性
    pub fn property(&self, name: &str) -> Option<&str> {
        match NodeField::from_name(name) {
            Some(field) => self.get(field),
            None => self.properties.get(name).map(String::as_str),
        }
    }

    /// 是否设置了任何标量字段
    pub fn has_scalar_fields(&self) -> bool {
        NodeField::ALL.iter().any(|f| self.get(*f).is_some()) || !self.properties.is_empty()
    }

    /// 缺失的必需属性（hostname, username, nodename, tags）
    ///
    /// 映射引擎本身不强制这些属性，调用方可据此实施自己的校验策略。
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let mut missing: Vec<&'static str> = [NodeField::Hostname, NodeField::Username, NodeField::Nodename]
            .iter()
            .filter(|f| self.get(**f).is_none())
            .map(|f| f.name())
            .collect();
        if self.tags.is_empty() {
            missing.push("tags");
        }
        missing
    }

}

/// 映射引擎选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperOptions {
    /// 严格字段模式：未知字段名视为赋值失败，而不是写入自定义属性
    pub strict_fields: bool,
    /// nodename 未设置时依次回退到 hostname 和 certname
    pub nodename_fallback: bool,
}

/// 应用配置
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// 映射规格
    pub mappings: MappingSpecification,
    /// 引擎选项
    pub options: MapperOptions,
}
