//! 路径解析模块
//!
//! 按属性路径在源记录中导航，返回标量值的文本形式。
//!
//! 路径语法：
//! - `a.b.c`     逐级访问对象字段
//! - `a[0]`      访问数组元素
//! - `a(x.y)`    以完整键名访问对象字段（键中可以包含点号）
//!
//! 找不到字段与字段值为 null 对调用方而言不可区分，都返回 `None`。

use crate::core::models::{is_blank, value_text, SourceRecord};
use serde_json::Value;
use thiserror::Error;

/// 路径段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// 点号分隔的字段名
    Field(String),
    /// `[n]` 下标访问
    Index(usize),
    /// `(key)` 键访问
    Key(String),
}

/// 导航错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("路径语法错误（位置 {position}）: {message}")]
    Syntax { position: usize, message: &'static str },
    #[error("无法在{kind}上访问字段 '{name}'")]
    NotAnObject { name: String, kind: &'static str },
    #[error("无法在{kind}上按下标 {index} 访问")]
    NotAnArray { index: usize, kind: &'static str },
}

fn syntax(position: usize, message: &'static str) -> ResolveError {
    ResolveError::Syntax { position, message }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "布尔值",
        Value::Number(_) => "数字",
        Value::String(_) => "字符串",
        Value::Array(_) => "数组",
        Value::Object(_) => "对象",
    }
}

/// 解析路径为段列表
pub fn parse_path(path: &str) -> Result<Vec<Segment>, ResolveError> {
    let mut segments = Vec::new();
    let mut name = String::new();
    // 刚读过 `.`，下一个必须是字段名
    let mut after_dot = false;
    // 刚读过 `]` 或 `)`，只能接 `.`、`[`、`(`
    let mut after_accessor = false;
    let mut chars = path.char_indices();

    while let Some((pos, c)) = chars.next() {
        match c {
            '.' => {
                if name.is_empty() && !after_accessor {
                    return Err(syntax(pos, "空的路径段"));
                }
                if !name.is_empty() {
                    segments.push(Segment::Field(std::mem::take(&mut name)));
                }
                after_dot = true;
                after_accessor = false;
            }
            '[' | '(' => {
                if name.is_empty() && after_dot {
                    return Err(syntax(pos, "访问器前缺少字段名"));
                }
                if !name.is_empty() {
                    segments.push(Segment::Field(std::mem::take(&mut name)));
                }

                let close = if c == '[' { ']' } else { ')' };
                let mut inner = String::new();
                let mut closed = false;
                for (_, ic) in chars.by_ref() {
                    if ic == close {
                        closed = true;
                        break;
                    }
                    inner.push(ic);
                }
                if !closed {
                    return Err(syntax(pos, "访问器未闭合"));
                }

                if c == '[' {
                    let index = inner
                        .parse::<usize>()
                        .map_err(|_| syntax(pos, "下标必须是非负整数"))?;
                    segments.push(Segment::Index(index));
                } else {
                    segments.push(Segment::Key(inner));
                }
                after_dot = false;
                after_accessor = true;
            }
            ']' | ')' => return Err(syntax(pos, "多余的闭合符号")),
            _ => {
                if after_accessor {
                    return Err(syntax(pos, "访问器后必须接 '.'"));
                }
                name.push(c);
                after_dot = false;
            }
        }
    }

    if after_dot || (name.is_empty() && segments.is_empty()) {
        return Err(syntax(path.len(), "路径不能以 '.' 结尾"));
    }
    if !name.is_empty() {
        segments.push(Segment::Field(name));
    }

    Ok(segments)
}

/// 将叶子值转换为文本；null 视为不存在
fn coerce(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(value_text(other)),
    }
}

/// 解析路径，保留导航错误
///
/// 字段缺失、下标越界、中途遇到 null 都返回 `Ok(None)`；
/// 类型不匹配和语法错误返回 `Err`。
pub fn try_resolve(record: &SourceRecord, path: &str) -> Result<Option<String>, ResolveError> {
    if is_blank(path) {
        return Ok(None);
    }

    let segments = parse_path(path)?;
    let mut current = record.root();

    for segment in &segments {
        let next = match (segment, current) {
            (_, Value::Null) => None,
            (Segment::Field(name) | Segment::Key(name), Value::Object(map)) => map.get(name),
            (Segment::Index(index), Value::Array(items)) => items.get(*index),
            (Segment::Field(name) | Segment::Key(name), other) => {
                return Err(ResolveError::NotAnObject {
                    name: name.clone(),
                    kind: kind_of(other),
                })
            }
            (Segment::Index(index), other) => {
                return Err(ResolveError::NotAnArray {
                    index: *index,
                    kind: kind_of(other),
                })
            }
        };

        match next {
            Some(value) => current = value,
            None => return Ok(None),
        }
    }

    Ok(coerce(current))
}

/// 解析路径，任何导航错误都视为不存在
pub fn resolve(record: &SourceRecord, path: &str) -> Option<String> {
    match try_resolve(record, path) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("无法解析路径 '{}': {}", path, e);
            None
        }
    }
}
