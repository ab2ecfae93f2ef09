// ==========================================
// 模型模板参数配置 - 参数取值
// ==========================================
// 职责: 叶子参数的取值（默认值 / 当前值 / 规则比较值）
// ==========================================

use crate::domain::types::ParameterType;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// 参数取值
///
/// 序列化为无标签形式，导出给外部训练进程时即为原始 JSON 标量。
/// SELECTABLE 参数的取值保存为选项的显示值（Text）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ParameterValue {
    /// 取值本身的类型名称（用于错误信息）
    pub fn kind_name(&self) -> &'static str {
        match self {
            ParameterValue::Boolean(_) => "BOOLEAN",
            ParameterValue::Integer(_) => "INTEGER",
            ParameterValue::Float(_) => "FLOAT",
            ParameterValue::Text(_) => "STRING",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParameterValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// 数值视图（整数按 f64 参与比较）
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParameterValue::Integer(v) => Some(*v as f64),
            ParameterValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParameterValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// 取值是否可直接用于给定参数类型（不做任何转换）
    pub fn matches_type(&self, kind: ParameterType) -> bool {
        matches!(
            (self, kind),
            (ParameterValue::Integer(_), ParameterType::Integer)
                | (ParameterValue::Float(_), ParameterType::Float)
                | (ParameterValue::Boolean(_), ParameterType::Boolean)
                | (ParameterValue::Text(_), ParameterType::Selectable)
                | (ParameterValue::Text(_), ParameterType::String)
        )
    }

    /// 将取值转换为给定参数类型
    ///
    /// 仅允许无损拓宽：INTEGER → FLOAT。其余类型不一致返回 None。
    pub fn coerce_to(&self, kind: ParameterType) -> Option<ParameterValue> {
        if self.matches_type(kind) {
            return Some(self.clone());
        }
        match (self, kind) {
            (ParameterValue::Integer(v), ParameterType::Float) => {
                Some(ParameterValue::Float(*v as f64))
            }
            _ => None,
        }
    }

    /// 从界面/命令行文本解析为指定类型的取值
    ///
    /// # 返回
    /// - Some(value): 解析成功
    /// - None: 文本不是该类型的合法表示（浮点拒绝 NaN / inf）
    pub fn parse_as(kind: ParameterType, raw: &str) -> Option<ParameterValue> {
        let trimmed = raw.trim();
        match kind {
            ParameterType::Integer => trimmed.parse::<i64>().ok().map(ParameterValue::Integer),
            ParameterType::Float => trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(ParameterValue::Float),
            ParameterType::Boolean => parse_bool(trimmed).map(ParameterValue::Boolean),
            ParameterType::Selectable | ParameterType::String => {
                Some(ParameterValue::Text(raw.to_string()))
            }
        }
    }

    /// 规则比较用的偏序
    ///
    /// 数值之间按数值比较，文本按字典序，布尔按 false < true；类型不同返回 None。
    pub fn compare(&self, other: &ParameterValue) -> Option<Ordering> {
        match (self, other) {
            (ParameterValue::Boolean(a), ParameterValue::Boolean(b)) => Some(a.cmp(b)),
            (ParameterValue::Text(a), ParameterValue::Text(b)) => Some(a.cmp(b)),
            _ => {
                let a = self.as_f64()?;
                let b = other.as_f64()?;
                a.partial_cmp(&b)
            }
        }
    }

    /// 规则比较用的相等（INTEGER 与 FLOAT 之间按数值相等）
    pub fn loosely_equals(&self, other: &ParameterValue) -> bool {
        matches!(self.compare(other), Some(Ordering::Equal))
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Boolean(v) => write!(f, "{}", v),
            ParameterValue::Integer(v) => write!(f, "{}", v),
            ParameterValue::Float(v) => write!(f, "{}", v),
            ParameterValue::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for ParameterValue {
    fn from(v: bool) -> Self {
        ParameterValue::Boolean(v)
    }
}

impl From<i64> for ParameterValue {
    fn from(v: i64) -> Self {
        ParameterValue::Integer(v)
    }
}

impl From<f64> for ParameterValue {
    fn from(v: f64) -> Self {
        ParameterValue::Float(v)
    }
}

impl From<&str> for ParameterValue {
    fn from(v: &str) -> Self {
        ParameterValue::Text(v.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(v: String) -> Self {
        ParameterValue::Text(v)
    }
}
