// ==========================================
// 模型模板参数配置 - 领域类型定义
// ==========================================
// 职责: 参数树中出现的全部枚举标记
// 序列化格式: SCREAMING_SNAKE_CASE (与模板文档一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 枚举字符串解析失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("未知的 {kind} 取值: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// ==========================================
// 参数类型 (Parameter Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParameterType {
    Integer,    // 整数，带上下界
    Float,      // 浮点，带上下界
    Boolean,    // 布尔
    Selectable, // 枚举选项
    String,     // 自由文本
}

impl ParameterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterType::Integer => "INTEGER",
            ParameterType::Float => "FLOAT",
            ParameterType::Boolean => "BOOLEAN",
            ParameterType::Selectable => "SELECTABLE",
            ParameterType::String => "STRING",
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ParameterType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INTEGER" => Ok(ParameterType::Integer),
            "FLOAT" => Ok(ParameterType::Float),
            "BOOLEAN" => Ok(ParameterType::Boolean),
            "SELECTABLE" => Ok(ParameterType::Selectable),
            "STRING" => Ok(ParameterType::String),
            other => Err(ParseEnumError::new("ParameterType", other)),
        }
    }
}

// ==========================================
// 节点类型 (Node Type)
// ==========================================
// 根节点固定为 CONFIGURABLE_PARAMETERS，其余分组为 PARAMETER_GROUP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    ConfigurableParameters,
    ParameterGroup,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::ConfigurableParameters => "CONFIGURABLE_PARAMETERS",
            NodeType::ParameterGroup => "PARAMETER_GROUP",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONFIGURABLE_PARAMETERS" => Ok(NodeType::ConfigurableParameters),
            "PARAMETER_GROUP" => Ok(NodeType::ParameterGroup),
            other => Err(ParseEnumError::new("NodeType", other)),
        }
    }
}

// ==========================================
// 影响阶段 (affects_outcome_of)
// ==========================================
// 修改该参数会影响哪个模型生命周期阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelLifecycle {
    #[default]
    None,
    Architecture,
    Training,
    Inference,
    Testing,
}

impl ModelLifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelLifecycle::None => "NONE",
            ModelLifecycle::Architecture => "ARCHITECTURE",
            ModelLifecycle::Training => "TRAINING",
            ModelLifecycle::Inference => "INFERENCE",
            ModelLifecycle::Testing => "TESTING",
        }
    }
}

impl fmt::Display for ModelLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ModelLifecycle {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(ModelLifecycle::None),
            "ARCHITECTURE" => Ok(ModelLifecycle::Architecture),
            "TRAINING" => Ok(ModelLifecycle::Training),
            "INFERENCE" => Ok(ModelLifecycle::Inference),
            "TESTING" => Ok(ModelLifecycle::Testing),
            other => Err(ParseEnumError::new("ModelLifecycle", other)),
        }
    }
}

// ==========================================
// 自动调参状态 (auto_hpo_state)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AutoHpoState {
    #[default]
    NotPossible,
    Possible,
    Optimized,
    Overridden,
}

impl AutoHpoState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AutoHpoState::NotPossible => "NOT_POSSIBLE",
            AutoHpoState::Possible => "POSSIBLE",
            AutoHpoState::Optimized => "OPTIMIZED",
            AutoHpoState::Overridden => "OVERRIDDEN",
        }
    }
}

impl fmt::Display for AutoHpoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AutoHpoState {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOT_POSSIBLE" => Ok(AutoHpoState::NotPossible),
            "POSSIBLE" => Ok(AutoHpoState::Possible),
            "OPTIMIZED" => Ok(AutoHpoState::Optimized),
            "OVERRIDDEN" => Ok(AutoHpoState::Overridden),
            other => Err(ParseEnumError::new("AutoHpoState", other)),
        }
    }
}

// ==========================================
// UI 规则动作 (UI Action)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UiAction {
    #[default]
    DisableEditing,
    EnableEditing,
    Hide,
    Show,
}

impl UiAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            UiAction::DisableEditing => "DISABLE_EDITING",
            UiAction::EnableEditing => "ENABLE_EDITING",
            UiAction::Hide => "HIDE",
            UiAction::Show => "SHOW",
        }
    }
}

impl fmt::Display for UiAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UiAction {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DISABLE_EDITING" => Ok(UiAction::DisableEditing),
            "ENABLE_EDITING" => Ok(UiAction::EnableEditing),
            "HIDE" => Ok(UiAction::Hide),
            "SHOW" => Ok(UiAction::Show),
            other => Err(ParseEnumError::new("UiAction", other)),
        }
    }
}

// ==========================================
// UI 规则组合运算符 (AND / OR)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

impl LogicalOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LogicalOperator {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AND" => Ok(LogicalOperator::And),
            "OR" => Ok(LogicalOperator::Or),
            other => Err(ParseEnumError::new("LogicalOperator", other)),
        }
    }
}

// ==========================================
// UI 规则比较运算符
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Comparison {
    EqualTo,
    NotEqualTo,
    LessThan,
    GreaterThan,
}

impl Comparison {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::EqualTo => "EQUAL_TO",
            Comparison::NotEqualTo => "NOT_EQUAL_TO",
            Comparison::LessThan => "LESS_THAN",
            Comparison::GreaterThan => "GREATER_THAN",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Comparison {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EQUAL_TO" => Ok(Comparison::EqualTo),
            "NOT_EQUAL_TO" => Ok(Comparison::NotEqualTo),
            "LESS_THAN" => Ok(Comparison::LessThan),
            "GREATER_THAN" => Ok(Comparison::GreaterThan),
            other => Err(ParseEnumError::new("Comparison", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_type_roundtrip_str() {
        for t in [
            ParameterType::Integer,
            ParameterType::Float,
            ParameterType::Boolean,
            ParameterType::Selectable,
            ParameterType::String,
        ] {
            assert_eq!(t.as_str().parse::<ParameterType>().unwrap(), t);
        }
    }

    #[test]
    fn test_unknown_enum_value() {
        let err = "DECIMAL".parse::<ParameterType>().unwrap_err();
        assert_eq!(err.kind, "ParameterType");
        assert_eq!(err.value, "DECIMAL");
    }

    #[test]
    fn test_defaults() {
        assert_eq!(ModelLifecycle::default(), ModelLifecycle::None);
        assert_eq!(UiAction::default(), UiAction::DisableEditing);
        assert_eq!(LogicalOperator::default(), LogicalOperator::And);
        assert_eq!(AutoHpoState::default(), AutoHpoState::NotPossible);
    }

    #[test]
    fn test_serde_screaming_snake_case() {
        let json = serde_json::to_string(&ModelLifecycle::Training).unwrap();
        assert_eq!(json, "\"TRAINING\"");
        let op: Comparison = serde_json::from_str("\"NOT_EQUAL_TO\"").unwrap();
        assert_eq!(op, Comparison::NotEqualTo);
    }
}
