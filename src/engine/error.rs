// ==========================================
// 模型模板参数配置 - 引擎层错误类型
// ==========================================
// 职责: 覆写与校验失败的错误分类（越界 / 非法选项 / 只读 / 校验汇总）
// 要求: 所有错误都带参数路径和违反的约束，不做静默修正
// ==========================================

use crate::domain::{ConstraintBreach, ParameterType, ParameterValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("参数不存在: {path}")]
    UnknownParameter { path: String },

    #[error("参数只读，不允许修改: {path}")]
    ReadOnly { path: String },

    #[error("取值越界 (path={path}): {value} 超出范围 [{min}, {max}]")]
    OutOfRange {
        path: String,
        value: ParameterValue,
        min: ParameterValue,
        max: ParameterValue,
    },

    #[error("非法选项 (path={path}): {value}，可选值: {}", .options.join(", "))]
    InvalidOption {
        path: String,
        value: String,
        options: Vec<String>,
    },

    #[error("取值类型错误 (path={path}): 期望 {expected}，实际 {actual}")]
    TypeMismatch {
        path: String,
        expected: ParameterType,
        actual: String,
    },

    /// 全树校验失败（汇总全部违规）
    #[error("参数树校验失败: {}处违规", .violations.len())]
    Validation { violations: Vec<Violation> },
}

impl ConfigError {
    /// 将约束违反转换为带路径的错误
    pub fn from_breach(path: &str, breach: ConstraintBreach) -> Self {
        match breach {
            ConstraintBreach::OutOfRange { value, min, max } => ConfigError::OutOfRange {
                path: path.to_string(),
                value,
                min,
                max,
            },
            ConstraintBreach::InvalidOption { value, options } => ConfigError::InvalidOption {
                path: path.to_string(),
                value,
                options,
            },
            ConstraintBreach::TypeMismatch { expected, actual } => ConfigError::TypeMismatch {
                path: path.to_string(),
                expected,
                actual: actual.to_string(),
            },
        }
    }
}

/// Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;

// ==========================================
// 校验违规详情
// ==========================================

/// 违规类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    OutOfRange,
    InvalidOption,
    TypeMismatch,
    InvertedBounds,
    EmptyOptions,
    DuplicatePath,
    InvalidKey,
    ReservedKey,
    DanglingRuleReference,
}

/// 校验违规详情
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// 违规类型
    pub violation_type: ViolationKind,
    /// 参数或分组路径
    pub path: String,
    /// 违规字段（default_value / value / min_value / options / ui_rules / <key>）
    pub field: String,
    /// 违规原因
    pub reason: String,
    /// 额外信息（可选）
    pub details: Option<serde_json::Value>,
}

impl Violation {
    pub fn new(violation_type: ViolationKind, path: &str, field: &str, reason: String) -> Self {
        Self {
            violation_type,
            path: path.to_string(),
            field: field.to_string(),
            reason,
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// 由约束违反生成违规记录
    pub fn from_breach(path: &str, field: &str, breach: &ConstraintBreach) -> Self {
        match breach {
            ConstraintBreach::OutOfRange { value, min, max } => Violation::new(
                ViolationKind::OutOfRange,
                path,
                field,
                format!("{} 超出范围 [{}, {}]", value, min, max),
            )
            .with_details(serde_json::json!({
                "value": value,
                "min_value": min,
                "max_value": max,
            })),
            ConstraintBreach::InvalidOption { value, options } => Violation::new(
                ViolationKind::InvalidOption,
                path,
                field,
                format!("{} 不在可选值中", value),
            )
            .with_details(serde_json::json!({
                "value": value,
                "options": options,
            })),
            ConstraintBreach::TypeMismatch { expected, actual } => Violation::new(
                ViolationKind::TypeMismatch,
                path,
                field,
                format!("期望 {}，实际 {}", expected, actual),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message() {
        let err = ConfigError::from_breach(
            "dataset.train_batch_size",
            ConstraintBreach::OutOfRange {
                value: ParameterValue::Integer(600),
                min: ParameterValue::Integer(1),
                max: ParameterValue::Integer(512),
            },
        );
        assert_eq!(
            err.to_string(),
            "取值越界 (path=dataset.train_batch_size): 600 超出范围 [1, 512]"
        );
    }

    #[test]
    fn test_validation_message_counts_violations() {
        let v = Violation::new(ViolationKind::InvalidKey, "a.b", "<key>", "x".to_string());
        let err = ConfigError::Validation {
            violations: vec![v.clone(), v],
        };
        assert_eq!(err.to_string(), "参数树校验失败: 2处违规");
    }

    #[test]
    fn test_violation_serialization() {
        let v = Violation::from_breach(
            "pot_parameters.preset",
            "value",
            &ConstraintBreach::InvalidOption {
                value: "Accuracy".to_string(),
                options: vec!["Mixed".to_string(), "Performance".to_string()],
            },
        );
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["violation_type"], "INVALID_OPTION");
        assert_eq!(json["details"]["options"][1], "Performance");
    }
}
