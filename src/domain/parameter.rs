// ==========================================
// 模型模板参数配置 - 叶子参数
// ==========================================
// 职责: 单个可配置项（类型、约束、默认值、当前值、UI 元数据）
// 约束:
// - INTEGER/FLOAT: min_value <= 取值 <= max_value
// - SELECTABLE: 取值必须是 options 中的显示值
// ==========================================

use crate::domain::types::{AutoHpoState, ModelLifecycle, ParameterType};
use crate::domain::ui_rules::UiRules;
use crate::domain::value::ParameterValue;

/// 参数类型及其约束
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Integer { min_value: i64, max_value: i64 },
    Float { min_value: f64, max_value: f64 },
    Boolean,
    Selectable {
        enum_name: String,
        /// 符号名 → 显示值（保持文档顺序）
        options: Vec<(String, String)>,
    },
    Text,
}

impl Constraint {
    pub fn parameter_type(&self) -> ParameterType {
        match self {
            Constraint::Integer { .. } => ParameterType::Integer,
            Constraint::Float { .. } => ParameterType::Float,
            Constraint::Boolean => ParameterType::Boolean,
            Constraint::Selectable { .. } => ParameterType::Selectable,
            Constraint::Text => ParameterType::String,
        }
    }
}

/// 约束不满足的具体原因
///
/// 越界时保留参数自身的数值类型，INTEGER 边界不经 f64 转换
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintBreach {
    OutOfRange {
        value: ParameterValue,
        min: ParameterValue,
        max: ParameterValue,
    },
    InvalidOption { value: String, options: Vec<String> },
    TypeMismatch { expected: ParameterType, actual: &'static str },
}

/// 叶子参数
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub header: String,
    pub description: String,
    pub constraint: Constraint,
    pub default_value: ParameterValue,
    /// 当前值（None 表示使用默认值）
    pub value: Option<ParameterValue>,
    pub editable: bool,
    pub visible_in_ui: bool,
    pub affects_outcome_of: ModelLifecycle,
    /// 设置高风险取值时提示给用户的警告
    pub warning: Option<String>,
    pub ui_rules: UiRules,
    pub auto_hpo_state: AutoHpoState,
    pub auto_hpo_value: Option<ParameterValue>,
}

impl Parameter {
    fn with_constraint(header: &str, constraint: Constraint, default_value: ParameterValue) -> Self {
        Self {
            header: header.to_string(),
            description: String::new(),
            constraint,
            default_value,
            value: None,
            editable: true,
            visible_in_ui: true,
            affects_outcome_of: ModelLifecycle::None,
            warning: None,
            ui_rules: UiRules::default(),
            auto_hpo_state: AutoHpoState::NotPossible,
            auto_hpo_value: None,
        }
    }

    pub fn integer(header: &str, default_value: i64, min_value: i64, max_value: i64) -> Self {
        Self::with_constraint(
            header,
            Constraint::Integer {
                min_value,
                max_value,
            },
            ParameterValue::Integer(default_value),
        )
    }

    pub fn float(header: &str, default_value: f64, min_value: f64, max_value: f64) -> Self {
        Self::with_constraint(
            header,
            Constraint::Float {
                min_value,
                max_value,
            },
            ParameterValue::Float(default_value),
        )
    }

    pub fn boolean(header: &str, default_value: bool) -> Self {
        Self::with_constraint(header, Constraint::Boolean, ParameterValue::Boolean(default_value))
    }

    pub fn selectable(
        header: &str,
        enum_name: &str,
        options: &[(&str, &str)],
        default_value: &str,
    ) -> Self {
        Self::with_constraint(
            header,
            Constraint::Selectable {
                enum_name: enum_name.to_string(),
                options: options
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            },
            ParameterValue::Text(default_value.to_string()),
        )
    }

    pub fn text(header: &str, default_value: &str) -> Self {
        Self::with_constraint(header, Constraint::Text, ParameterValue::Text(default_value.to_string()))
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_value(mut self, value: impl Into<ParameterValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_warning(mut self, warning: &str) -> Self {
        self.warning = Some(warning.to_string());
        self
    }

    pub fn with_ui_rules(mut self, ui_rules: UiRules) -> Self {
        self.ui_rules = ui_rules;
        self
    }

    pub fn affecting(mut self, lifecycle: ModelLifecycle) -> Self {
        self.affects_outcome_of = lifecycle;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible_in_ui = false;
        self
    }

    pub fn parameter_type(&self) -> ParameterType {
        self.constraint.parameter_type()
    }

    /// 当前生效值：有覆写取覆写，否则取默认值
    pub fn effective_value(&self) -> &ParameterValue {
        self.value.as_ref().unwrap_or(&self.default_value)
    }

    /// SELECTABLE 的全部显示值
    pub fn option_values(&self) -> Vec<String> {
        match &self.constraint {
            Constraint::Selectable { options, .. } => {
                options.iter().map(|(_, v)| v.clone()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// 将符号名或显示值解析为显示值（仅 SELECTABLE）
    pub fn resolve_option(&self, raw: &str) -> Option<&str> {
        match &self.constraint {
            Constraint::Selectable { options, .. } => options
                .iter()
                .find(|(_, v)| v == raw)
                .or_else(|| options.iter().find(|(k, _)| k == raw))
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    /// 检查取值是否满足本参数的类型与约束
    pub fn check(&self, value: &ParameterValue) -> Result<(), ConstraintBreach> {
        let expected = self.parameter_type();
        if !value.matches_type(expected) {
            return Err(ConstraintBreach::TypeMismatch {
                expected,
                actual: value.kind_name(),
            });
        }

        match &self.constraint {
            Constraint::Integer {
                min_value,
                max_value,
            } => {
                let v = value.as_i64().unwrap_or_default();
                if v < *min_value || v > *max_value {
                    return Err(ConstraintBreach::OutOfRange {
                        value: ParameterValue::Integer(v),
                        min: ParameterValue::Integer(*min_value),
                        max: ParameterValue::Integer(*max_value),
                    });
                }
            }
            Constraint::Float {
                min_value,
                max_value,
            } => {
                let v = value.as_f64().unwrap_or_default();
                // NaN 不满足任何区间
                if !(v >= *min_value && v <= *max_value) {
                    return Err(ConstraintBreach::OutOfRange {
                        value: ParameterValue::Float(v),
                        min: ParameterValue::Float(*min_value),
                        max: ParameterValue::Float(*max_value),
                    });
                }
            }
            Constraint::Selectable { options, .. } => {
                let v = value.as_str().unwrap_or_default();
                if !options.iter().any(|(_, display)| display == v) {
                    return Err(ConstraintBreach::InvalidOption {
                        value: v.to_string(),
                        options: self.option_values(),
                    });
                }
            }
            Constraint::Boolean | Constraint::Text => {}
        }

        Ok(())
    }
}
