// ==========================================
// 模型模板参数配置 - 领域层
// ==========================================
// 职责: 参数树的内存模型（分组、叶子参数、取值、UI 规则）与覆写日志
// ==========================================

pub mod group;
pub mod override_log;
pub mod parameter;
pub mod types;
pub mod ui_rules;
pub mod value;

// 重导出核心类型
pub use group::{
    is_reserved_key, join_path, ConfigNode, ConfigTree, ParameterGroup, GROUP_METADATA_KEYS,
    PATH_SEPARATOR, ROOT_METADATA_KEYS,
};
pub use override_log::{OverrideAction, OverrideLog};
pub use parameter::{Constraint, ConstraintBreach, Parameter};
pub use types::{
    AutoHpoState, Comparison, LogicalOperator, ModelLifecycle, NodeType, ParameterType,
    ParseEnumError, UiAction,
};
pub use ui_rules::{Rule, RuleExpr, UiRules};
pub use value::ParameterValue;
