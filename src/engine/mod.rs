// ==========================================
// 模型模板参数配置 - 引擎层
// ==========================================
// 职责: 参数树上的纯函数操作（校验、覆写、UI 状态、导出）
// 说明: 单线程、同步，无 I/O
// ==========================================

pub mod error;
pub mod flatten;
pub mod override_engine;
pub mod ui_state;
pub mod validator;

// 重导出核心接口
pub use error::{ConfigError, ConfigResult, Violation, ViolationKind};
pub use flatten::{to_external_args, to_nested_values, ExternalArgs};
pub use override_engine::{
    apply_override, clear_override, parse_override, restore_override, set_override,
    AppliedOverride,
};
pub use ui_state::{evaluate_ui_state, parameter_ui_state, UiState};
pub use validator::{ensure_valid, validate};
