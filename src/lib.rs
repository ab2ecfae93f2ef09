// ==========================================
// 模型模板参数配置 - 核心库
// ==========================================
// 系统定位: 训练/优化前的参数配置步骤
// 流程: 模板文档 → 参数树 → 校验/覆写 → 外部训练参数
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 参数树模型
pub mod domain;

// 加载层 - 模板文档解析与序列化
pub mod loader;

// 引擎层 - 校验、覆写、UI 状态、导出
pub mod engine;

// 数据仓储层 - 覆写持久化
pub mod repository;

// 配置层 - 运行参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 配置操作接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    ConfigNode, ConfigTree, Constraint, OverrideAction, OverrideLog, Parameter, ParameterGroup,
    ParameterType, ParameterValue, Rule, RuleExpr, UiAction, UiRules,
};

// 加载
pub use loader::{load, load_file, serialize, DocumentFormat, SchemaError};

// 引擎
pub use engine::{
    apply_override, evaluate_ui_state, to_external_args, validate, ConfigError, ExternalArgs,
    Violation, ViolationKind,
};

// API
pub use api::{ApiError, ApiResult, ConfigApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "模型模板参数配置";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
