// ==========================================
// 模型模板参数配置 - API 层
// ==========================================
// 职责: 提供配置操作接口,供命令行/界面调用
// ==========================================

pub mod config_api;
pub mod error;

// 重导出核心类型
pub use config_api::{ConfigApi, DEFAULT_HISTORY_LIMIT};
pub use error::{ApiError, ApiResult};
