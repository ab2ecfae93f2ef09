// ==========================================
// 模型模板参数配置 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 覆写值与覆写日志的持久化,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod override_log_repo;
pub mod override_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use override_log_repo::OverrideLogRepository;
pub use override_repo::{OverrideEntity, OverrideRepository};
