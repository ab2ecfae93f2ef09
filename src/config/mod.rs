// ==========================================
// 模型模板参数配置 - 配置层
// ==========================================
// 职责: 运行参数（数据库路径、界面语言）的加载
// 优先级: 命令行参数 > 环境变量 > 默认值
// ==========================================

pub mod settings;

pub use settings::{AppSettings, ENV_DB_PATH, ENV_LOCALE};
