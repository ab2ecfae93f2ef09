// ==========================================
// 模型模板参数配置 - 模板加载层
// ==========================================
// 职责: 模板文档（YAML/JSON）与内存参数树之间的转换
// ==========================================

pub mod error;
pub mod format;
pub mod schema_loader;
pub mod writer;

// 重导出核心类型
pub use error::{SchemaError, SchemaResult};
pub use format::{parse_document, read_document, DocumentFormat};
pub use schema_loader::{load, load_file, load_value, load_with_format};
pub use writer::{serialize, to_document_value};
