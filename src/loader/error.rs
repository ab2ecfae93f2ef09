// ==========================================
// 模型模板参数配置 - 模板加载错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 模板文档加载/序列化错误（SchemaError）
#[derive(Error, Debug)]
pub enum SchemaError {
    // ===== 文件相关错误 =====
    #[error("文件读取失败 ({path}): {message}")]
    FileReadError { path: String, message: String },

    #[error("文件格式不支持: {0}（仅支持 .yaml/.yml/.json）")]
    UnsupportedFormat(String),

    #[error("文档解析失败: {0}")]
    ParseError(String),

    #[error("文档序列化失败: {0}")]
    SerializeError(String),

    // ===== 结构错误 =====
    #[error("节点必须是映射 (path={0})")]
    NotAMapping(String),

    #[error("缺少必填字段 (path={path}): {field}")]
    MissingField { path: String, field: &'static str },

    #[error("字段类型错误 (path={path}, 字段 {field}): 期望 {expected}，实际 {actual}")]
    FieldTypeMismatch {
        path: String,
        field: String,
        expected: String,
        actual: String,
    },

    #[error("非法枚举值 (path={path}, 字段 {field}): {value}")]
    InvalidEnumValue {
        path: String,
        field: String,
        value: String,
    },

    #[error("根节点类型必须为 CONFIGURABLE_PARAMETERS，实际为 {0}")]
    InvalidRootType(String),

    #[error("节点类型不能出现在此位置 (path={path}): {node_type}")]
    MisplacedNode { path: String, node_type: String },

    #[error("键名与分组元数据字段冲突，无法序列化 (path={path})")]
    ReservedKey { path: String },
}

impl From<serde_yaml::Error> for SchemaError {
    fn from(err: serde_yaml::Error) -> Self {
        SchemaError::ParseError(err.to_string())
    }
}

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        SchemaError::ParseError(err.to_string())
    }
}

/// Result 类型别名
pub type SchemaResult<T> = Result<T, SchemaError>;
