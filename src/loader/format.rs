// ==========================================
// 模型模板参数配置 - 文档格式与文件读取
// ==========================================
// 支持: YAML (.yaml/.yml) / JSON (.json)
// ==========================================

use crate::loader::error::{SchemaError, SchemaResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// 模板文档格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    #[default]
    Yaml,
    Json,
}

impl DocumentFormat {
    /// 根据扩展名识别格式（不区分大小写）
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Some(DocumentFormat::Yaml),
            "json" => Some(DocumentFormat::Json),
            _ => None,
        }
    }

    /// 根据文件路径识别格式
    pub fn detect<P: AsRef<Path>>(path: P) -> SchemaResult<Self> {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        Self::from_extension(ext).ok_or_else(|| SchemaError::UnsupportedFormat(ext.to_string()))
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Yaml => write!(f, "yaml"),
            DocumentFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for DocumentFormat {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| SchemaError::UnsupportedFormat(s.to_string()))
    }
}

/// 读取模板文件文本并识别格式
pub fn read_document<P: AsRef<Path>>(path: P) -> SchemaResult<(String, DocumentFormat)> {
    let path = path.as_ref();

    // 先识别格式，避免读取不支持的文件
    let format = DocumentFormat::detect(path)?;

    let text = fs::read_to_string(path).map_err(|e| SchemaError::FileReadError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    Ok((text, format))
}

/// 将文档文本解析为有序的 YAML 值树
///
/// JSON 文档同样解析为 serde_yaml::Value，以保留键顺序。
pub fn parse_document(text: &str, format: DocumentFormat) -> SchemaResult<serde_yaml::Value> {
    let value = match format {
        DocumentFormat::Yaml => serde_yaml::from_str(text)?,
        DocumentFormat::Json => serde_json::from_str(text)?,
    };
    Ok(value)
}
