// ==========================================
// 模型模板参数配置 - 运行参数
// ==========================================
// 环境变量:
// - OTE_CONFIG_DB_PATH: 覆写库路径（默认: 用户数据目录/ote-config/ote_config.db）
// - OTE_CONFIG_LOCALE:  界面语言（zh-CN / en，默认 zh-CN）
// ==========================================

use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "OTE_CONFIG_DB_PATH";
pub const ENV_LOCALE: &str = "OTE_CONFIG_LOCALE";

pub const DEFAULT_LOCALE: &str = "zh-CN";
pub const SUPPORTED_LOCALES: &[&str] = &["zh-CN", "en"];

const APP_DIR: &str = "ote-config";
const DB_FILE: &str = "ote_config.db";

/// 运行参数
#[derive(Debug, Clone, PartialEq)]
pub struct AppSettings {
    pub db_path: PathBuf,
    pub locale: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

impl AppSettings {
    /// 从进程环境变量读取
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取（便于测试注入）
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(path) = lookup(ENV_DB_PATH).filter(|s| !s.trim().is_empty()) {
            settings.db_path = PathBuf::from(path);
        }
        if let Some(locale) = lookup(ENV_LOCALE) {
            settings = settings.with_locale(&locale);
        }

        settings
    }

    /// 命令行指定的数据库路径
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    /// 指定界面语言；不支持的语言保持原值并告警
    pub fn with_locale(mut self, locale: &str) -> Self {
        let locale = locale.trim();
        if SUPPORTED_LOCALES.contains(&locale) {
            self.locale = locale.to_string();
        } else {
            tracing::warn!(locale = %locale, fallback = %self.locale, "不支持的语言，保持原设置");
        }
        self
    }

    /// 数据库路径字符串（供 rusqlite 打开）
    pub fn db_path_str(&self) -> String {
        self.db_path.to_string_lossy().into_owned()
    }
}

/// 默认覆写库路径
///
/// 取不到用户数据目录时退回当前目录。
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DB_FILE)
}
