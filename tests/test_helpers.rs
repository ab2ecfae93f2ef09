// ==========================================
// 测试辅助函数
// ==========================================
// 职责: STFPM 示例模板、临时模板文件与临时覆写库
// ==========================================
#![allow(dead_code)]

use ote_config::api::ConfigApi;
use ote_config::db::open_shared_connection;
use ote_config::domain::ConfigTree;
use std::error::Error;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// 示例模板（与仓库中的 templates/stfpm/configuration.yaml 相同）
pub const STFPM_YAML: &str = include_str!("../templates/stfpm/configuration.yaml");

/// 解析示例模板
pub fn stfpm_tree() -> ConfigTree {
    ote_config::loader::load(STFPM_YAML).expect("示例模板必须可以加载")
}

/// 在目录中写入模板文件
pub fn write_template(dir: &Path, file_name: &str, content: &str) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, content).expect("写入模板文件失败");
    path
}

/// API 测试环境（临时目录中的模板文件 + 覆写库）
pub struct ApiTestEnv {
    pub api: ConfigApi,
    pub template_path: PathBuf,
    pub db_path: String,
    pub dir: TempDir,
}

impl ApiTestEnv {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        ote_config::logging::init_test();

        let dir = tempfile::tempdir()?;
        let template_path = write_template(dir.path(), "configuration.yaml", STFPM_YAML);
        let db_path = dir
            .path()
            .join("db")
            .join("ote_config.db")
            .to_string_lossy()
            .into_owned();
        let api = ConfigApi::from_connection(open_shared_connection(&db_path)?)?;

        Ok(Self {
            api,
            template_path,
            db_path,
            dir,
        })
    }

    /// 基于同一个库文件重新打开 API（模拟重启）
    pub fn reopen(&self) -> Result<ConfigApi, Box<dyn Error>> {
        Ok(ConfigApi::from_connection(open_shared_connection(&self.db_path)?)?)
    }
}
