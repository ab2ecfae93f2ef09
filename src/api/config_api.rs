// ==========================================
// 模型模板参数配置 - 配置管理 API
// ==========================================
// 职责: 模板加载、参数覆写/恢复默认、导出、快照管理
// 红线:
// - 所有写操作必须记录操作人与原因（override_log，与覆写同事务提交）
// - 失败时内存中的参数树与数据库均不变
// - 已持久化覆写与模板不相容时加载直接报错，不静默丢弃；可通过 reset 清除
// ==========================================

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Transaction};

use crate::api::error::{ApiError, ApiResult};
use crate::db::open_shared_connection;
use crate::domain::{ConfigTree, OverrideAction, OverrideLog, ParameterValue};
use crate::engine::{
    clear_override, restore_override, set_override, to_external_args, AppliedOverride,
    ConfigError, ExternalArgs,
};
use crate::loader;
use crate::repository::{
    OverrideEntity, OverrideLogRepository, OverrideRepository, RepositoryError, RepositoryResult,
};

/// 历史记录默认条数
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

// ==========================================
// ConfigApi - 配置管理 API
// ==========================================

/// 配置管理API
///
/// 职责：
/// 1. 模板加载（可叠加已保存的覆写）
/// 2. 参数覆写与恢复默认
/// 3. 外部训练参数导出
/// 4. 覆写快照与操作历史
pub struct ConfigApi {
    conn: Arc<Mutex<Connection>>,
    override_repo: OverrideRepository,
    log_repo: OverrideLogRepository,
}

impl ConfigApi {
    /// 打开（必要时创建）覆写库并创建ConfigApi实例
    pub fn new(db_path: &str) -> ApiResult<Self> {
        let conn = open_shared_connection(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(format!("{}: {}", db_path, e)))?;
        Self::from_connection(conn)
    }

    /// 基于共享连接创建（自动建表）
    ///
    /// 覆写仓储与日志仓储共用同一连接，写操作在同一事务内提交
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        let override_repo = OverrideRepository::from_connection(conn.clone())?;
        let log_repo = OverrideLogRepository::from_connection(conn.clone())?;
        Ok(Self {
            conn,
            override_repo,
            log_repo,
        })
    }

    /// 在单个事务中执行写操作；闭包返回错误时整体回滚
    fn in_transaction<T>(&self, f: impl FnOnce(&Transaction) -> RepositoryResult<T>) -> ApiResult<T> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    // ==========================================
    // 加载
    // ==========================================

    /// 加载模板文档（不叠加覆写）
    ///
    /// # 参数
    /// - path: 模板文件（.yaml/.yml/.json）
    /// - template_id: 显式模板ID；为空时取文档根节点 id，再退回文件名
    pub fn load_template(&self, path: &Path, template_id: Option<&str>) -> ApiResult<ConfigTree> {
        let mut tree = loader::load_file(path)?;
        tree.id = resolve_template_id(&tree, path, template_id)?;
        Ok(tree)
    }

    /// 加载模板并叠加已保存的覆写
    pub fn load_with_overrides(&self, path: &Path, template_id: Option<&str>) -> ApiResult<ConfigTree> {
        let mut tree = self.load_template(path, template_id)?;
        let entities = self.override_repo.list_by_template(&tree.id)?;

        for entity in &entities {
            restore_override(&mut tree, &entity.path, entity.value.clone()).map_err(|source| {
                ApiError::StaleOverride {
                    template_id: tree.id.clone(),
                    path: entity.path.clone(),
                    source,
                }
            })?;
        }

        tracing::info!(
            template_id = %tree.id,
            overrides = entities.len(),
            "模板已加载并叠加覆写"
        );
        Ok(tree)
    }

    // ==========================================
    // 写操作
    // ==========================================

    /// 设置参数覆写并持久化
    ///
    /// # 返回
    /// - Ok(AppliedOverride): 成功（含 warning，需展示给操作员）
    /// - Err(ApiError): 参数/约束/只读/数据库错误；此时 tree 不变
    pub fn update_parameter(
        &self,
        tree: &mut ConfigTree,
        path: &str,
        value: ParameterValue,
        actor: &str,
        reason: &str,
    ) -> ApiResult<AppliedOverride> {
        require_audit(actor, reason)?;

        let mut updated = tree.clone();
        let applied = set_override(&mut updated, path, value)?;

        let entity = OverrideEntity::new(&updated.id, path, applied.current.clone(), actor);
        let log = OverrideLog::new(&updated.id, path, OverrideAction::Set, actor, reason)
            .with_values(applied.previous.clone(), Some(applied.current.clone()));
        self.in_transaction(|tx| {
            OverrideRepository::upsert_tx(tx, &entity)?;
            OverrideLogRepository::insert_tx(tx, &log)
        })?;

        *tree = updated;
        Ok(applied)
    }

    /// 恢复参数默认值（删除覆写）
    ///
    /// 模板已删除该参数或将其改为静态只读时，仍可清除库中残留的覆写；
    /// 此时内存中的参数树不变。
    ///
    /// # 返回
    /// - Ok(Some(old)): 被清除的覆写值（优先取库中保存的值）
    /// - Ok(None): 参数原本就是默认值（不记日志）
    pub fn reset_parameter(
        &self,
        tree: &mut ConfigTree,
        path: &str,
        actor: &str,
        reason: &str,
    ) -> ApiResult<Option<ParameterValue>> {
        require_audit(actor, reason)?;

        let stored = self.override_repo.find(&tree.id, path)?.map(|e| e.value);
        let statically_editable = tree.find_parameter(path).map(|p| p.editable).unwrap_or(false);

        let mut updated = tree.clone();
        let cleared = match clear_override(&mut updated, path) {
            Ok(previous) => previous,
            Err(ConfigError::UnknownParameter { .. } | ConfigError::ReadOnly { .. })
                if stored.is_some() && !statically_editable =>
            {
                tracing::warn!(template_id = %tree.id, path = %path, "清除与模板不相容的残留覆写");
                None
            }
            Err(e) => return Err(e.into()),
        };

        let previous = stored.or(cleared);
        if previous.is_some() {
            let log = OverrideLog::new(&updated.id, path, OverrideAction::Reset, actor, reason)
                .with_values(previous.clone(), None);
            self.in_transaction(|tx| {
                OverrideRepository::delete_tx(tx, &log.template_id, path)?;
                OverrideLogRepository::insert_tx(tx, &log)
            })?;
        }

        *tree = updated;
        Ok(previous)
    }

    // ==========================================
    // 导出
    // ==========================================

    /// 导出外部训练参数（先整体校验）
    pub fn export_args(&self, tree: &ConfigTree) -> ApiResult<ExternalArgs> {
        Ok(to_external_args(tree)?)
    }

    // ==========================================
    // 快照
    // ==========================================

    /// 获取模板覆写快照
    ///
    /// # 返回
    /// - Ok(String): JSON 对象 {path: value}
    pub fn get_snapshot(&self, template_id: &str) -> ApiResult<String> {
        let snapshot: BTreeMap<String, ParameterValue> = self
            .override_repo
            .list_by_template(template_id)?
            .into_iter()
            .map(|e| (e.path, e.value))
            .collect();

        serde_json::to_string_pretty(&snapshot)
            .map_err(|e| ApiError::InvalidInput(format!("快照序列化失败: {}", e)))
    }

    /// 从快照恢复模板的全部覆写
    ///
    /// 快照中的每一项先在默认值树上校验，全部通过后在单事务中替换；
    /// 快照未列出的覆写会被清除。
    ///
    /// # 返回
    /// - Ok(usize): 恢复的覆写个数
    pub fn restore_snapshot(
        &self,
        tree: &mut ConfigTree,
        snapshot_json: &str,
        actor: &str,
        reason: &str,
    ) -> ApiResult<usize> {
        if snapshot_json.trim().is_empty() {
            return Err(ApiError::InvalidInput("快照JSON不能为空".to_string()));
        }
        require_audit(actor, reason)?;

        let snapshot: BTreeMap<String, ParameterValue> = serde_json::from_str(snapshot_json)
            .map_err(|e| ApiError::InvalidInput(format!("快照JSON格式错误: {}", e)))?;

        let mut updated = tree.clone();
        updated.clear_overrides();
        for (path, value) in &snapshot {
            restore_override(&mut updated, path, value.clone())?;
        }

        let entities: Vec<OverrideEntity> = snapshot
            .keys()
            .filter_map(|path| {
                updated
                    .find_parameter(path)
                    .and_then(|p| p.value.clone())
                    .map(|v| OverrideEntity::new(&updated.id, path, v, actor))
            })
            .collect();
        let logs: Vec<OverrideLog> = tree
            .parameters()
            .into_iter()
            .filter_map(|(path, param)| {
                let before = param.value.clone();
                let after = updated.find_parameter(&path).and_then(|p| p.value.clone());
                (before != after).then(|| {
                    OverrideLog::new(&updated.id, &path, OverrideAction::Restore, actor, reason)
                        .with_values(before, after)
                })
            })
            .collect();

        let count = self.in_transaction(|tx| {
            let count = OverrideRepository::replace_all_tx(tx, &updated.id, &entities)?;
            for log in &logs {
                OverrideLogRepository::insert_tx(tx, log)?;
            }
            Ok(count)
        })?;

        tracing::info!(template_id = %updated.id, restored = count, actor = %actor, "覆写快照已恢复");
        *tree = updated;
        Ok(count)
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 查询模板的覆写历史（最新在前）
    pub fn list_history(&self, template_id: &str, limit: Option<usize>) -> ApiResult<Vec<OverrideLog>> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        if limit == 0 {
            return Err(ApiError::InvalidInput("limit 必须大于 0".to_string()));
        }
        Ok(self.log_repo.list_by_template(template_id, limit)?)
    }
}

/// 操作人与原因不能为空
fn require_audit(actor: &str, reason: &str) -> ApiResult<()> {
    if actor.trim().is_empty() {
        return Err(ApiError::InvalidInput("操作人不能为空".to_string()));
    }
    if reason.trim().is_empty() {
        return Err(ApiError::InvalidInput("操作原因不能为空".to_string()));
    }
    Ok(())
}

/// 模板ID: 显式指定 > 文档根节点 id > 文件名
fn resolve_template_id(tree: &ConfigTree, path: &Path, explicit: Option<&str>) -> ApiResult<String> {
    if let Some(id) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
        return Ok(id.to_string());
    }
    if !tree.id.trim().is_empty() {
        return Ok(tree.id.trim().to_string());
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::InvalidInput(format!("无法确定模板ID: {}", path.display())))
}
