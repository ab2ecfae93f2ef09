// ==========================================
// 模型模板参数配置 - 覆写日志仓储
// ==========================================
// 职责: 管理 override_log 表（只追加，不更新）
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::{OverrideAction, OverrideLog, ParameterValue};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::override_repo::TS_FORMAT;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row, Transaction};
use std::sync::{Arc, Mutex};

pub struct OverrideLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OverrideLogRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_table()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS override_log (
              log_id TEXT PRIMARY KEY,
              template_id TEXT NOT NULL,
              path TEXT NOT NULL,
              action TEXT NOT NULL CHECK (action IN ('SET', 'RESET', 'RESTORE')),
              old_value_json TEXT,
              new_value_json TEXT,
              actor TEXT NOT NULL,
              reason TEXT NOT NULL,
              action_ts TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_override_log_template_ts
              ON override_log(template_id, action_ts DESC);
            "#,
        )?;
        Ok(())
    }

    /// 插入覆写日志
    ///
    /// # 返回
    /// - `Ok(log_id)`: 成功插入
    pub fn insert(&self, log: &OverrideLog) -> RepositoryResult<String> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let log_id = Self::insert_tx(&tx, log)?;
        tx.commit()?;
        Ok(log_id)
    }

    /// 在事务中插入覆写日志（与覆写写入同事务提交）
    pub fn insert_tx(tx: &Transaction, log: &OverrideLog) -> RepositoryResult<String> {
        let old_json = to_json(&log.old_value)?;
        let new_json = to_json(&log.new_value)?;

        tx.execute(
            r#"
            INSERT INTO override_log (
                log_id, template_id, path, action, old_value_json,
                new_value_json, actor, reason, action_ts
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                log.log_id,
                log.template_id,
                log.path,
                log.action.as_str(),
                old_json,
                new_json,
                log.actor,
                log.reason,
                log.action_ts.format(TS_FORMAT).to_string(),
            ],
        )?;

        Ok(log.log_id.clone())
    }

    /// 查询模板的覆写日志（最新在前）
    pub fn list_by_template(&self, template_id: &str, limit: usize) -> RepositoryResult<Vec<OverrideLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT log_id, template_id, path, action, old_value_json,
                   new_value_json, actor, reason, action_ts
            FROM override_log
            WHERE template_id = ?1
            ORDER BY action_ts DESC, rowid DESC
            LIMIT ?2
            "#,
        )?;

        let raws = stmt
            .query_map(params![template_id, limit as i64], raw_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        raws.into_iter().map(into_log).collect()
    }
}

struct RawLog {
    log_id: String,
    template_id: String,
    path: String,
    action: String,
    old_value_json: Option<String>,
    new_value_json: Option<String>,
    actor: String,
    reason: String,
    action_ts: String,
}

fn raw_row(row: &Row) -> rusqlite::Result<RawLog> {
    Ok(RawLog {
        log_id: row.get(0)?,
        template_id: row.get(1)?,
        path: row.get(2)?,
        action: row.get(3)?,
        old_value_json: row.get(4)?,
        new_value_json: row.get(5)?,
        actor: row.get(6)?,
        reason: row.get(7)?,
        action_ts: row.get(8)?,
    })
}

fn into_log(raw: RawLog) -> RepositoryResult<OverrideLog> {
    let action = OverrideAction::parse(&raw.action).ok_or_else(|| RepositoryError::FieldValueError {
        field: "action".to_string(),
        message: format!("未知操作类型: {}", raw.action),
    })?;
    let action_ts = NaiveDateTime::parse_from_str(&raw.action_ts, TS_FORMAT).map_err(|e| {
        RepositoryError::FieldValueError {
            field: "action_ts".to_string(),
            message: e.to_string(),
        }
    })?;

    Ok(OverrideLog {
        log_id: raw.log_id,
        template_id: raw.template_id,
        path: raw.path,
        action,
        old_value: from_json(raw.old_value_json)?,
        new_value: from_json(raw.new_value_json)?,
        actor: raw.actor,
        reason: raw.reason,
        action_ts,
    })
}

fn to_json(value: &Option<ParameterValue>) -> RepositoryResult<Option<String>> {
    value
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(RepositoryError::from)
}

fn from_json(raw: Option<String>) -> RepositoryResult<Option<ParameterValue>> {
    raw.map(|s| serde_json::from_str::<ParameterValue>(&s))
        .transpose()
        .map_err(RepositoryError::from)
}
