// ==========================================
// 模型模板参数配置 - 参数覆写仓储
// ==========================================
// 职责: 管理 config_override 表 (按模板+参数路径)
// 说明: 只保存用户覆写值；默认值始终来自模板文档
// 红线: Repository 不做业务逻辑,只做数据映射
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::ParameterValue;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::sync::{Arc, Mutex};

/// 时间戳格式（UTC）
pub const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// 参数覆写实体
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideEntity {
    pub template_id: String,    // 模板ID
    pub path: String,           // 参数路径 (点分)
    pub value: ParameterValue,  // 覆写值 (以 JSON 存储)
    pub updated_at: String,     // 更新时间 (UTC)
    pub updated_by: String,     // 更新人
}

impl OverrideEntity {
    /// 创建实体（时间戳取当前 UTC 时间，与 override_log 一致）
    pub fn new(template_id: &str, path: &str, value: ParameterValue, updated_by: &str) -> Self {
        Self {
            template_id: template_id.to_string(),
            path: path.to_string(),
            value,
            updated_at: chrono::Utc::now().format(TS_FORMAT).to_string(),
            updated_by: updated_by.to_string(),
        }
    }
}

pub struct OverrideRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OverrideRepository {
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

    /// 确保表存在（如果不存在则创建）
    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS config_override (
              template_id TEXT NOT NULL,
              path TEXT NOT NULL,
              value_json TEXT NOT NULL,
              updated_at TEXT NOT NULL DEFAULT (datetime('now')),
              updated_by TEXT NOT NULL,
              PRIMARY KEY (template_id, path)
            );

            CREATE INDEX IF NOT EXISTS idx_config_override_template
              ON config_override(template_id);
            "#,
        )?;
        Ok(())
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 创建或更新覆写（Upsert 操作）
    /// 如果 (template_id, path) 已存在，则更新；否则插入
    pub fn upsert(&self, entity: &OverrideEntity) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        Self::upsert_tx(&tx, entity)?;
        tx.commit()?;
        Ok(())
    }

    /// 删除覆写
    ///
    /// # 返回
    /// - Ok(true): 删除了一条记录
    /// - Ok(false): 记录不存在
    pub fn delete(&self, template_id: &str, path: &str) -> RepositoryResult<bool> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let deleted = Self::delete_tx(&tx, template_id, path)?;
        tx.commit()?;
        Ok(deleted)
    }

    /// 用给定集合整体替换模板的全部覆写（单事务）
    ///
    /// # 返回
    /// - Ok(count): 写入的记录数
    pub fn replace_all(&self, template_id: &str, entities: &[OverrideEntity]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let count = Self::replace_all_tx(&tx, template_id, entities)?;
        tx.commit()?;
        Ok(count)
    }

    // ==========================================
    // 事务内写入（由调用方提交）
    // ==========================================

    /// 在事务中 Upsert 覆写
    pub fn upsert_tx(tx: &Transaction, entity: &OverrideEntity) -> RepositoryResult<()> {
        let value_json = serde_json::to_string(&entity.value)?;
        tx.execute(
            r#"
            INSERT INTO config_override (template_id, path, value_json, updated_at, updated_by)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(template_id, path) DO UPDATE SET
                value_json = excluded.value_json,
                updated_at = excluded.updated_at,
                updated_by = excluded.updated_by
            "#,
            params![
                entity.template_id,
                entity.path,
                value_json,
                entity.updated_at,
                entity.updated_by,
            ],
        )?;
        Ok(())
    }

    /// 在事务中删除覆写
    pub fn delete_tx(tx: &Transaction, template_id: &str, path: &str) -> RepositoryResult<bool> {
        let rows = tx.execute(
            "DELETE FROM config_override WHERE template_id = ?1 AND path = ?2",
            params![template_id, path],
        )?;
        Ok(rows > 0)
    }

    /// 在事务中整体替换模板的全部覆写
    pub fn replace_all_tx(
        tx: &Transaction,
        template_id: &str,
        entities: &[OverrideEntity],
    ) -> RepositoryResult<usize> {
        tx.execute(
            "DELETE FROM config_override WHERE template_id = ?1",
            params![template_id],
        )?;

        let mut count = 0;
        for e in entities {
            let value_json = serde_json::to_string(&e.value)?;
            tx.execute(
                r#"
                INSERT INTO config_override (template_id, path, value_json, updated_at, updated_by)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![template_id, e.path, value_json, e.updated_at, e.updated_by],
            )?;
            count += 1;
        }
        Ok(count)
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 查询单条覆写
    pub fn find(&self, template_id: &str, path: &str) -> RepositoryResult<Option<OverrideEntity>> {
        let conn = self.get_conn()?;
        let raw = conn
            .query_row(
                r#"
                SELECT template_id, path, value_json, updated_at, updated_by
                FROM config_override
                WHERE template_id = ?1 AND path = ?2
                "#,
                params![template_id, path],
                raw_row,
            )
            .optional()?;

        raw.map(into_entity).transpose()
    }

    /// 查询模板的全部覆写（按路径排序）
    pub fn list_by_template(&self, template_id: &str) -> RepositoryResult<Vec<OverrideEntity>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT template_id, path, value_json, updated_at, updated_by
            FROM config_override
            WHERE template_id = ?1
            ORDER BY path ASC
            "#,
        )?;

        let raws = stmt
            .query_map(params![template_id], raw_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        raws.into_iter().map(into_entity).collect()
    }
}

type RawRow = (String, String, String, String, String);

fn raw_row(row: &Row) -> rusqlite::Result<RawRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn into_entity(raw: RawRow) -> RepositoryResult<OverrideEntity> {
    let (template_id, path, value_json, updated_at, updated_by) = raw;
    let value = serde_json::from_str::<ParameterValue>(&value_json).map_err(|e| {
        RepositoryError::FieldValueError {
            field: format!("value_json ({})", path),
            message: e.to_string(),
        }
    })?;
    Ok(OverrideEntity {
        template_id,
        path,
        value,
        updated_at,
        updated_by,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory_shared;

    fn repo() -> OverrideRepository {
        OverrideRepository::from_connection(open_in_memory_shared().unwrap()).unwrap()
    }

    #[test]
    fn test_upsert_and_find() {
        let repo = repo();
        repo.upsert(&OverrideEntity::new("stfpm", "dataset.train_batch_size", 64i64.into(), "alice"))
            .unwrap();
        repo.upsert(&OverrideEntity::new("stfpm", "dataset.train_batch_size", 128i64.into(), "bob"))
            .unwrap();

        let found = repo.find("stfpm", "dataset.train_batch_size").unwrap().unwrap();
        assert_eq!(found.value, ParameterValue::Integer(128));
        assert_eq!(found.updated_by, "bob");
        assert!(repo.find("other", "dataset.train_batch_size").unwrap().is_none());
    }

    #[test]
    fn test_value_kinds_survive_storage() {
        let repo = repo();
        let values: Vec<(&str, ParameterValue)> = vec![
            ("a", ParameterValue::Boolean(true)),
            ("b", ParameterValue::Float(1.0)),
            ("c", ParameterValue::Text("Mixed".to_string())),
        ];
        for (path, v) in &values {
            repo.upsert(&OverrideEntity::new("t", path, v.clone(), "alice")).unwrap();
        }
        let listed: Vec<ParameterValue> = repo
            .list_by_template("t")
            .unwrap()
            .into_iter()
            .map(|e| e.value)
            .collect();
        assert_eq!(listed, values.into_iter().map(|(_, v)| v).collect::<Vec<_>>());
    }

    #[test]
    fn test_delete_and_replace_all() {
        let repo = repo();
        repo.upsert(&OverrideEntity::new("t", "x", 1i64.into(), "alice")).unwrap();
        repo.upsert(&OverrideEntity::new("u", "x", 1i64.into(), "alice")).unwrap();

        assert!(repo.delete("t", "x").unwrap());
        assert!(!repo.delete("t", "x").unwrap());

        let replaced = repo
            .replace_all(
                "u",
                &[
                    OverrideEntity::new("u", "y", 2i64.into(), "bob"),
                    OverrideEntity::new("u", "z", 3i64.into(), "bob"),
                ],
            )
            .unwrap();
        assert_eq!(replaced, 2);
        let paths: Vec<String> = repo.list_by_template("u").unwrap().into_iter().map(|e| e.path).collect();
        assert_eq!(paths, vec!["y".to_string(), "z".to_string()]);
    }

    #[test]
    fn test_updated_at_uses_log_clock() {
        let entity = OverrideEntity::new("t", "x", 1i64.into(), "alice");
        let log = crate::domain::OverrideLog::new("t", "x", crate::domain::OverrideAction::Set, "alice", "r");

        let updated_at = chrono::NaiveDateTime::parse_from_str(&entity.updated_at, TS_FORMAT).unwrap();
        assert!((log.action_ts - updated_at).num_seconds().abs() < 5);
    }

    #[test]
    fn test_uncommitted_transaction_rolls_back() {
        let conn = open_in_memory_shared().unwrap();
        let repo = OverrideRepository::from_connection(conn.clone()).unwrap();
        {
            let mut guard = conn.lock().unwrap();
            let tx = guard.transaction().unwrap();
            OverrideRepository::upsert_tx(&tx, &OverrideEntity::new("t", "x", 1i64.into(), "alice"))
                .unwrap();
        }
        assert!(repo.find("t", "x").unwrap().is_none());
    }
}

