// ==========================================
// 模型模板参数配置 - 覆写审计日志
// ==========================================
// 红线: 每一次覆写的设置/恢复默认/快照恢复都必须留痕
// ==========================================

use crate::domain::value::ParameterValue;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// OverrideAction - 覆写操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverrideAction {
    Set,     // 设置覆写值
    Reset,   // 恢复默认值
    Restore, // 整体恢复快照
}

impl OverrideAction {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideAction::Set => "SET",
            OverrideAction::Reset => "RESET",
            OverrideAction::Restore => "RESTORE",
        }
    }

    /// 从字符串解析
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SET" => Some(OverrideAction::Set),
            "RESET" => Some(OverrideAction::Reset),
            "RESTORE" => Some(OverrideAction::Restore),
            _ => None,
        }
    }
}

impl std::fmt::Display for OverrideAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// OverrideLog - 覆写日志
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideLog {
    pub log_id: String,                     // 日志ID (UUID)
    pub template_id: String,                // 模板ID
    pub path: String,                       // 参数路径 (每个变更参数各一条)
    pub action: OverrideAction,             // 操作类型
    pub old_value: Option<ParameterValue>,  // 操作前的覆写值
    pub new_value: Option<ParameterValue>,  // 操作后的覆写值
    pub actor: String,                      // 操作人
    pub reason: String,                     // 操作原因
    pub action_ts: NaiveDateTime,           // 操作时间 (UTC)
}

impl OverrideLog {
    /// 创建新的覆写日志（自动生成 UUID 和时间戳）
    pub fn new(
        template_id: &str,
        path: &str,
        action: OverrideAction,
        actor: &str,
        reason: &str,
    ) -> Self {
        Self {
            log_id: Uuid::new_v4().to_string(),
            template_id: template_id.to_string(),
            path: path.to_string(),
            action,
            old_value: None,
            new_value: None,
            actor: actor.to_string(),
            reason: reason.to_string(),
            action_ts: chrono::Utc::now().naive_utc(),
        }
    }

    /// 设置前后取值
    pub fn with_values(
        mut self,
        old_value: Option<ParameterValue>,
        new_value: Option<ParameterValue>,
    ) -> Self {
        self.old_value = old_value;
        self.new_value = new_value;
        self
    }
}
