// ==========================================
// 模型模板参数配置 - 参数覆写引擎
// ==========================================
// 职责: 在声明约束内设置/清除叶子参数的当前值
// 红线:
// - 只读参数（editable=false 或 UI 规则禁用编辑）一律拒绝
// - 失败时参数树保持不变
// - 不修改树结构，只改 value 字段
// ==========================================

use crate::domain::{ConfigTree, Parameter, ParameterType, ParameterValue};
use crate::engine::error::{ConfigError, ConfigResult};
use crate::engine::ui_state::parameter_ui_state;
use serde::Serialize;

/// 一次成功覆写的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedOverride {
    pub path: String,
    /// 覆写前的当前值（None 表示此前使用默认值）
    pub previous: Option<ParameterValue>,
    pub current: ParameterValue,
    /// 参数声明的风险提示（需展示给用户）
    pub warning: Option<String>,
}

/// 纯函数覆写：返回新树，原树不变
pub fn apply_override(
    tree: &ConfigTree,
    path: &str,
    value: ParameterValue,
) -> ConfigResult<ConfigTree> {
    let mut updated = tree.clone();
    set_override(&mut updated, path, value)?;
    Ok(updated)
}

/// 原地覆写
///
/// # 返回
/// - Ok(AppliedOverride): 覆写成功（附带 warning）
/// - Err(ConfigError): UnknownParameter / ReadOnly / TypeMismatch / OutOfRange / InvalidOption
pub fn set_override(
    tree: &mut ConfigTree,
    path: &str,
    value: ParameterValue,
) -> ConfigResult<AppliedOverride> {
    let param = writable_parameter(tree, path, true)?;
    let normalized = normalize(param, path, value)?;

    param
        .check(&normalized)
        .map_err(|breach| ConfigError::from_breach(path, breach))?;

    let warning = param.warning.clone();
    let target = tree
        .find_parameter_mut(path)
        .ok_or_else(|| ConfigError::UnknownParameter {
            path: path.to_string(),
        })?;
    let previous = target.value.replace(normalized.clone());

    tracing::info!(path = %path, value = %normalized, "参数覆写成功");
    if let Some(w) = &warning {
        tracing::warn!(path = %path, warning = %w, "参数覆写带风险提示");
    }

    Ok(AppliedOverride {
        path: path.to_string(),
        previous,
        current: normalized,
        warning,
    })
}

/// 清除覆写，恢复默认值
///
/// # 返回
/// - Ok(Some(old)): 被清除的覆写值
/// - Ok(None): 参数本来就没有覆写
pub fn clear_override(tree: &mut ConfigTree, path: &str) -> ConfigResult<Option<ParameterValue>> {
    writable_parameter(tree, path, true)?;

    let target = tree
        .find_parameter_mut(path)
        .ok_or_else(|| ConfigError::UnknownParameter {
            path: path.to_string(),
        })?;
    let previous = target.value.take();

    tracing::info!(path = %path, "参数覆写已清除");
    Ok(previous)
}

/// 恢复已持久化的覆写值
///
/// 只检查静态 editable 与取值约束，不求值 UI 规则：
/// 规则依赖的其他覆写此时可能尚未恢复。
pub fn restore_override(tree: &mut ConfigTree, path: &str, value: ParameterValue) -> ConfigResult<()> {
    let param = writable_parameter(tree, path, false)?;
    let normalized = normalize(param, path, value)?;
    param
        .check(&normalized)
        .map_err(|breach| ConfigError::from_breach(path, breach))?;

    if let Some(target) = tree.find_parameter_mut(path) {
        target.value = Some(normalized);
    }
    Ok(())
}

/// 将界面/命令行文本解析为参数对应类型的取值
pub fn parse_override(tree: &ConfigTree, path: &str, raw: &str) -> ConfigResult<ParameterValue> {
    let param = tree
        .find_parameter(path)
        .ok_or_else(|| ConfigError::UnknownParameter {
            path: path.to_string(),
        })?;

    let kind = param.parameter_type();
    ParameterValue::parse_as(kind, raw).ok_or_else(|| ConfigError::TypeMismatch {
        path: path.to_string(),
        expected: kind,
        actual: format!("'{}'", raw),
    })
}

/// 查找参数并检查可编辑性
fn writable_parameter<'a>(
    tree: &'a ConfigTree,
    path: &str,
    honor_rules: bool,
) -> ConfigResult<&'a Parameter> {
    let param = tree
        .find_parameter(path)
        .ok_or_else(|| ConfigError::UnknownParameter {
            path: path.to_string(),
        })?;

    let rule_editable = !honor_rules
        || parameter_ui_state(tree, path)
            .map(|s| s.editable)
            .unwrap_or(param.editable);

    if !param.editable || !rule_editable {
        tracing::warn!(path = %path, "拒绝修改只读参数");
        return Err(ConfigError::ReadOnly {
            path: path.to_string(),
        });
    }

    Ok(param)
}

/// 类型对齐：INTEGER → FLOAT 拓宽；SELECTABLE 允许用符号名指定选项
fn normalize(param: &Parameter, path: &str, value: ParameterValue) -> ConfigResult<ParameterValue> {
    let kind = param.parameter_type();

    if kind == ParameterType::Selectable {
        if let ParameterValue::Text(raw) = &value {
            if let Some(display) = param.resolve_option(raw) {
                return Ok(ParameterValue::Text(display.to_string()));
            }
        }
    }

    value.coerce_to(kind).ok_or_else(|| ConfigError::TypeMismatch {
        path: path.to_string(),
        expected: kind,
        actual: value.kind_name().to_string(),
    })
}
