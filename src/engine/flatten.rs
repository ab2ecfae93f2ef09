// ==========================================
// 模型模板参数配置 - 外部训练参数导出
// ==========================================
// 职责: 校验通过的参数树 → 外部训练/优化进程所需的键值形式
// 规则: 无覆写的叶子取默认值；存在任何违规则拒绝导出
// ==========================================

use crate::domain::{ConfigNode, ConfigTree, ParameterGroup, ParameterValue};
use crate::engine::error::ConfigResult;
use crate::engine::validator::ensure_valid;
use std::collections::BTreeMap;

/// 扁平参数表：点分路径 → 生效值
pub type ExternalArgs = BTreeMap<String, ParameterValue>;

/// 扁平导出（dataset.train_batch_size → 32）
pub fn to_external_args(tree: &ConfigTree) -> ConfigResult<ExternalArgs> {
    ensure_valid(tree)?;

    let args: ExternalArgs = tree
        .parameters()
        .into_iter()
        .map(|(path, p)| (path, p.effective_value().clone()))
        .collect();

    tracing::debug!(template_id = %tree.id, count = args.len(), "导出外部训练参数");
    Ok(args)
}

/// 嵌套导出（仅取值，保留分组层级）
pub fn to_nested_values(tree: &ConfigTree) -> ConfigResult<serde_json::Value> {
    ensure_valid(tree)?;
    Ok(group_values(&tree.root))
}

fn group_values(group: &ParameterGroup) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for (key, node) in &group.children {
        let value = match node {
            ConfigNode::Group(g) => group_values(g),
            ConfigNode::Parameter(p) => json_scalar(p.effective_value()),
        };
        map.insert(key.clone(), value);
    }
    serde_json::Value::Object(map)
}

fn json_scalar(v: &ParameterValue) -> serde_json::Value {
    match v {
        ParameterValue::Boolean(b) => serde_json::Value::Bool(*b),
        ParameterValue::Integer(i) => serde_json::Value::from(*i),
        ParameterValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ParameterValue::Text(s) => serde_json::Value::String(s.clone()),
    }
}
