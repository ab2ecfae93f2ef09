// ==========================================
// 模型模板参数配置 - 参数树校验器
// ==========================================
// 职责: 对整棵参数树做一次完整校验，返回全部违规（不在第一处停止）
// 检查项:
// 1. 键名合法（非空、不含路径分隔符、不与分组元数据字段同名）且路径唯一
// 2. INTEGER/FLOAT: 上下界有序，默认值与当前值在 [min_value, max_value] 内
// 3. SELECTABLE: 选项非空，默认值与当前值属于选项显示值
// 4. UI 规则引用的参数必须存在
// ==========================================

use crate::domain::{
    ConfigNode, ConfigTree, Constraint, Parameter, ParameterGroup, ParameterValue, PATH_SEPARATOR,
};
use crate::domain::group::{is_reserved_key, join_path};
use crate::engine::error::{ConfigError, ConfigResult, Violation, ViolationKind};
use std::collections::HashSet;

/// 校验整棵参数树
///
/// # 返回
/// - 空列表: 校验通过
/// - 非空列表: 全部违规，按文档顺序排列
pub fn validate(tree: &ConfigTree) -> Vec<Violation> {
    let mut violations = Vec::new();

    // 1. 键名与路径
    let mut seen_paths = HashSet::new();
    check_keys(&tree.root, "", &mut seen_paths, &mut violations);

    // 2/3. 参数约束
    for (path, param) in tree.parameters() {
        check_parameter(&path, param, &mut violations);
    }

    // 4. UI 规则引用
    for (path, param) in tree.parameters() {
        for referenced in param.ui_rules.referenced_paths() {
            if tree.find_parameter(&referenced).is_none() {
                violations.push(
                    Violation::new(
                        ViolationKind::DanglingRuleReference,
                        &path,
                        "ui_rules",
                        format!("UI 规则引用了不存在的参数: {}", referenced),
                    )
                    .with_details(serde_json::json!({ "parameter": referenced })),
                );
            }
        }
    }

    if violations.is_empty() {
        tracing::debug!(template_id = %tree.id, "参数树校验通过");
    } else {
        tracing::warn!(
            template_id = %tree.id,
            count = violations.len(),
            "参数树校验发现违规"
        );
    }

    violations
}

/// 校验并在存在违规时返回汇总错误（ValidationError）
pub fn ensure_valid(tree: &ConfigTree) -> ConfigResult<()> {
    let violations = validate(tree);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation { violations })
    }
}

fn check_keys(
    group: &ParameterGroup,
    prefix: &str,
    seen_paths: &mut HashSet<String>,
    violations: &mut Vec<Violation>,
) {
    for (key, node) in &group.children {
        let path = join_path(prefix, key);

        if key.trim().is_empty() || key.contains(PATH_SEPARATOR) {
            violations.push(Violation::new(
                ViolationKind::InvalidKey,
                &path,
                "<key>",
                format!("键名不能为空且不能包含 '{}': '{}'", PATH_SEPARATOR, key),
            ));
        }

        if is_reserved_key(key, prefix.is_empty()) {
            violations.push(Violation::new(
                ViolationKind::ReservedKey,
                &path,
                "<key>",
                format!("键名与分组元数据字段冲突: '{}'", key),
            ));
        }

        if !seen_paths.insert(path.clone()) {
            violations.push(Violation::new(
                ViolationKind::DuplicatePath,
                &path,
                "<key>",
                format!("路径重复: {}", path),
            ));
        }

        if let ConfigNode::Group(child) = node {
            check_keys(child, &path, seen_paths, violations);
        }
    }
}

fn check_parameter(path: &str, param: &Parameter, violations: &mut Vec<Violation>) {
    match &param.constraint {
        Constraint::Integer {
            min_value,
            max_value,
        } if min_value > max_value => {
            violations.push(inverted_bounds(
                path,
                ParameterValue::Integer(*min_value),
                ParameterValue::Integer(*max_value),
            ));
            return;
        }
        Constraint::Float {
            min_value,
            max_value,
        } if !(min_value <= max_value) => {
            violations.push(inverted_bounds(
                path,
                ParameterValue::Float(*min_value),
                ParameterValue::Float(*max_value),
            ));
            return;
        }
        Constraint::Selectable { options, .. } if options.is_empty() => {
            violations.push(Violation::new(
                ViolationKind::EmptyOptions,
                path,
                "options",
                "可选项列表为空".to_string(),
            ));
            return;
        }
        _ => {}
    }

    if let Err(breach) = param.check(&param.default_value) {
        violations.push(Violation::from_breach(path, "default_value", &breach));
    }

    if let Some(value) = &param.value {
        if let Err(breach) = param.check(value) {
            violations.push(Violation::from_breach(path, "value", &breach));
        }
    }
}

fn inverted_bounds(path: &str, min: ParameterValue, max: ParameterValue) -> Violation {
    Violation::new(
        ViolationKind::InvertedBounds,
        path,
        "min_value",
        format!("下界 {} 大于上界 {}", min, max),
    )
    .with_details(serde_json::json!({ "min_value": min, "max_value": max }))
}
