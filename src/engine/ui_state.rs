// ==========================================
// 模型模板参数配置 - UI 状态求值
// ==========================================
// 职责: 根据各参数的 ui_rules 与当前生效值，计算界面上的可编辑/可见状态
// 规则: 规则成立时执行 action；空规则集不改变静态标记
// ==========================================

use crate::domain::{ConfigTree, Parameter, UiAction, PATH_SEPARATOR};
use serde::Serialize;
use std::collections::BTreeMap;

/// 单个参数的界面状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UiState {
    pub editable: bool,
    pub visible: bool,
}

/// 计算全部参数的界面状态（按路径排序）
pub fn evaluate_ui_state(tree: &ConfigTree) -> BTreeMap<String, UiState> {
    tree.parameters()
        .into_iter()
        .map(|(path, param)| {
            let state = state_of(tree, &path, param);
            (path, state)
        })
        .collect()
}

/// 计算单个参数的界面状态
pub fn parameter_ui_state(tree: &ConfigTree, path: &str) -> Option<UiState> {
    let param = tree.find_parameter(path)?;
    Some(state_of(tree, path, param))
}

fn state_of(tree: &ConfigTree, path: &str, param: &Parameter) -> UiState {
    let mut state = UiState {
        editable: param.editable,
        visible: param.visible_in_ui && ancestors_visible(tree, path),
    };

    let lookup = |p: &str| tree.effective_value(p);
    if param.ui_rules.evaluate(&lookup) {
        tracing::debug!(path = %path, action = %param.ui_rules.action, "UI 规则触发");
        match param.ui_rules.action {
            UiAction::DisableEditing => state.editable = false,
            UiAction::EnableEditing => state.editable = true,
            UiAction::Hide => state.visible = false,
            UiAction::Show => state.visible = true,
        }
    }

    state
}

/// 参数所在的各级分组是否都可见
fn ancestors_visible(tree: &ConfigTree, path: &str) -> bool {
    let mut prefix = String::new();
    let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();

    // 最后一段是参数本身
    for segment in &segments[..segments.len().saturating_sub(1)] {
        if !prefix.is_empty() {
            prefix.push(PATH_SEPARATOR);
        }
        prefix.push_str(segment);
        match tree.find_group(&prefix) {
            Some(g) if !g.visible_in_ui => return false,
            _ => {}
        }
    }
    tree.root.visible_in_ui
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Comparison, LogicalOperator, Parameter, ParameterGroup, Rule, UiRules};

    fn tree() -> ConfigTree {
        let disable_when_off = UiRules::new(UiAction::DisableEditing, LogicalOperator::And)
            .with_rule(Rule::new(&["nncf", "enable_pruning"], Comparison::EqualTo, false));
        let show_when_on = UiRules::new(UiAction::Show, LogicalOperator::Or)
            .with_rule(Rule::new(&["nncf", "enable_pruning"], Comparison::EqualTo, true));

        let nncf = ParameterGroup::new("NNCF")
            .with_child("enable_pruning", Parameter::boolean("Enable pruning", false))
            .with_child(
                "pruning_rate",
                Parameter::float("Pruning rate", 0.1, 0.0, 1.0).with_ui_rules(disable_when_off),
            )
            .with_child(
                "pruning_steps",
                Parameter::integer("Pruning steps", 10, 1, 100)
                    .hidden()
                    .with_ui_rules(show_when_on),
            );
        let internal = ParameterGroup::new("Internal")
            .hidden()
            .with_child("seed", Parameter::integer("Seed", 0, 0, 1000));

        ConfigTree::new(
            "",
            ParameterGroup::new("Root")
                .with_child("nncf", nncf)
                .with_child("internal", internal),
        )
    }

    #[test]
    fn test_rules_follow_live_values() {
        let mut tree = tree();
        let state = evaluate_ui_state(&tree);
        assert!(!state["nncf.pruning_rate"].editable);
        assert!(!state["nncf.pruning_steps"].visible);
        assert!(state["nncf.enable_pruning"].editable);

        tree.find_parameter_mut("nncf.enable_pruning").unwrap().value = Some(true.into());
        let state = evaluate_ui_state(&tree);
        assert!(state["nncf.pruning_rate"].editable);
        assert!(state["nncf.pruning_steps"].visible);
    }

    #[test]
    fn test_hidden_group_hides_children() {
        let tree = tree();
        assert_eq!(
            parameter_ui_state(&tree, "internal.seed"),
            Some(UiState {
                editable: true,
                visible: false
            })
        );
        assert_eq!(parameter_ui_state(&tree, "internal.missing"), None);
    }
}
