// ==========================================
// 模型模板参数配置 - 模板序列化
// ==========================================
// 职责: 内存树 → 文档值树 → YAML/JSON 文本
// 说明: 输出可被 schema_loader 重新加载（load(serialize(tree)) 语义不变）
// ==========================================

use crate::domain::group::{is_reserved_key, join_path};
use crate::domain::{
    ConfigNode, ConfigTree, Constraint, NodeType, Parameter, ParameterGroup, ParameterValue,
    RuleExpr, UiRules,
};
use crate::loader::error::{SchemaError, SchemaResult};
use crate::loader::format::DocumentFormat;
use serde_yaml::{Mapping, Value};

/// 将参数树序列化为文本
pub fn serialize(tree: &ConfigTree, format: DocumentFormat) -> SchemaResult<String> {
    let value = to_document_value(tree)?;
    match format {
        DocumentFormat::Yaml => {
            serde_yaml::to_string(&value).map_err(|e| SchemaError::SerializeError(e.to_string()))
        }
        DocumentFormat::Json => serde_json::to_string_pretty(&value)
            .map_err(|e| SchemaError::SerializeError(e.to_string())),
    }
}

/// 将参数树转换为文档值树
///
/// 子节点键名与分组元数据字段同名时返回 ReservedKey（输出将无法无歧义地重新加载）
pub fn to_document_value(tree: &ConfigTree) -> SchemaResult<Value> {
    let mut map = Mapping::new();
    insert(&mut map, "type", NodeType::ConfigurableParameters.as_str());
    insert(&mut map, "id", tree.id.as_str());
    write_group_body(&mut map, &tree.root, "")?;
    Ok(Value::Mapping(map))
}

fn write_group_body(map: &mut Mapping, group: &ParameterGroup, path: &str) -> SchemaResult<()> {
    insert(map, "header", group.header.as_str());
    insert(map, "description", group.description.as_str());
    insert(map, "visible_in_ui", group.visible_in_ui);

    for (key, node) in &group.children {
        let child_path = join_path(path, key);
        if is_reserved_key(key, path.is_empty()) {
            return Err(SchemaError::ReservedKey { path: child_path });
        }

        let child = match node {
            ConfigNode::Group(g) => {
                let mut m = Mapping::new();
                insert(&mut m, "type", NodeType::ParameterGroup.as_str());
                write_group_body(&mut m, g, &child_path)?;
                Value::Mapping(m)
            }
            ConfigNode::Parameter(p) => parameter_value(p),
        };
        map.insert(Value::String(key.clone()), child);
    }
    Ok(())
}

fn parameter_value(p: &Parameter) -> Value {
    let mut m = Mapping::new();
    insert(&mut m, "type", p.parameter_type().as_str());
    insert(&mut m, "header", p.header.as_str());
    insert(&mut m, "description", p.description.as_str());
    m.insert(key("default_value"), scalar(&p.default_value));
    m.insert(
        key("value"),
        p.value.as_ref().map(scalar).unwrap_or(Value::Null),
    );

    match &p.constraint {
        Constraint::Integer {
            min_value,
            max_value,
        } => {
            insert(&mut m, "min_value", *min_value);
            insert(&mut m, "max_value", *max_value);
        }
        Constraint::Float {
            min_value,
            max_value,
        } => {
            insert(&mut m, "min_value", *min_value);
            insert(&mut m, "max_value", *max_value);
        }
        Constraint::Selectable { enum_name, options } => {
            insert(&mut m, "enum_name", enum_name.as_str());
            let mut opts = Mapping::new();
            for (name, display) in options {
                opts.insert(Value::String(name.clone()), Value::String(display.clone()));
            }
            m.insert(key("options"), Value::Mapping(opts));
        }
        Constraint::Boolean | Constraint::Text => {}
    }

    insert(&mut m, "editable", p.editable);
    insert(&mut m, "visible_in_ui", p.visible_in_ui);
    insert(&mut m, "affects_outcome_of", p.affects_outcome_of.as_str());
    m.insert(
        key("warning"),
        p.warning
            .as_ref()
            .map(|w| Value::String(w.clone()))
            .unwrap_or(Value::Null),
    );
    insert(&mut m, "auto_hpo_state", p.auto_hpo_state.as_str());
    m.insert(
        key("auto_hpo_value"),
        p.auto_hpo_value.as_ref().map(scalar).unwrap_or(Value::Null),
    );
    m.insert(key("ui_rules"), ui_rules_value(&p.ui_rules));

    Value::Mapping(m)
}

fn ui_rules_value(rules: &UiRules) -> Value {
    let mut m = Mapping::new();
    insert(&mut m, "type", "UI_RULES");
    insert(&mut m, "action", rules.action.as_str());
    insert(&mut m, "operator", rules.operator.as_str());

    let entries = rules
        .rules
        .iter()
        .map(|expr| match expr {
            RuleExpr::Composite(group) => ui_rules_value(group),
            RuleExpr::Rule(rule) => {
                let mut r = Mapping::new();
                insert(&mut r, "type", "RULE");
                r.insert(
                    key("parameter"),
                    Value::Sequence(
                        rule.parameter
                            .iter()
                            .map(|s| Value::String(s.clone()))
                            .collect(),
                    ),
                );
                insert(&mut r, "operator", rule.operator.as_str());
                r.insert(key("value"), scalar(&rule.value));
                Value::Mapping(r)
            }
        })
        .collect();
    m.insert(key("rules"), Value::Sequence(entries));

    Value::Mapping(m)
}

/// 参数取值 → 文档标量
pub fn scalar(v: &ParameterValue) -> Value {
    match v {
        ParameterValue::Boolean(b) => Value::Bool(*b),
        ParameterValue::Integer(i) => Value::Number((*i).into()),
        ParameterValue::Float(f) => Value::Number((*f).into()),
        ParameterValue::Text(s) => Value::String(s.clone()),
    }
}

fn key(k: &str) -> Value {
    Value::String(k.to_string())
}

fn insert<V: Into<Value>>(map: &mut Mapping, k: &str, v: V) {
    map.insert(key(k), v.into());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Comparison, LogicalOperator, Rule, UiAction};
    use crate::loader::schema_loader::{load, load_with_format};

    fn sample_tree() -> ConfigTree {
        let rules = UiRules::new(UiAction::Hide, LogicalOperator::Or).with_rule(Rule::new(
            &["pot_parameters", "preset"],
            Comparison::EqualTo,
            "Mixed",
        ));
        let pot = ParameterGroup::new("POT Parameters")
            .with_child(
                "preset",
                Parameter::selectable(
                    "Preset",
                    "POTQuantizationPreset",
                    &[("MIXED", "Mixed"), ("PERFORMANCE", "Performance")],
                    "Performance",
                ),
            )
            .with_child(
                "stat_subset_size",
                Parameter::integer("Number of data samples", 300, 1, 1000)
                    .with_value(500i64)
                    .with_ui_rules(rules),
            )
            .with_child(
                "max_drop",
                Parameter::float("Maximal accuracy drop", 0.01, 0.0, 1.0),
            );
        ConfigTree::new("stfpm", ParameterGroup::new("Configuration").with_child("pot_parameters", pot))
    }

    #[test]
    fn test_yaml_roundtrip() {
        let tree = sample_tree();
        let text = serialize(&tree, DocumentFormat::Yaml).unwrap();
        assert!(text.contains("type: CONFIGURABLE_PARAMETERS"));

        let reloaded = load(&text).unwrap();
        assert_eq!(reloaded, tree);
    }

    #[test]
    fn test_json_roundtrip() {
        let tree = sample_tree();
        let text = serialize(&tree, DocumentFormat::Json).unwrap();
        let reloaded = load_with_format(&text, DocumentFormat::Json).unwrap();
        assert_eq!(reloaded, tree);
    }

    #[test]
    fn test_document_key_order() {
        let value = to_document_value(&sample_tree()).unwrap();
        let keys: Vec<&str> = value
            .as_mapping()
            .unwrap()
            .keys()
            .filter_map(|k| k.as_str())
            .collect();
        assert_eq!(
            keys,
            vec!["type", "id", "header", "description", "visible_in_ui", "pot_parameters"]
        );
    }

    #[test]
    fn test_reserved_child_key_rejected() {
        let tree = ConfigTree::new(
            "t",
            ParameterGroup::new("Root").with_child(
                "g",
                ParameterGroup::new("G")
                    .with_child("description", Parameter::integer("D", 1, 0, 10)),
            ),
        );
        assert!(matches!(
            serialize(&tree, DocumentFormat::Yaml),
            Err(SchemaError::ReservedKey { path }) if path == "g.description"
        ));
    }

    #[test]
    fn test_nested_id_key_roundtrip() {
        let tree = ConfigTree::new(
            "",
            ParameterGroup::new("Root").with_child(
                "g",
                ParameterGroup::new("G").with_child("id", Parameter::integer("Id", 1, 0, 10)),
            ),
        );
        let text = serialize(&tree, DocumentFormat::Yaml).unwrap();
        assert_eq!(load(&text).unwrap(), tree);
    }
}
