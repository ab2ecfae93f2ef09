// ==========================================
// 模型模板参数配置 - 模板加载器
// ==========================================
// 职责: 文档值树 → ParameterGroup/Parameter 内存树
// 红线: 只做结构与类型检查；上下界/选项合法性交给校验器统一报告
// ==========================================

use crate::domain::{
    AutoHpoState, Comparison, ConfigNode, ConfigTree, Constraint, LogicalOperator,
    ModelLifecycle, NodeType, Parameter, ParameterGroup, ParameterType, ParameterValue, Rule,
    RuleExpr, UiAction, UiRules,
};
use crate::domain::group::{is_reserved_key, join_path};
use crate::loader::error::{SchemaError, SchemaResult};
use crate::loader::format::{parse_document, read_document, DocumentFormat};
use serde_yaml::{Mapping, Value};
use std::path::Path;
use std::str::FromStr;

/// 根节点在错误信息中的路径名
const ROOT_PATH: &str = "<root>";

/// 叶子参数上允许出现的字段
const PARAMETER_FIELDS: &[&str] = &[
    "type",
    "header",
    "description",
    "default_value",
    "value",
    "min_value",
    "max_value",
    "enum_name",
    "options",
    "editable",
    "visible_in_ui",
    "affects_outcome_of",
    "warning",
    "ui_rules",
    "auto_hpo_state",
    "auto_hpo_value",
];

// ==========================================
// 公开入口
// ==========================================

/// 从文本加载参数树（YAML；JSON 作为 YAML 子集同样可读）
pub fn load(source: &str) -> SchemaResult<ConfigTree> {
    load_with_format(source, DocumentFormat::Yaml)
}

/// 按指定格式从文本加载参数树
pub fn load_with_format(source: &str, format: DocumentFormat) -> SchemaResult<ConfigTree> {
    let value = parse_document(source, format)?;
    load_value(&value)
}

/// 从文件加载参数树（格式由扩展名决定）
pub fn load_file<P: AsRef<Path>>(path: P) -> SchemaResult<ConfigTree> {
    let path = path.as_ref();
    let (text, format) = read_document(path)?;
    let tree = load_with_format(&text, format)?;

    tracing::info!(
        path = %path.display(),
        format = %format,
        parameters = tree.parameters().len(),
        "参数模板加载完成"
    );
    Ok(tree)
}

/// 从已解析的文档值树构建参数树
pub fn load_value(value: &Value) -> SchemaResult<ConfigTree> {
    let map = as_mapping(value, ROOT_PATH)?;

    let node_type = required_str(map, ROOT_PATH, "type")?;
    match NodeType::from_str(&node_type) {
        Ok(NodeType::ConfigurableParameters) => {}
        _ => return Err(SchemaError::InvalidRootType(node_type)),
    }

    let id = metadata_str(map, ROOT_PATH, "id")?.unwrap_or_default();
    let root = parse_group(map, "")?;

    Ok(ConfigTree { id, root })
}

// ==========================================
// 分组 / 节点
// ==========================================

fn parse_group(map: &Mapping, path: &str) -> SchemaResult<ParameterGroup> {
    let display_path = if path.is_empty() { ROOT_PATH } else { path };

    let header = required_str(map, display_path, "header")?;
    let description = metadata_str(map, display_path, "description")?.unwrap_or_else(|| header.clone());
    let visible_in_ui = metadata_bool(map, display_path, "visible_in_ui")?.unwrap_or(true);

    let mut children = Vec::new();
    for (key, value) in map {
        let key = key.as_str().ok_or_else(|| SchemaError::FieldTypeMismatch {
            path: display_path.to_string(),
            field: "<key>".to_string(),
            expected: "string".to_string(),
            actual: describe(key).to_string(),
        })?;

        // 映射值一律是子节点，即使键名与元数据字段同名（由校验器报告冲突）
        if is_reserved_key(key, path.is_empty()) && !value.is_mapping() {
            continue;
        }

        let child_path = join_path(path, key);
        match value {
            Value::Mapping(child) => {
                let node = parse_node(child, &child_path)?;
                children.push((key.to_string(), node));
            }
            _ => {
                tracing::warn!(path = %child_path, "忽略分组上的未知标量字段");
            }
        }
    }

    Ok(ParameterGroup {
        header,
        description,
        visible_in_ui,
        children,
    })
}

fn parse_node(map: &Mapping, path: &str) -> SchemaResult<ConfigNode> {
    let type_str = required_str(map, path, "type")?;

    if let Ok(node_type) = NodeType::from_str(&type_str) {
        return match node_type {
            NodeType::ParameterGroup => Ok(ConfigNode::Group(parse_group(map, path)?)),
            NodeType::ConfigurableParameters => Err(SchemaError::MisplacedNode {
                path: path.to_string(),
                node_type: type_str,
            }),
        };
    }

    let kind = ParameterType::from_str(&type_str).map_err(|_| SchemaError::InvalidEnumValue {
        path: path.to_string(),
        field: "type".to_string(),
        value: type_str.clone(),
    })?;

    Ok(ConfigNode::Parameter(parse_parameter(map, path, kind)?))
}

// ==========================================
// 叶子参数
// ==========================================

fn parse_parameter(map: &Mapping, path: &str, kind: ParameterType) -> SchemaResult<Parameter> {
    for key in map.keys().filter_map(|k| k.as_str()) {
        if !PARAMETER_FIELDS.contains(&key) {
            tracing::warn!(path = %path, field = %key, "忽略参数上的未知字段");
        }
    }

    let header = required_str(map, path, "header")?;
    let description = optional_str(map, path, "description")?.unwrap_or_default();

    let default_raw = non_null(map, "default_value").ok_or_else(|| SchemaError::MissingField {
        path: path.to_string(),
        field: "default_value",
    })?;
    let default_value = value_for(kind, default_raw, path, "default_value")?;

    let value = match non_null(map, "value") {
        Some(v) => Some(value_for(kind, v, path, "value")?),
        None => None,
    };

    let constraint = match kind {
        ParameterType::Integer => Constraint::Integer {
            min_value: required_i64(map, path, "min_value")?,
            max_value: required_i64(map, path, "max_value")?,
        },
        ParameterType::Float => Constraint::Float {
            min_value: required_f64(map, path, "min_value")?,
            max_value: required_f64(map, path, "max_value")?,
        },
        ParameterType::Boolean => Constraint::Boolean,
        ParameterType::Selectable => Constraint::Selectable {
            enum_name: required_str(map, path, "enum_name")?,
            options: parse_options(map, path)?,
        },
        ParameterType::String => Constraint::Text,
    };

    let affects_outcome_of = match optional_str(map, path, "affects_outcome_of")? {
        Some(s) => parse_enum::<ModelLifecycle>(&s, path, "affects_outcome_of")?,
        None => ModelLifecycle::None,
    };

    let auto_hpo_state = match optional_str(map, path, "auto_hpo_state")? {
        Some(s) => parse_enum::<AutoHpoState>(&s, path, "auto_hpo_state")?,
        None => AutoHpoState::NotPossible,
    };
    let auto_hpo_value = match non_null(map, "auto_hpo_value") {
        Some(v) => Some(value_for(kind, v, path, "auto_hpo_value")?),
        None => None,
    };

    let ui_rules = match non_null(map, "ui_rules") {
        Some(v) => {
            let rules_path = join_path(path, "ui_rules");
            parse_ui_rules(as_mapping(v, &rules_path)?, &rules_path)?
        }
        None => UiRules::default(),
    };

    Ok(Parameter {
        header,
        description,
        constraint,
        default_value,
        value,
        editable: optional_bool(map, path, "editable")?.unwrap_or(true),
        visible_in_ui: optional_bool(map, path, "visible_in_ui")?.unwrap_or(true),
        affects_outcome_of,
        warning: optional_str(map, path, "warning")?,
        ui_rules,
        auto_hpo_state,
        auto_hpo_value,
    })
}

fn parse_options(map: &Mapping, path: &str) -> SchemaResult<Vec<(String, String)>> {
    let raw = non_null(map, "options").ok_or_else(|| SchemaError::MissingField {
        path: path.to_string(),
        field: "options",
    })?;
    let options_path = join_path(path, "options");
    let options = as_mapping(raw, &options_path)?;

    let mut out = Vec::with_capacity(options.len());
    for (k, v) in options {
        let (Some(name), Some(display)) = (k.as_str(), v.as_str()) else {
            return Err(SchemaError::FieldTypeMismatch {
                path: options_path,
                field: "options".to_string(),
                expected: "string -> string".to_string(),
                actual: format!("{} -> {}", describe(k), describe(v)),
            });
        };
        out.push((name.to_string(), display.to_string()));
    }
    Ok(out)
}

/// 按参数类型读取取值字段
fn value_for(kind: ParameterType, v: &Value, path: &str, field: &str) -> SchemaResult<ParameterValue> {
    let parsed = match kind {
        ParameterType::Integer => v.as_i64().map(ParameterValue::Integer),
        ParameterType::Float => v.as_f64().map(ParameterValue::Float),
        ParameterType::Boolean => v.as_bool().map(ParameterValue::Boolean),
        ParameterType::Selectable | ParameterType::String => {
            v.as_str().map(|s| ParameterValue::Text(s.to_string()))
        }
    };

    parsed.ok_or_else(|| SchemaError::FieldTypeMismatch {
        path: path.to_string(),
        field: field.to_string(),
        expected: kind.to_string(),
        actual: describe(v).to_string(),
    })
}

// ==========================================
// UI 规则
// ==========================================

fn parse_ui_rules(map: &Mapping, path: &str) -> SchemaResult<UiRules> {
    if let Some(t) = optional_str(map, path, "type")? {
        if t != "UI_RULES" {
            return Err(SchemaError::InvalidEnumValue {
                path: path.to_string(),
                field: "type".to_string(),
                value: t,
            });
        }
    }

    let action = match optional_str(map, path, "action")? {
        Some(s) => parse_enum::<UiAction>(&s, path, "action")?,
        None => UiAction::default(),
    };
    let operator = match optional_str(map, path, "operator")? {
        Some(s) => parse_enum::<LogicalOperator>(&s, path, "operator")?,
        None => LogicalOperator::default(),
    };

    let mut rules = Vec::new();
    if let Some(raw) = non_null(map, "rules") {
        let seq = raw.as_sequence().ok_or_else(|| SchemaError::FieldTypeMismatch {
            path: path.to_string(),
            field: "rules".to_string(),
            expected: "sequence".to_string(),
            actual: describe(raw).to_string(),
        })?;

        for (idx, entry) in seq.iter().enumerate() {
            let entry_path = format!("{}.rules[{}]", path, idx);
            let entry_map = as_mapping(entry, &entry_path)?;
            rules.push(parse_rule_expr(entry_map, &entry_path)?);
        }
    }

    Ok(UiRules {
        action,
        operator,
        rules,
    })
}

fn parse_rule_expr(map: &Mapping, path: &str) -> SchemaResult<RuleExpr> {
    let is_leaf = match optional_str(map, path, "type")?.as_deref() {
        Some("RULE") => true,
        Some("UI_RULES") => false,
        Some(other) => {
            return Err(SchemaError::InvalidEnumValue {
                path: path.to_string(),
                field: "type".to_string(),
                value: other.to_string(),
            })
        }
        None => map.contains_key("parameter"),
    };

    if !is_leaf {
        return Ok(RuleExpr::Composite(parse_ui_rules(map, path)?));
    }

    let parameter = match non_null(map, "parameter") {
        Some(Value::String(s)) => s.split('.').map(|seg| seg.to_string()).collect(),
        Some(Value::Sequence(seq)) => {
            let mut segments = Vec::with_capacity(seq.len());
            for seg in seq {
                let s = seg.as_str().ok_or_else(|| SchemaError::FieldTypeMismatch {
                    path: path.to_string(),
                    field: "parameter".to_string(),
                    expected: "string".to_string(),
                    actual: describe(seg).to_string(),
                })?;
                segments.push(s.to_string());
            }
            segments
        }
        Some(other) => {
            return Err(SchemaError::FieldTypeMismatch {
                path: path.to_string(),
                field: "parameter".to_string(),
                expected: "sequence".to_string(),
                actual: describe(other).to_string(),
            })
        }
        None => {
            return Err(SchemaError::MissingField {
                path: path.to_string(),
                field: "parameter",
            })
        }
    };

    let operator_str = required_str(map, path, "operator")?;
    let operator = parse_enum::<Comparison>(&operator_str, path, "operator")?;

    let raw_value = non_null(map, "value").ok_or_else(|| SchemaError::MissingField {
        path: path.to_string(),
        field: "value",
    })?;
    let value = scalar_value(raw_value).ok_or_else(|| SchemaError::FieldTypeMismatch {
        path: path.to_string(),
        field: "value".to_string(),
        expected: "scalar".to_string(),
        actual: describe(raw_value).to_string(),
    })?;

    Ok(RuleExpr::Rule(Rule {
        parameter,
        operator,
        value,
    }))
}

/// 无声明类型的标量推断（规则比较值）
fn scalar_value(v: &Value) -> Option<ParameterValue> {
    match v {
        Value::Bool(b) => Some(ParameterValue::Boolean(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(ParameterValue::Integer(i)),
            None => n.as_f64().map(ParameterValue::Float),
        },
        Value::String(s) => Some(ParameterValue::Text(s.clone())),
        _ => None,
    }
}

// ==========================================
// 字段读取辅助函数
// ==========================================

fn as_mapping<'a>(value: &'a Value, path: &str) -> SchemaResult<&'a Mapping> {
    value
        .as_mapping()
        .ok_or_else(|| SchemaError::NotAMapping(path.to_string()))
}

/// 读取字段，null 视为缺失
fn non_null<'a>(map: &'a Mapping, field: &str) -> Option<&'a Value> {
    map.get(field).filter(|v| !v.is_null())
}

fn required_str(map: &Mapping, path: &str, field: &'static str) -> SchemaResult<String> {
    optional_str(map, path, field)?.ok_or_else(|| SchemaError::MissingField {
        path: path.to_string(),
        field,
    })
}

fn optional_str(map: &Mapping, path: &str, field: &str) -> SchemaResult<Option<String>> {
    match non_null(map, field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(SchemaError::FieldTypeMismatch {
            path: path.to_string(),
            field: field.to_string(),
            expected: "string".to_string(),
            actual: describe(other).to_string(),
        }),
    }
}

/// 分组元数据字段；映射值属于同名子节点，视为未设置
fn metadata_str(map: &Mapping, path: &str, field: &str) -> SchemaResult<Option<String>> {
    match map.get(field) {
        Some(Value::Mapping(_)) => Ok(None),
        _ => optional_str(map, path, field),
    }
}

fn metadata_bool(map: &Mapping, path: &str, field: &str) -> SchemaResult<Option<bool>> {
    match map.get(field) {
        Some(Value::Mapping(_)) => Ok(None),
        _ => optional_bool(map, path, field),
    }
}

fn optional_bool(map: &Mapping, path: &str, field: &str) -> SchemaResult<Option<bool>> {
    match non_null(map, field) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(SchemaError::FieldTypeMismatch {
            path: path.to_string(),
            field: field.to_string(),
            expected: "boolean".to_string(),
            actual: describe(other).to_string(),
        }),
    }
}

fn required_i64(map: &Mapping, path: &str, field: &'static str) -> SchemaResult<i64> {
    let v = non_null(map, field).ok_or_else(|| SchemaError::MissingField {
        path: path.to_string(),
        field,
    })?;
    v.as_i64().ok_or_else(|| SchemaError::FieldTypeMismatch {
        path: path.to_string(),
        field: field.to_string(),
        expected: ParameterType::Integer.to_string(),
        actual: describe(v).to_string(),
    })
}

fn required_f64(map: &Mapping, path: &str, field: &'static str) -> SchemaResult<f64> {
    let v = non_null(map, field).ok_or_else(|| SchemaError::MissingField {
        path: path.to_string(),
        field,
    })?;
    v.as_f64().ok_or_else(|| SchemaError::FieldTypeMismatch {
        path: path.to_string(),
        field: field.to_string(),
        expected: ParameterType::Float.to_string(),
        actual: describe(v).to_string(),
    })
}

fn parse_enum<T: FromStr>(raw: &str, path: &str, field: &str) -> SchemaResult<T> {
    T::from_str(raw).map_err(|_| SchemaError::InvalidEnumValue {
        path: path.to_string(),
        field: field.to_string(),
        value: raw.to_string(),
    })
}

fn describe(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged",
    }
}
