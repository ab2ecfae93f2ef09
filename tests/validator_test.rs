// ==========================================
// 参数树校验集成测试
// ==========================================

mod test_helpers;

use ote_config::engine::{ensure_valid, to_external_args, validate, ConfigError, ViolationKind};
use ote_config::loader::load;
use test_helpers::*;

#[test]
fn test_示例模板校验通过() {
    let tree = stfpm_tree();
    assert!(validate(&tree).is_empty());
    assert!(ensure_valid(&tree).is_ok());
}

#[test]
fn test_文档中的越界值可加载但校验失败() {
    let doc = STFPM_YAML.replace(
        "    default_value: 300\n",
        "    default_value: 300\n    value: 5000\n",
    );
    let tree = load(&doc).expect("越界值不是加载错误");

    let violations = validate(&tree);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].violation_type, ViolationKind::OutOfRange);
    assert_eq!(violations[0].path, "pot_parameters.stat_subset_size");
    assert_eq!(violations[0].field, "value");

    match to_external_args(&tree) {
        Err(ConfigError::Validation { violations }) => assert_eq!(violations.len(), 1),
        other => panic!("导出前必须整体校验, 实际: {:?}", other),
    }
}

#[test]
fn test_收集全部违规() {
    let doc = STFPM_YAML
        .replace("    default_value: Performance\n", "    default_value: Accuracy\n")
        .replace("    default_value: 8\n", "    default_value: 99\n");
    let tree = load(&doc).expect("加载失败");

    let kinds: Vec<ViolationKind> = validate(&tree).into_iter().map(|v| v.violation_type).collect();
    assert_eq!(kinds, vec![ViolationKind::OutOfRange, ViolationKind::InvalidOption]);
}

#[test]
fn test_规则引用不存在的参数() {
    let doc = STFPM_YAML.replace(
        "      rules: []\n",
        "      rules:\n        - parameter: [dataset, missing]\n          operator: EQUAL_TO\n          value: 1\n",
    );
    let tree = load(&doc).expect("加载失败");
    let violations = validate(&tree);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].violation_type, ViolationKind::DanglingRuleReference);
    assert_eq!(violations[0].path, "dataset.train_batch_size");
}
