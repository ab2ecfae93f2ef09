// ==========================================
// ConfigApi 集成测试
// ==========================================
// 测试范围:
// 1. 覆写持久化: update_parameter, reset_parameter, load_with_overrides
// 2. 审计: 操作人/原因校验, list_history
// 3. 快照: get_snapshot, restore_snapshot
// 4. 失效覆写: 模板变更后加载失败
// ==========================================

mod test_helpers;

use ote_config::api::ApiError;
use ote_config::domain::{OverrideAction, ParameterValue};
use ote_config::engine::ConfigError;
use test_helpers::*;

// ==========================================
// 覆写持久化
// ==========================================

#[test]
fn test_覆写后重新加载仍然生效() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let mut tree = env
        .api
        .load_with_overrides(&env.template_path, None)
        .expect("加载失败");
    assert_eq!(tree.id, "stfpm");

    let applied = env
        .api
        .update_parameter(&mut tree, "dataset.train_batch_size", 64i64.into(), "alice", "加大批量")
        .expect("覆写失败");
    assert_eq!(applied.previous, None);
    assert!(applied.warning.is_some());
    assert_eq!(
        tree.effective_value("dataset.train_batch_size"),
        Some(ParameterValue::Integer(64))
    );

    let api = env.reopen().expect("无法重新打开");
    let reloaded = api
        .load_with_overrides(&env.template_path, None)
        .expect("重新加载失败");
    assert_eq!(reloaded, tree);

    let args = api.export_args(&reloaded).expect("导出失败");
    assert_eq!(args["dataset.train_batch_size"], ParameterValue::Integer(64));
}

#[test]
fn test_覆写失败时树与库均不变() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let mut tree = env
        .api
        .load_with_overrides(&env.template_path, None)
        .expect("加载失败");
    let before = tree.clone();

    let err = env
        .api
        .update_parameter(&mut tree, "dataset.train_batch_size", 600i64.into(), "alice", "试试")
        .unwrap_err();
    assert!(matches!(err, ApiError::Config(ConfigError::OutOfRange { .. })));

    let err = env
        .api
        .update_parameter(
            &mut tree,
            "nncf_optimization.pruning_supported",
            true.into(),
            "alice",
            "试试",
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::Config(ConfigError::ReadOnly { .. })));

    assert_eq!(tree, before);
    assert_eq!(env.api.get_snapshot("stfpm").expect("快照失败"), "{}");
    assert!(env.api.list_history("stfpm", None).expect("查询失败").is_empty());
}

#[test]
fn test_恢复默认值() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let mut tree = env
        .api
        .load_with_overrides(&env.template_path, None)
        .expect("加载失败");

    env.api
        .update_parameter(&mut tree, "dataset.num_workers", 4i64.into(), "alice", "内存不足")
        .expect("覆写失败");

    let old = env
        .api
        .reset_parameter(&mut tree, "dataset.num_workers", "bob", "恢复")
        .expect("恢复失败");
    assert_eq!(old, Some(ParameterValue::Integer(4)));
    assert_eq!(
        tree.effective_value("dataset.num_workers"),
        Some(ParameterValue::Integer(8))
    );

    // 再次恢复: 无覆写，不记日志
    let again = env
        .api
        .reset_parameter(&mut tree, "dataset.num_workers", "bob", "恢复")
        .expect("恢复失败");
    assert_eq!(again, None);

    let history = env.api.list_history("stfpm", None).expect("查询失败");
    let actions: Vec<OverrideAction> = history.iter().map(|l| l.action).collect();
    assert_eq!(actions, vec![OverrideAction::Reset, OverrideAction::Set]);
    assert_eq!(history[0].actor, "bob");
    assert_eq!(history[1].reason, "内存不足");
}

// ==========================================
// 审计
// ==========================================

#[test]
fn test_操作人与原因必填() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let mut tree = env
        .api
        .load_with_overrides(&env.template_path, None)
        .expect("加载失败");

    assert!(matches!(
        env.api
            .update_parameter(&mut tree, "dataset.num_workers", 4i64.into(), "  ", "原因"),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        env.api.reset_parameter(&mut tree, "dataset.num_workers", "alice", ""),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        env.api.list_history("stfpm", Some(0)),
        Err(ApiError::InvalidInput(_))
    ));
}

#[test]
fn test_显式模板id隔离覆写() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let mut custom = env
        .api
        .load_with_overrides(&env.template_path, Some("stfpm-experiment"))
        .expect("加载失败");
    assert_eq!(custom.id, "stfpm-experiment");

    env.api
        .update_parameter(&mut custom, "pot_parameters.preset", "MIXED".into(), "alice", "实验")
        .expect("覆写失败");

    let default = env
        .api
        .load_with_overrides(&env.template_path, None)
        .expect("加载失败");
    assert_eq!(
        default.effective_value("pot_parameters.preset"),
        Some(ParameterValue::Text("Performance".to_string()))
    );
    assert_eq!(
        env.api.get_snapshot("stfpm-experiment").expect("快照失败"),
        "{\n  \"pot_parameters.preset\": \"Mixed\"\n}"
    );
}

// ==========================================
// 快照
// ==========================================

#[test]
fn test_快照导出与恢复() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let mut tree = env
        .api
        .load_with_overrides(&env.template_path, None)
        .expect("加载失败");

    env.api
        .update_parameter(&mut tree, "dataset.train_batch_size", 64i64.into(), "alice", "a")
        .expect("覆写失败");
    env.api
        .update_parameter(&mut tree, "learning_parameters.lr", 0.1f64.into(), "alice", "b")
        .expect("覆写失败");
    let snapshot = env.api.get_snapshot("stfpm").expect("快照失败");

    env.api
        .update_parameter(&mut tree, "dataset.num_workers", 2i64.into(), "alice", "c")
        .expect("覆写失败");
    env.api
        .reset_parameter(&mut tree, "dataset.train_batch_size", "alice", "d")
        .expect("恢复失败");

    let restored = env
        .api
        .restore_snapshot(&mut tree, &snapshot, "carol", "回到快照")
        .expect("恢复快照失败");
    assert_eq!(restored, 2);
    assert_eq!(
        tree.effective_value("dataset.train_batch_size"),
        Some(ParameterValue::Integer(64))
    );
    assert_eq!(
        tree.effective_value("dataset.num_workers"),
        Some(ParameterValue::Integer(8))
    );
    assert_eq!(env.api.get_snapshot("stfpm").expect("快照失败"), snapshot);

    let restore_logs: Vec<String> = env
        .api
        .list_history("stfpm", None)
        .expect("查询失败")
        .into_iter()
        .filter(|l| l.action == OverrideAction::Restore)
        .map(|l| l.path)
        .collect();
    assert_eq!(restore_logs.len(), 2);
    assert!(restore_logs.contains(&"dataset.num_workers".to_string()));
    assert!(restore_logs.contains(&"dataset.train_batch_size".to_string()));
}

#[test]
fn test_非法快照整体拒绝() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let mut tree = env
        .api
        .load_with_overrides(&env.template_path, None)
        .expect("加载失败");
    env.api
        .update_parameter(&mut tree, "dataset.num_workers", 4i64.into(), "alice", "a")
        .expect("覆写失败");
    let before = tree.clone();

    let bad = r#"{"dataset.train_batch_size": 64, "dataset.num_workers": 100}"#;
    assert!(matches!(
        env.api.restore_snapshot(&mut tree, bad, "carol", "x"),
        Err(ApiError::Config(ConfigError::OutOfRange { .. }))
    ));
    assert!(matches!(
        env.api.restore_snapshot(&mut tree, "not json", "carol", "x"),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        env.api.restore_snapshot(&mut tree, r#"{"nncf_optimization.pruning_supported": true}"#, "carol", "x"),
        Err(ApiError::Config(ConfigError::ReadOnly { .. }))
    ));

    assert_eq!(tree, before);
    assert_eq!(
        env.api.get_snapshot("stfpm").expect("快照失败"),
        "{\n  \"dataset.num_workers\": 4\n}"
    );
}

// ==========================================
// 失效覆写
// ==========================================

#[test]
fn test_模板收紧后失效覆写导致加载失败() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let mut tree = env
        .api
        .load_with_overrides(&env.template_path, None)
        .expect("加载失败");
    env.api
        .update_parameter(&mut tree, "dataset.train_batch_size", 256i64.into(), "alice", "a")
        .expect("覆写失败");

    // 模板把上界收紧到 128
    let tightened = STFPM_YAML.replace("    max_value: 512\n", "    max_value: 128\n");
    write_template(env.dir.path(), "configuration.yaml", &tightened);

    match env.api.load_with_overrides(&env.template_path, None) {
        Err(ApiError::StaleOverride { path, source, .. }) => {
            assert_eq!(path, "dataset.train_batch_size");
            assert!(matches!(source, ConfigError::OutOfRange { .. }));
        }
        other => panic!("应返回 StaleOverride, 实际: {:?}", other.map(|t| t.id)),
    }

    // 不叠加覆写时仍可加载
    assert!(env.api.load_template(&env.template_path, None).is_ok());
}

#[test]
fn test_模板锁定参数后仍可清除残留覆写() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let mut tree = env
        .api
        .load_with_overrides(&env.template_path, None)
        .expect("加载失败");
    env.api
        .update_parameter(&mut tree, "dataset.num_workers", 4i64.into(), "alice", "a")
        .expect("覆写失败");

    // 模板把 num_workers 改为只读
    let locked = STFPM_YAML.replace(
        "    affects_outcome_of: NONE\n    editable: true\n    visible_in_ui: true\n\nlearning_parameters:",
        "    affects_outcome_of: NONE\n    editable: false\n    visible_in_ui: true\n\nlearning_parameters:",
    );
    assert_ne!(locked, STFPM_YAML);
    write_template(env.dir.path(), "configuration.yaml", &locked);
    assert!(matches!(
        env.api.load_with_overrides(&env.template_path, None),
        Err(ApiError::StaleOverride { source: ConfigError::ReadOnly { .. }, .. })
    ));

    let mut tree = env.api.load_template(&env.template_path, None).expect("加载失败");
    let old = env
        .api
        .reset_parameter(&mut tree, "dataset.num_workers", "bob", "清除失效覆写")
        .expect("清除失败");
    assert_eq!(old, Some(ParameterValue::Integer(4)));

    let reloaded = env
        .api
        .load_with_overrides(&env.template_path, None)
        .expect("清除后应可正常加载");
    assert_eq!(
        reloaded.effective_value("dataset.num_workers"),
        Some(ParameterValue::Integer(8))
    );

    let history = env.api.list_history("stfpm", None).expect("查询失败");
    assert_eq!(history[0].action, OverrideAction::Reset);
    assert_eq!(history[0].old_value, Some(ParameterValue::Integer(4)));

    // 库中已无覆写时，只读参数仍拒绝 reset
    assert!(matches!(
        env.api.reset_parameter(&mut tree, "dataset.num_workers", "bob", "again"),
        Err(ApiError::Config(ConfigError::ReadOnly { .. }))
    ));
}

#[test]
fn test_模板删除参数后仍可清除残留覆写() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let mut tree = env
        .api
        .load_with_overrides(&env.template_path, None)
        .expect("加载失败");
    env.api
        .update_parameter(&mut tree, "dataset.num_workers", 4i64.into(), "alice", "a")
        .expect("覆写失败");

    // 模板删除 num_workers
    let start = STFPM_YAML.find("  num_workers:\n").expect("模板缺少 num_workers");
    let end = STFPM_YAML.find("learning_parameters:\n").expect("模板缺少 learning_parameters");
    let removed = format!("{}{}", &STFPM_YAML[..start], &STFPM_YAML[end..]);
    write_template(env.dir.path(), "configuration.yaml", &removed);
    assert!(matches!(
        env.api.load_with_overrides(&env.template_path, None),
        Err(ApiError::StaleOverride { source: ConfigError::UnknownParameter { .. }, .. })
    ));

    let mut tree = env.api.load_template(&env.template_path, None).expect("加载失败");
    let before = tree.clone();
    assert_eq!(
        env.api
            .reset_parameter(&mut tree, "dataset.num_workers", "bob", "清除失效覆写")
            .expect("清除失败"),
        Some(ParameterValue::Integer(4))
    );
    assert_eq!(tree, before);
    assert!(env.api.load_with_overrides(&env.template_path, None).is_ok());
    assert_eq!(env.api.get_snapshot("stfpm").expect("快照失败"), "{}");

    // 从未保存过的未知路径仍报错
    assert!(matches!(
        env.api.reset_parameter(&mut tree, "dataset.missing", "bob", "x"),
        Err(ApiError::Config(ConfigError::UnknownParameter { .. }))
    ));
}

