// ==========================================
// 模型模板参数配置 - 命令行入口
// ==========================================
// 用法: ote-config [--db PATH] [--locale LOCALE] <command>
// 输出: 命令结果写 stdout，日志写 stderr
// ==========================================

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueHint};

use ote_config::api::ConfigApi;
use ote_config::config::AppSettings;
use ote_config::domain::ConfigTree;
use ote_config::engine::{evaluate_ui_state, parse_override, validate};
use ote_config::i18n::{set_locale, t, t_with_args};
use ote_config::loader::{self, DocumentFormat};
use ote_config::{db, logging};

#[derive(Parser)]
#[command(author, version, about = "模型模板参数配置：校验、覆写与导出训练参数")]
struct Cli {
    /// 覆写库路径（默认读取 OTE_CONFIG_DB_PATH，再退回用户数据目录）
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    db: Option<PathBuf>,

    /// 输出语言: zh-CN / en（默认读取 OTE_CONFIG_LOCALE）
    #[arg(long, global = true)]
    locale: Option<String>,

    /// 模板ID（默认取文档根节点 id，再退回文件名）
    #[arg(long, global = true)]
    template_id: Option<String>,

    /// 日志以 JSON 行格式输出
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 校验模板文档，列出全部违规
    Validate(FileArgs),

    /// 显示参数当前值（含已保存覆写）
    Show(FileArgs),

    /// 设置参数覆写
    Set(SetArgs),

    /// 恢复参数默认值
    Reset(ResetArgs),

    /// 导出外部训练参数
    ExportArgs(FormatArgs),

    /// 导出叠加覆写后的完整模板文档
    Dump(FormatArgs),

    /// 显示覆写历史
    History(HistoryArgs),

    /// 导出覆写快照（JSON）
    Snapshot(FileArgs),

    /// 从快照恢复全部覆写
    Restore(RestoreArgs),
}

#[derive(Args)]
struct FileArgs {
    /// 模板文件（.yaml/.yml/.json）
    #[arg(value_hint = ValueHint::FilePath)]
    file: PathBuf,
}

#[derive(Args)]
struct AuditArgs {
    /// 操作人（默认取 USER/USERNAME 环境变量）
    #[arg(long)]
    actor: Option<String>,

    /// 操作原因
    #[arg(long, default_value = "命令行修改")]
    reason: String,
}

#[derive(Args)]
struct SetArgs {
    #[arg(value_hint = ValueHint::FilePath)]
    file: PathBuf,

    /// 参数路径，如 dataset.train_batch_size
    path: String,

    /// 新值（按参数类型解析；可选项可用符号名或显示值）
    value: String,

    #[command(flatten)]
    audit: AuditArgs,
}

#[derive(Args)]
struct ResetArgs {
    #[arg(value_hint = ValueHint::FilePath)]
    file: PathBuf,

    /// 参数路径
    path: String,

    #[command(flatten)]
    audit: AuditArgs,
}

#[derive(Args)]
struct FormatArgs {
    #[arg(value_hint = ValueHint::FilePath)]
    file: PathBuf,

    /// 输出格式: json / yaml
    #[arg(long, default_value = "json")]
    format: DocumentFormat,
}

#[derive(Args)]
struct HistoryArgs {
    #[arg(value_hint = ValueHint::FilePath)]
    file: PathBuf,

    /// 最多显示条数
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Args)]
struct RestoreArgs {
    #[arg(value_hint = ValueHint::FilePath)]
    file: PathBuf,

    /// 快照文件（snapshot 命令的输出）
    #[arg(value_hint = ValueHint::FilePath)]
    snapshot: PathBuf,

    #[command(flatten)]
    audit: AuditArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }

    let mut settings = AppSettings::from_env();
    if let Some(db_path) = &cli.db {
        settings = settings.with_db_path(db_path);
    }
    if let Some(locale) = &cli.locale {
        settings = settings.with_locale(locale);
    }
    set_locale(&settings.locale);

    tracing::debug!(version = ote_config::VERSION, db = %settings.db_path.display(), "启动");

    match run(cli, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", t_with_args("cli.error", &[("message", &format!("{:#}", e))]));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, settings: &AppSettings) -> anyhow::Result<()> {
    let template_id = cli.template_id.as_deref();

    match cli.command {
        Command::Validate(args) => cmd_validate(&args.file),
        Command::Show(args) => {
            let api = open_api(settings)?;
            let tree = api.load_with_overrides(&args.file, template_id)?;
            print_tree(&tree);
            Ok(())
        }
        Command::Set(args) => {
            let api = open_api(settings)?;
            let mut tree = api.load_with_overrides(&args.file, template_id)?;
            let value = parse_override(&tree, &args.path, &args.value)?;
            let actor = resolve_actor(&args.audit);
            let applied = api.update_parameter(&mut tree, &args.path, value, &actor, &args.audit.reason)?;

            let current = applied.current.to_string();
            println!("{}", t_with_args("cli.set.ok", &[("path", &applied.path), ("value", &current)]));
            if let Some(warning) = &applied.warning {
                println!("{}", t_with_args("cli.set.warning", &[("warning", warning)]));
            }
            Ok(())
        }
        Command::Reset(args) => {
            // 不叠加覆写：与模板不再相容的覆写也必须能被清除
            let api = open_api(settings)?;
            let mut tree = api.load_template(&args.file, template_id)?;
            let actor = resolve_actor(&args.audit);
            match api.reset_parameter(&mut tree, &args.path, &actor, &args.audit.reason)? {
                Some(old) => {
                    let old = old.to_string();
                    println!("{}", t_with_args("cli.reset.ok", &[("path", &args.path), ("value", &old)]));
                }
                None => println!("{}", t_with_args("cli.reset.noop", &[("path", &args.path)])),
            }
            Ok(())
        }
        Command::ExportArgs(args) => {
            let api = open_api(settings)?;
            let tree = api.load_with_overrides(&args.file, template_id)?;
            let exported = api.export_args(&tree)?;
            let text = match args.format {
                DocumentFormat::Json => serde_json::to_string_pretty(&exported)?,
                DocumentFormat::Yaml => serde_yaml::to_string(&exported)?,
            };
            println!("{}", text.trim_end());
            Ok(())
        }
        Command::Dump(args) => {
            let api = open_api(settings)?;
            let tree = api.load_with_overrides(&args.file, template_id)?;
            println!("{}", loader::serialize(&tree, args.format)?.trim_end());
            Ok(())
        }
        Command::History(args) => {
            let api = open_api(settings)?;
            let tree = api.load_template(&args.file, template_id)?;
            let logs = api.list_history(&tree.id, args.limit)?;
            if logs.is_empty() {
                println!("{}", t_with_args("cli.history.empty", &[("id", &tree.id)]));
            }
            let none = t("common.none");
            for log in logs {
                let ts = log.action_ts.format("%Y-%m-%d %H:%M:%S").to_string();
                let old = log.old_value.map(|v| v.to_string()).unwrap_or_else(|| none.clone());
                let new = log.new_value.map(|v| v.to_string()).unwrap_or_else(|| none.clone());
                println!(
                    "{}",
                    t_with_args(
                        "cli.history.row",
                        &[
                            ("ts", &ts),
                            ("action", log.action.as_str()),
                            ("path", &log.path),
                            ("old", &old),
                            ("new", &new),
                            ("actor", &log.actor),
                            ("reason", &log.reason),
                        ],
                    )
                );
            }
            Ok(())
        }
        Command::Snapshot(args) => {
            let api = open_api(settings)?;
            let tree = api.load_template(&args.file, template_id)?;
            println!("{}", api.get_snapshot(&tree.id)?);
            Ok(())
        }
        Command::Restore(args) => {
            let api = open_api(settings)?;
            let mut tree = api.load_template(&args.file, template_id)?;
            let snapshot = std::fs::read_to_string(&args.snapshot)
                .with_context(|| format!("读取快照失败: {}", args.snapshot.display()))?;
            let actor = resolve_actor(&args.audit);
            api.restore_snapshot(&mut tree, &snapshot, &actor, &args.audit.reason)?;
            println!("{}", t("common.success"));
            Ok(())
        }
    }
}

fn cmd_validate(file: &Path) -> anyhow::Result<()> {
    let tree = loader::load_file(file)?;
    let violations = validate(&tree);
    let file_display = file.display().to_string();

    if violations.is_empty() {
        let count = tree.parameters().len().to_string();
        println!("{}", t_with_args("cli.validate.ok", &[("path", &file_display), ("count", &count)]));
        return Ok(());
    }

    for v in &violations {
        let kind = serde_json::to_value(v.violation_type)?
            .as_str()
            .map(str::to_string)
            .unwrap_or_default();
        println!(
            "{}",
            t_with_args(
                "cli.validate.violation",
                &[("kind", &kind), ("path", &v.path), ("field", &v.field), ("reason", &v.reason)],
            )
        );
    }
    bail!(t_with_args("cli.validate.failed", &[("count", &violations.len().to_string())]))
}

fn print_tree(tree: &ConfigTree) {
    let header = tree.root.header.clone();
    println!("{}", t_with_args("cli.show.header", &[("id", &tree.id), ("header", &header)]));

    let states = evaluate_ui_state(tree);
    for (path, param) in tree.parameters() {
        let mut flags = String::new();
        if param.value.is_some() {
            flags.push_str(&t("cli.show.overridden"));
        }
        if let Some(state) = states.get(&path) {
            if !state.editable {
                flags.push_str(&t("cli.show.read_only"));
            }
            if !state.visible {
                flags.push_str(&t("cli.show.hidden"));
            }
        }

        let value = param.effective_value().to_string();
        println!(
            "{}",
            t_with_args(
                "cli.show.row",
                &[
                    ("path", &path),
                    ("value", &value),
                    ("kind", param.parameter_type().as_str()),
                    ("flags", &flags),
                ],
            )
        );
    }
}

fn open_api(settings: &AppSettings) -> anyhow::Result<ConfigApi> {
    let db_path = settings.db_path_str();
    let conn = db::open_shared_connection(&db_path)
        .with_context(|| format!("打开覆写库失败: {}", db_path))?;
    Ok(ConfigApi::from_connection(conn)?)
}

fn resolve_actor(audit: &AuditArgs) -> String {
    audit
        .actor
        .clone()
        .or_else(|| std::env::var("USER").ok())
        .or_else(|| std::env::var("USERNAME").ok())
        .unwrap_or_else(|| "operator".to_string())
}
