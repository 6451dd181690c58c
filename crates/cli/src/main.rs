use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use imgseq_renamer_core::{
    app_paths, build_plan, collect_image_files, execute_plan_with_options, load_config, load_log,
    parse_prefixes, save_config, save_log, select_candidates, tokenize, undo_from_log,
    validate_plan, AppConfig, ApplyOptions, RenamePlan, ScanStats, SelectionRule,
};
use std::path::{Path, PathBuf};

mod interactive;

use interactive::stem_of;

#[derive(Debug, Parser)]
#[command(name = "imgseq-renamer-cli")]
#[command(about = "乱れた名前の画像ファイルをカウンタ式テンプレートで一括リネームします")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Rename(RenameArgs),
    Undo(UndoArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
    Init,
}

#[derive(Debug, Args)]
struct RenameArgs {
    #[arg(long, default_value = ".")]
    dir: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    start: Option<u64>,
    #[arg(long)]
    src_prefix: Option<String>,
    #[arg(long)]
    prefix_len: Option<usize>,
    #[arg(long, default_value_t = false)]
    include_cjk: bool,
    #[arg(long, default_value_t = false)]
    recursive: bool,
    #[arg(long, default_value_t = false)]
    include_hidden: bool,
    #[arg(long, default_value_t = false)]
    backup: bool,
    #[arg(long, default_value_t = false)]
    apply: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Debug, Args)]
struct UndoArgs {
    #[arg(long)]
    log: String,
    #[arg(long, default_value_t = false)]
    apply: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Rename(args) => cmd_rename(args),
        Commands::Undo(args) => cmd_undo(args),
        Commands::Config(config) => match config.action {
            ConfigAction::Show => cmd_config_show(),
            ConfigAction::Init => cmd_config_init(),
        },
    }
}

fn cmd_rename(args: RenameArgs) -> Result<()> {
    let config = load_config()?;
    let pattern = args.name.unwrap_or_else(|| config.template.clone());
    let shared_start = args.start.unwrap_or(config.shared_start);
    let prefix_len = args.prefix_len.unwrap_or(config.prefix_len).max(1);
    let include_cjk = args.include_cjk || config.include_cjk;
    let recursive = args.recursive || config.recursive;
    let include_hidden = args.include_hidden || config.include_hidden;

    // 括弧の対応ミスは走査より前に弾く。
    tokenize(&pattern)?;

    let root = PathBuf::from(args.dir);
    if !root.is_dir() {
        anyhow::bail!("フォルダが存在しません: {}", root.display());
    }

    let mut stats = ScanStats::default();
    let images = collect_image_files(&root, recursive, include_hidden, &mut stats)?;
    if images.is_empty() {
        println!("対象フォルダに画像ファイルがありません。");
        return Ok(());
    }

    let candidates = match args.src_prefix.as_deref() {
        Some(raw) => {
            let rule = SelectionRule::Prefixes(parse_prefixes(raw));
            let selected = select_candidates(&images, &rule, include_cjk);
            if selected.is_empty() {
                println!("指定した接頭辞に一致する画像がありません（CJKを含む名前は既定でスキップされます）。");
                return Ok(());
            }
            selected
        }
        None => {
            let messy = select_candidates(&images, &SelectionRule::Messy, include_cjk);
            if messy.is_empty() {
                println!("「乱れた名前」とみられる画像は見つかりませんでした。");
                println!("特定の接頭辞だけを対象にするには --src-prefix を指定してください。");
                return Ok(());
            }
            let Some(chosen) = interactive::choose_prefix(&messy, prefix_len)? else {
                println!("接頭辞が確定しなかったため、リネームは行いません。");
                return Ok(());
            };
            messy
                .into_iter()
                .filter(|path| stem_of(path).starts_with(&chosen))
                .collect()
        }
    };

    let plan = build_plan(&root, &candidates, &pattern, shared_start, stats)?;
    validate_plan(&plan)?;

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
        OutputFormat::Table => print_table(&plan),
    }

    let options = ApplyOptions {
        backup_originals: args.backup,
    };
    let log = execute_plan_with_options(&plan, !args.apply, &options)?;

    if args.apply {
        let log_path = save_log(&plan.root, &log)?;
        eprintln!("リネーム完了: {} 件", log.pairs.len());
        eprintln!("ログを保存しました: {}", log_path.display());
        if args.backup {
            eprintln!(
                "元ファイルのコピー: {}",
                plan.root.join("backup").display()
            );
        }
    } else {
        eprintln!(
            "dry-runモード: 実ファイルは変更していません。適用するには --apply を指定してください。"
        );
    }

    Ok(())
}

fn cmd_undo(args: UndoArgs) -> Result<()> {
    let log = load_log(Path::new(&args.log))?;
    let report = undo_from_log(&log, !args.apply)?;

    if args.apply {
        println!("取り消し完了: {} 件", report.restored);
    } else {
        for pair in &report.reversals {
            println!(
                "[DRY] {} -> {}",
                file_name_of(&pair.source),
                file_name_of(&pair.destination)
            );
        }
        eprintln!("dry-runモード: 取り消しを適用するには --apply を指定してください。");
    }

    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let paths = app_paths()?;
    println!("設定ファイル: {}", paths.config_path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let paths = app_paths()?;
    if paths.config_path.exists() {
        anyhow::bail!(
            "設定ファイルは既に存在します: {}",
            paths.config_path.display()
        );
    }
    save_config(&AppConfig::default())?;
    println!("既定の設定を書き込みました: {}", paths.config_path.display());
    Ok(())
}

fn print_table(plan: &RenamePlan) {
    println!("元ファイル -> 新ファイル");
    for entry in &plan.entries {
        println!("{} -> {}", entry.source.display(), entry.target.display());
    }

    println!(
        "\n集計: scanned={} images={} non_image_skip={} hidden_skip={} planned={}",
        plan.stats.scanned_files,
        plan.stats.image_files,
        plan.stats.skipped_non_image,
        plan.stats.skipped_hidden,
        plan.entries.len()
    );
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
