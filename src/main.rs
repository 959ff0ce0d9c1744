//! # 剪贴板图片粘贴工具 — 命令行入口
//!
//! 本文件只负责参数解析、日志初始化与宿主装配。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use image_paste::clipboard::default_providers;
use image_paste::error::PasteError;
use image_paste::paste::PasteHandler;
use image_paste::settings::{Settings, SettingsPatch, SettingsStore};
use image_paste::template::TEMPLATE_VARIABLES;
use image_paste::vault::{Cursor, FsVault, InsertMode, NoteWorkspace};

#[derive(Parser)]
#[command(name = "image-paste")]
#[command(about = "Paste clipboard images into a markdown vault")]
#[command(version)]
struct Cli {
    /// Vault 根目录
    #[arg(long, global = true, env = "IMAGE_PASTE_VAULT", default_value = ".")]
    vault: PathBuf,

    /// 设置文件（默认 <vault>/.image-paste/settings.json）
    #[arg(long, global = true, env = "IMAGE_PASTE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 把剪贴板图片保存到 Vault 并在笔记中插入引用
    Paste {
        /// 活动笔记（Vault 相对路径或 Vault 内的绝对路径）
        #[arg(long)]
        note: PathBuf,
        /// 插入位置：行:列（从 1 开始）或 end
        #[arg(long, default_value = "end", conflicts_with = "print")]
        cursor: Cursor,
        /// 不修改笔记，只把插入文本输出到 stdout
        #[arg(long)]
        print: bool,
    },

    /// 查看或修改设置
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },

    /// 预览模板变量与展开后的目录、文件名
    Vars {
        #[arg(long)]
        note: PathBuf,
        /// 假定的剪贴板图片格式
        #[arg(long, default_value = "png")]
        format: String,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// 输出当前设置（JSON）
    Show,
    /// 修改部分设置
    Set {
        #[arg(long)]
        folder: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        prefix: Option<String>,
        #[arg(long)]
        insert: Option<String>,
        /// 逗号分隔，如 png,jpg,gif
        #[arg(long, value_delimiter = ',')]
        formats: Option<Vec<String>>,
    },
    /// 恢复默认设置
    Reset,
}

/// 把命令行给出的笔记路径转为 Vault 相对路径。
fn note_relative_path(vault: &Path, note: &Path) -> Result<String, PasteError> {
    let relative = if note.is_absolute() {
        let root = vault.canonicalize()?;
        let full = note.canonicalize()?;
        full.strip_prefix(&root)
            .map(Path::to_path_buf)
            .map_err(|_| PasteError::BoundaryViolation(format!("笔记不在 Vault 内：{}", note.display())))?
    } else {
        note.to_path_buf()
    };
    Ok(relative.to_string_lossy().replace('\\', "/"))
}

fn build_handler(
    vault: &Path,
    note: &str,
    mode: InsertMode,
    settings: Settings,
) -> PasteHandler<FsVault, NoteWorkspace> {
    PasteHandler::new(
        FsVault::new(vault),
        NoteWorkspace::new(vault, note, mode),
        default_providers(),
        settings,
    )
}

async fn run(cli: Cli) -> Result<ExitCode, PasteError> {
    let store = SettingsStore::new(
        cli.config
            .clone()
            .unwrap_or_else(|| SettingsStore::default_path(&cli.vault)),
    );

    match cli.command {
        Commands::Paste { note, cursor, print } => {
            let note = note_relative_path(&cli.vault, &note)?;
            let mode = if print { InsertMode::Print } else { InsertMode::Splice(cursor) };
            let handler = build_handler(&cli.vault, &note, mode, store.load());

            match handler.run_command().await {
                Some(outcome) => {
                    log::info!("📎 {} ({} 字节)", outcome.file_path, outcome.bytes_written);
                    Ok(ExitCode::SUCCESS)
                }
                None => Ok(ExitCode::FAILURE),
            }
        }
        Commands::Settings { command } => {
            match command {
                SettingsCommands::Show => {}
                SettingsCommands::Set { folder, name, prefix, insert, formats } => {
                    let patch = SettingsPatch {
                        image_folder_path: folder,
                        default_name: name,
                        name_prefix: prefix,
                        insert_pattern: insert,
                        supported_formats: formats,
                    };
                    let next = store.load().with_patch(patch)?;
                    store.save(&next)?;
                    log::info!("⚙️ 设置已保存到 {}", store.path().display());
                }
                SettingsCommands::Reset => {
                    store.save(&Settings::default())?;
                    log::info!("⚙️ 已恢复默认设置");
                }
            }
            let json = serde_json::to_string_pretty(&store.load())
                .map_err(|e| PasteError::Settings(e.to_string()))?;
            println!("{}", json);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Vars { note, format } => {
            let note = note_relative_path(&cli.vault, &note)?;
            let handler = build_handler(&cli.vault, &note, InsertMode::Print, store.load());
            let plan = handler.plan(&format)?;

            for name in TEMPLATE_VARIABLES {
                match plan.context.get(name) {
                    Some(value) => println!("${{{}}} = {}", name, value),
                    None => println!("${{{}}} = (保存后确定)", name),
                }
            }
            println!("folder = {}", plan.folder);
            println!("name   = {}", plan.base_name);
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            log::error!("[{}] {}", err.code(), err);
            eprintln!("{}", err.notice());
            ExitCode::FAILURE
        }
    }
}
