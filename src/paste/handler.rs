//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `PasteHandler` 只负责流程编排与设置管理，不直接与任何宿主绑定。
//! 处理链路固定为：
//! 1. 单飞守卫（已有操作进行中 → 立即返回 `Busy`，不做任何 I/O）
//! 2. 校验活动文档与格式配置
//! 3. 按序尝试剪贴板途径
//! 4. 构建模板上下文 → 解析目录 → 生成并净化文件名 → 重名回避
//! 5. 逐级建目录 → 写入字节 → 展开插入模板并插入光标处
//!
//! ## 实现思路
//!
//! - 设置以 `Arc<Settings>` 存放在 `RwLock` 中，更新时整体替换。
//! - 单次请求内使用"同一设置快照"，避免处理中途设置漂移。
//! - 剪贴板读取会阻塞，放到 `spawn_blocking` 中执行，不占用异步运行时线程。
//! - 时钟可注入，便于测试时间戳相关的文件名。
//! - 记录 `clipboard/resolve/write/total` 阶段耗时，便于诊断。

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use chrono::{Local, NaiveDateTime};

use super::guard::InFlightGuard;
use super::{VaultAdapter, Workspace};
use crate::clipboard::{is_format_allowed, normalize_format, read_clipboard, ClipboardProvider};
use crate::error::PasteError;
use crate::path::{combine_path, resolve_folder_path};
use crate::sanitize::{sanitize_base_name, DEFAULT_FALLBACK_NAME};
use crate::settings::{Settings, SettingsPatch, FALLBACK_INSERT_PATTERN};
use crate::storage::{ensure_folder_exists, generate_unique_file_name};
use crate::template::{
    expand_insert_text, expand_template, format_timestamp, TemplateContext, VAR_IMAGE_FILE_NAME,
};

type Clock = Box<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// 一次成功粘贴的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteOutcome {
    /// Vault 相对路径
    pub file_path: String,
    pub file_name: String,
    pub format: String,
    pub inserted_text: String,
    pub bytes_written: usize,
}

/// 不读剪贴板、不写文件时的展开预览
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PastePlan {
    pub context: TemplateContext,
    pub folder: String,
    pub base_name: String,
}

/// 粘贴处理器。
///
/// 封装宿主能力、剪贴板途径与设置状态，并编排各子模块实现完整流程。
pub struct PasteHandler<V, W> {
    vault: V,
    workspace: W,
    providers: Arc<[Arc<dyn ClipboardProvider>]>,
    settings: RwLock<Arc<Settings>>,
    clock: Clock,
    processing: AtomicBool,
}

impl<V: VaultAdapter, W: Workspace> PasteHandler<V, W> {
    pub fn new(
        vault: V,
        workspace: W,
        providers: Vec<Arc<dyn ClipboardProvider>>,
        settings: Settings,
    ) -> Self {
        Self {
            vault,
            workspace,
            providers: providers.into(),
            settings: RwLock::new(Arc::new(settings)),
            clock: Box::new(|| Local::now().naive_local()),
            processing: AtomicBool::new(false),
        }
    }

    /// 替换时钟（测试用固定时间）。
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDateTime + Send + Sync + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    pub fn vault(&self) -> &V {
        &self.vault
    }

    pub fn workspace(&self) -> &W {
        &self.workspace
    }

    /// 获取设置快照。
    ///
    /// 作用：保证单次请求链路使用一致参数。
    pub fn settings_snapshot(&self) -> Result<Arc<Settings>, PasteError> {
        self.settings
            .read()
            .map(|settings| Arc::clone(&settings))
            .map_err(|_| PasteError::Settings("设置读取锁已中毒".to_string()))
    }

    /// 整体替换设置。
    pub fn replace_settings(&self, settings: Settings) -> Result<(), PasteError> {
        let mut guard = self
            .settings
            .write()
            .map_err(|_| PasteError::Settings("设置写入锁已中毒".to_string()))?;
        *guard = Arc::new(settings);
        Ok(())
    }

    /// 应用局部更新并返回新设置；校验失败时原设置保持不变。
    pub fn update_settings(&self, patch: SettingsPatch) -> Result<Arc<Settings>, PasteError> {
        let current = self.settings_snapshot()?;
        let next = current.with_patch(patch)?;
        self.replace_settings(next)?;
        log::info!("⚙️ 设置已更新");
        self.settings_snapshot()
    }

    fn vault_path(&self) -> (Option<PathBuf>, String) {
        let base = self.vault.base_path();
        let display = base
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();
        (base, display)
    }

    /// 按给定格式展开目录与文件名主体，不读剪贴板、不做 I/O。
    pub fn plan(&self, format: &str) -> Result<PastePlan, PasteError> {
        let settings = self.settings_snapshot()?;
        let timestamp = format_timestamp(&(self.clock)());
        self.plan_with(&settings, &normalize_format(format), &timestamp)
    }

    fn plan_with(&self, settings: &Settings, format: &str, timestamp: &str) -> Result<PastePlan, PasteError> {
        let document = self.workspace.active_document();
        let (base_path, vault_path) = self.vault_path();
        let context = TemplateContext::build(document.as_ref(), format, &vault_path, timestamp);

        let folder = resolve_folder_path(&settings.image_folder_path, &context, base_path.as_deref())?;
        let prefix = expand_template(&settings.name_prefix, &context);
        let main = expand_template(&settings.default_name, &context);
        let base_name = sanitize_base_name(&format!("{}{}", prefix, main), DEFAULT_FALLBACK_NAME);

        Ok(PastePlan {
            context,
            folder,
            base_name,
        })
    }

    /// 展开插入模板；缺少 `${imageFileName}` 时提示并回退到 `![[${imageFileName}]]`。
    fn build_insert_text(&self, pattern: &str, context: &TemplateContext) -> String {
        let placeholder = format!("${{{}}}", VAR_IMAGE_FILE_NAME);
        let template = if pattern.contains(&placeholder) {
            pattern
        } else {
            self.workspace.notice(&format!(
                "插入模板中没有 {}，已按默认格式插入。",
                placeholder
            ));
            FALLBACK_INSERT_PATTERN
        };
        expand_insert_text(template, context)
    }

    /// 处理主入口：从剪贴板取图、写入 Vault、在光标处插入引用。
    pub async fn handle_paste(&self) -> Result<PasteOutcome, PasteError> {
        let Some(_guard) = InFlightGuard::try_acquire(&self.processing) else {
            return Err(PasteError::Busy);
        };

        let document = self.workspace.active_document().ok_or(PasteError::NoEditor)?;
        let settings = self.settings_snapshot()?;
        if settings.supported_formats.is_empty() {
            return Err(PasteError::Settings("没有配置可粘贴的图片格式".to_string()));
        }

        log::info!("🖼️ 开始粘贴图片 - 文档: {}", document.path);
        let total_start = Instant::now();

        let clipboard_start = Instant::now();
        let providers = Arc::clone(&self.providers);
        let allowed = settings.supported_formats.clone();
        let image = tokio::task::spawn_blocking(move || read_clipboard(&providers, &allowed))
            .await
            .map_err(|e| PasteError::Clipboard(format!("线程执行失败：{}", e)))?
            .ok_or(PasteError::NoImage)?;
        let clipboard_elapsed = clipboard_start.elapsed();

        let format = normalize_format(&image.format);
        if !is_format_allowed(&format, &settings.supported_formats) {
            return Err(PasteError::UnsupportedFormat {
                format,
                allowed: settings.supported_formats.join(", "),
            });
        }

        let resolve_start = Instant::now();
        let timestamp = format_timestamp(&(self.clock)());
        let plan = self.plan_with(&settings, &format, &timestamp)?;
        let file_name = generate_unique_file_name(&self.vault, &plan.folder, &plan.base_name, &format).await?;
        let file_path = combine_path(&plan.folder, &file_name);
        let resolve_elapsed = resolve_start.elapsed();

        let write_start = Instant::now();
        ensure_folder_exists(&self.vault, &plan.folder).await?;
        self.vault.write_binary(&file_path, &image.bytes).await?;
        let write_elapsed = write_start.elapsed();

        let final_context = plan.context.with_image_file_name(&file_name);
        let inserted_text = self.build_insert_text(&settings.insert_pattern, &final_context);
        self.workspace.insert_at_cursor(&inserted_text).await?;

        log::info!(
            "✅ 图片粘贴完成 - 文件: {} clipboard={}ms resolve={}ms write={}ms total={}ms",
            file_path,
            clipboard_elapsed.as_millis(),
            resolve_elapsed.as_millis(),
            write_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(PasteOutcome {
            file_path,
            file_name,
            format,
            inserted_text,
            bytes_written: image.bytes.len(),
        })
    }

    /// 命令入口：捕获全部错误，记录日志并只给出一条用户提示。
    pub async fn run_command(&self) -> Option<PasteOutcome> {
        match self.handle_paste().await {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                match err {
                    PasteError::Busy | PasteError::NoImage | PasteError::NoEditor => {
                        log::warn!("[{}] {}", err.code(), err);
                    }
                    _ => log::error!("[{}] 图片粘贴失败: {}", err.code(), err),
                }
                self.workspace.notice(&err.notice());
                None
            }
        }
    }
}
