//! 剪贴板读取模块
//!
//! # 设计思路
//!
//! 系统剪贴板有两条读取途径，能力和限制各不相同：
//! - **原生途径**（`native`）：通过 `arboard` 直接读取图像，不做格式协商，总是得到 PNG
//! - **通用途径**（`mime`）：枚举剪贴板条目及其媒体类型，挑选 `image/*` 中被允许的格式
//!
//! 两条途径统一抽象为 `ClipboardProvider`，编排层按顺序尝试，首个成功即返回，
//! 新增途径只需追加一个提供者，无需修改分支逻辑。
//!
//! # 实现思路
//!
//! - 格式标签统一规范化：小写，`jpeg` → `jpg`，再与允许列表比较。
//! - 提供者内部错误只记录日志并视为"此途径无图"，继续尝试下一个。
//! - 所有途径都没有可用图片时返回 `None`，由上层报告"无兼容图片"而非硬失败。
//! - 读取会阻塞（系统剪贴板 / 外部进程），编排层在 `spawn_blocking` 中调用，
//!   因此提供者以 `Arc<dyn ClipboardProvider>` 共享。

pub mod mime;
pub mod native;

use std::sync::Arc;

use crate::error::PasteError;

pub use mime::{ClipboardItem, ClipboardItemSource, MimeClipboardProvider, SystemMimeSource};
pub use native::NativeClipboardProvider;

/// 一次粘贴中读取到的图片：原始字节 + 规范化格式标签
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardImage {
    pub bytes: Vec<u8>,
    pub format: String,
}

/// 规范化格式标签：小写，`jpeg` → `jpg`。
///
/// # 示例
/// ```
/// use image_paste::clipboard::normalize_format;
///
/// assert_eq!(normalize_format("JPEG"), "jpg");
/// assert_eq!(normalize_format("Png"), "png");
/// ```
pub fn normalize_format(format: &str) -> String {
    let lowered = format.trim().to_lowercase();
    if lowered == "jpeg" {
        "jpg".to_string()
    } else {
        lowered
    }
}

/// 判断格式是否在允许列表中（两侧都先规范化）。
pub fn is_format_allowed(format: &str, supported_formats: &[String]) -> bool {
    let format = normalize_format(format);
    supported_formats
        .iter()
        .any(|entry| normalize_format(entry) == format)
}

/// 剪贴板读取途径
pub trait ClipboardProvider: Send + Sync {
    /// 途径名称（仅用于日志）
    fn name(&self) -> &'static str;

    /// 尝试读取一张格式被允许的图片；没有则返回 `Ok(None)`。
    fn try_read(&self, allowed_formats: &[String]) -> Result<Option<ClipboardImage>, PasteError>;
}

/// 默认途径顺序：原生优先，通用途径兜底。
pub fn default_providers() -> Vec<Arc<dyn ClipboardProvider>> {
    vec![
        Arc::new(NativeClipboardProvider),
        Arc::new(MimeClipboardProvider::new(SystemMimeSource::detect())),
    ]
}

/// 按顺序尝试各途径，返回第一张被允许的图片。
pub fn read_clipboard(
    providers: &[Arc<dyn ClipboardProvider>],
    allowed_formats: &[String],
) -> Option<ClipboardImage> {
    for provider in providers {
        match provider.try_read(allowed_formats) {
            Ok(Some(image)) => {
                log::info!(
                    "📋 通过 {} 读取到剪贴板图片 - 格式: {} 大小: {} KB",
                    provider.name(),
                    image.format,
                    image.bytes.len() / 1024
                );
                return Some(image);
            }
            Ok(None) => {
                log::debug!("⏭️  {} 未提供可用图片", provider.name());
            }
            Err(err) => {
                log::warn!("⚠️ {} 读取剪贴板失败：{}", provider.name(), err);
            }
        }
    }
    None
}
