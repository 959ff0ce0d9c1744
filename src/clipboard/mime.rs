//! 通用剪贴板途径（按媒体类型协商）
//!
//! # 设计思路
//!
//! 剪贴板可能同时提供多种表示（`image/png`、`image/jpeg`、`text/html` …）。
//! 本途径枚举每个条目的全部媒体类型，取第一个匹配 `image/*` 且规范化子类型
//! 在允许列表中的类型，再读取其字节。
//!
//! # 实现思路
//!
//! - 条目枚举与字节读取抽象为 `ClipboardItemSource`，便于替换与测试。
//! - `SystemMimeSource` 在 Wayland 下调用 `wl-paste`，在 X11 下调用 `xclip`。
//! - 单个类型读取失败或签名识别为非图片时只记日志并跳过，继续尝试后续类型与条目；
//!   签名识别为图片时以签名推断的扩展名为准（声明类型与实际内容不符时纠正扩展名）。

use std::process::Command;

use super::{is_format_allowed, normalize_format, ClipboardImage, ClipboardProvider};
use crate::error::PasteError;

/// 剪贴板条目：提供的媒体类型列表（按剪贴板给出的优先顺序）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardItem {
    pub index: usize,
    pub types: Vec<String>,
}

/// 剪贴板条目来源
pub trait ClipboardItemSource: Send + Sync {
    fn items(&self) -> Result<Vec<ClipboardItem>, PasteError>;

    fn read_type(&self, item: &ClipboardItem, mime_type: &str) -> Result<Vec<u8>, PasteError>;
}

pub struct MimeClipboardProvider<S: ClipboardItemSource> {
    source: S,
}

impl<S: ClipboardItemSource> MimeClipboardProvider<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

/// 从 `image/png; charset=…` 这类媒体类型中取出子类型。
fn image_subtype(mime_type: &str) -> Option<&str> {
    let essence = mime_type.split(';').next()?.trim();
    let (kind, subtype) = essence.split_once('/')?;
    if kind.eq_ignore_ascii_case("image") && !subtype.is_empty() {
        Some(subtype)
    } else {
        None
    }
}

impl<S: ClipboardItemSource> ClipboardProvider for MimeClipboardProvider<S> {
    fn name(&self) -> &'static str {
        "mime"
    }

    fn try_read(&self, allowed_formats: &[String]) -> Result<Option<ClipboardImage>, PasteError> {
        for item in self.source.items()? {
            for mime_type in &item.types {
                let Some(subtype) = image_subtype(mime_type) else {
                    continue;
                };
                let format = normalize_format(subtype);
                if !is_format_allowed(&format, allowed_formats) {
                    continue;
                }

                let bytes = match self.source.read_type(&item, mime_type) {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        log::warn!("⚠️ 读取剪贴板条目 {} 的 {} 失败，尝试下一个类型：{}", item.index, mime_type, err);
                        continue;
                    }
                };
                if bytes.is_empty() {
                    continue;
                }

                let format = match infer::get(&bytes) {
                    Some(kind) if kind.matcher_type() != infer::MatcherType::Image => {
                        log::warn!("⚠️ 剪贴板声明为 {} 但内容不是图片：{}，已跳过", mime_type, kind.mime_type());
                        continue;
                    }
                    Some(kind) => {
                        let detected = normalize_format(kind.extension());
                        if detected != format {
                            log::warn!("⚠️ 剪贴板声明 {} 但签名为 {}，按签名处理", mime_type, kind.mime_type());
                            if !is_format_allowed(&detected, allowed_formats) {
                                continue;
                            }
                        }
                        detected
                    }
                    None => format,
                };

                return Ok(Some(ClipboardImage { bytes, format }));
            }
        }
        Ok(None)
    }
}

/// 系统剪贴板工具后端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    WlPaste,
    Xclip,
}

/// 基于命令行剪贴板工具的条目来源（仅一个条目：系统剪贴板本身）。
///
/// 没有可用后端（非 Wayland / X11 会话）时枚举结果为空。
#[derive(Debug, Clone)]
pub struct SystemMimeSource {
    backend: Option<Backend>,
}

impl SystemMimeSource {
    /// 根据会话环境变量选择后端。
    pub fn detect() -> Self {
        let backend = if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            Some(Backend::WlPaste)
        } else if std::env::var_os("DISPLAY").is_some() {
            Some(Backend::Xclip)
        } else {
            None
        };
        Self { backend }
    }

    fn run(program: &str, args: &[&str]) -> Result<Option<Vec<u8>>, PasteError> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| PasteError::Clipboard(format!("无法执行 {}: {}", program, e)))?;

        if !output.status.success() {
            log::debug!(
                "{} 退出码 {:?}: {}",
                program,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Ok(None);
        }
        Ok(Some(output.stdout))
    }
}

impl ClipboardItemSource for SystemMimeSource {
    fn items(&self) -> Result<Vec<ClipboardItem>, PasteError> {
        let listing = match self.backend {
            Some(Backend::WlPaste) => Self::run("wl-paste", &["--list-types"])?,
            Some(Backend::Xclip) => Self::run("xclip", &["-selection", "clipboard", "-t", "TARGETS", "-o"])?,
            None => return Ok(Vec::new()),
        };

        let Some(listing) = listing else {
            return Ok(Vec::new());
        };

        let types: Vec<String> = String::from_utf8_lossy(&listing)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        if types.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![ClipboardItem { index: 0, types }])
    }

    fn read_type(&self, _item: &ClipboardItem, mime_type: &str) -> Result<Vec<u8>, PasteError> {
        let bytes = match self.backend {
            Some(Backend::WlPaste) => Self::run("wl-paste", &["--no-newline", "--type", mime_type])?,
            Some(Backend::Xclip) => Self::run("xclip", &["-selection", "clipboard", "-t", mime_type, "-o"])?,
            None => None,
        };
        bytes.ok_or_else(|| PasteError::Clipboard(format!("读取剪贴板类型 {} 失败", mime_type)))
    }
}
