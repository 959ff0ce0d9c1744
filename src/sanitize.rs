//! 文件名净化模块
//!
//! 去掉文件名中的非法字符、处理 Windows 保留设备名，并在保留扩展名的前提下
//! 把整个文件名截断到长度上限内。长度均按字符计算。

use crate::error::PasteError;

pub const DEFAULT_FALLBACK_NAME: &str = "untitled";
pub const DEFAULT_MAX_NAME_LENGTH: usize = 200;

const INVALID_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

const RESERVED_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

fn is_reserved_name(name: &str) -> bool {
    let upper = name.to_uppercase();
    RESERVED_NAMES.contains(&upper.as_str())
}

/// 净化文件名主体（不含扩展名）。
///
/// # 示例
/// ```
/// use image_paste::sanitize::sanitize_base_name;
///
/// assert_eq!(sanitize_base_name("a:b*c", "untitled"), "a_b_c");
/// assert_eq!(sanitize_base_name("", "untitled"), "untitled");
/// assert_eq!(sanitize_base_name("CON", "untitled"), "_CON");
/// ```
pub fn sanitize_base_name(name: &str, fallback: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if INVALID_CHARS.contains(&c) || c.is_control() { '_' } else { c })
        .collect();
    let trimmed = replaced.trim().trim_matches('.');

    let mut sanitized = if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    };
    if is_reserved_name(&sanitized) {
        sanitized = format!("_{}", sanitized);
    }
    sanitized
}

/// 在保留 `.extension` 的前提下把文件名截断到 `max_length` 字符以内。
///
/// 扩展名本身（含点号）已占满上限时返回 `NameTooLong`。
pub fn clamp_name_length(
    base_name: &str,
    extension: &str,
    max_length: usize,
) -> Result<String, PasteError> {
    let suffix = if extension.is_empty() {
        String::new()
    } else {
        format!(".{}", extension)
    };
    let suffix_len = suffix.chars().count();
    if suffix_len >= max_length {
        return Err(PasteError::NameTooLong {
            extension: extension.to_string(),
            max_length,
        });
    }

    let available = max_length - suffix_len;
    let truncated: String = base_name.chars().take(available).collect();
    Ok(format!("{}{}", truncated, suffix))
}
