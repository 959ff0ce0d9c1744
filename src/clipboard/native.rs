//! 原生剪贴板途径
//!
//! 通过 `arboard` 读取系统剪贴板中的图像（RGBA 像素），再用 `image` 编码为 PNG。
//! 该途径不做格式协商，只在允许列表包含 `png` 时生效。

use std::io::Cursor;

use image::ImageFormat;

use super::{is_format_allowed, ClipboardImage, ClipboardProvider};
use crate::error::PasteError;

pub struct NativeClipboardProvider;

impl ClipboardProvider for NativeClipboardProvider {
    fn name(&self) -> &'static str {
        "native"
    }

    fn try_read(&self, allowed_formats: &[String]) -> Result<Option<ClipboardImage>, PasteError> {
        if !is_format_allowed("png", allowed_formats) {
            return Ok(None);
        }

        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| PasteError::Clipboard(e.to_string()))?;

        let image_data = match clipboard.get_image() {
            Ok(data) => data,
            Err(arboard::Error::ContentNotAvailable) => return Ok(None),
            Err(e) => return Err(PasteError::Clipboard(e.to_string())),
        };

        if image_data.width == 0 || image_data.height == 0 {
            return Ok(None);
        }

        let bytes = encode_png(
            image_data.width as u32,
            image_data.height as u32,
            image_data.bytes.into_owned(),
        )?;
        if bytes.is_empty() {
            return Ok(None);
        }

        Ok(Some(ClipboardImage {
            bytes,
            format: "png".to_string(),
        }))
    }
}

/// 把 RGBA 像素编码为 PNG 字节。
pub(crate) fn encode_png(width: u32, height: u32, rgba: Vec<u8>) -> Result<Vec<u8>, PasteError> {
    let image = image::RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| PasteError::Clipboard("创建图像缓冲区失败".to_string()))?;

    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| PasteError::Clipboard(format!("PNG 编码失败: {}", e)))?;
    Ok(cursor.into_inner())
}
