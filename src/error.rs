//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `PasteError` 枚举，覆盖一次粘贴流程中所有可能的失败：
//! 编辑器缺失、剪贴板无图、格式不允许、路径非法、越出 Vault、
//! 文件名耗尽、扩展名过长、重入忙碌，以及底层 I/O / 剪贴板 / 设置错误。
//!
//! 所有错误都在编排层（`paste::PasteHandler::run_command`）被统一捕获，
//! 记录诊断日志后映射为**恰好一条**用户可见提示，不会让宿主崩溃。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息（用于日志）。
//! - `notice()` 输出面向用户的提示文案；`code()` 输出稳定错误码，便于检索。
//! - 为 `std::io::Error` 提供 `From` 转换，宿主实现可直接 `?`。

/// 粘贴流程统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum PasteError {
    /// 没有活动文档 / 光标目标
    #[error("没有活动的编辑器")]
    NoEditor,

    /// 剪贴板中没有可用图片
    #[error("剪贴板中没有兼容的图片")]
    NoImage,

    /// 图片存在，但格式不在允许列表中
    #[error("不支持的图片格式：{format}（允许：{allowed}）")]
    UnsupportedFormat { format: String, allowed: String },

    /// 模板展开后为绝对路径或含 `..` 段
    #[error("路径非法：{0}")]
    InvalidPath(String),

    /// 解析后的路径越出 Vault 根目录
    #[error("路径越出 Vault：{0}")]
    BoundaryViolation(String),

    /// 重名回避次数用尽
    #[error("文件名重名回避失败（尝试次数：{attempts}）")]
    NameExhaustion { attempts: usize },

    /// 扩展名过长，无法在长度上限内生成文件名
    #[error("扩展名过长，无法生成文件名：.{extension}（上限 {max_length} 字符）")]
    NameTooLong { extension: String, max_length: usize },

    /// 已有粘贴操作在进行中
    #[error("已有图片正在处理中")]
    Busy,

    /// 剪贴板读取失败
    #[error("剪贴板操作失败: {0}")]
    Clipboard(String),

    /// 设置无效或读写失败
    #[error("设置错误: {0}")]
    Settings(String),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),
}

impl PasteError {
    /// 稳定错误码，写入日志便于聚合检索。
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoEditor => "E_NO_EDITOR",
            Self::NoImage => "E_NO_IMAGE",
            Self::UnsupportedFormat { .. } => "E_UNSUPPORTED_FORMAT",
            Self::InvalidPath(_) => "E_INVALID_PATH",
            Self::BoundaryViolation(_) => "E_BOUNDARY",
            Self::NameExhaustion { .. } => "E_NAME_EXHAUSTED",
            Self::NameTooLong { .. } => "E_NAME_TOO_LONG",
            Self::Busy => "E_BUSY",
            Self::Clipboard(_) => "E_CLIPBOARD",
            Self::Settings(_) => "E_SETTINGS",
            Self::Io(_) => "E_IO",
        }
    }

    /// 面向用户的单条提示文案。
    ///
    /// 细节（路径、底层错误）只进日志；I/O 与剪贴板类错误给出笼统提示。
    pub fn notice(&self) -> String {
        match self {
            Self::NoEditor => "没有找到活动的编辑器，请先打开一篇笔记。".to_string(),
            Self::NoImage => "剪贴板中没有找到图片。".to_string(),
            Self::UnsupportedFormat { format, allowed } => {
                format!("不支持的图片格式（{}）。允许的格式：{}", format, allowed)
            }
            Self::InvalidPath(detail) | Self::BoundaryViolation(detail) => detail.clone(),
            Self::NameExhaustion { .. } | Self::NameTooLong { .. } => self.to_string(),
            Self::Busy => "图片正在处理中，请稍后再试。".to_string(),
            Self::Settings(detail) => format!("设置无效：{}", detail),
            Self::Clipboard(_) | Self::Io(_) => "图片粘贴失败，详情请查看日志。".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PasteError;

    #[test]
    fn io_errors_convert_and_hide_details_from_notice() {
        let err: PasteError = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert_eq!(err.code(), "E_IO");
        assert!(!err.notice().contains("denied"));
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn unsupported_format_notice_lists_allowed_formats() {
        let err = PasteError::UnsupportedFormat {
            format: "jpg".to_string(),
            allowed: "png, gif".to_string(),
        };
        assert!(err.notice().contains("jpg"));
        assert!(err.notice().contains("png, gif"));
    }
}
