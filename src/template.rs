//! 模板变量展开模块
//!
//! # 设计思路
//!
//! 保存目录、文件名、插入文本三处设置都是带 `${变量}` 占位符的模板。
//! 本模块只做一件事：按一次粘贴的上下文把占位符替换成实际值。
//! 未知变量原样保留（不报错），便于用户在模板里写出字面量 `${...}`。
//!
//! # 实现思路
//!
//! - 占位符语法 `${identifier}`，identifier 为 `[A-Za-z0-9_]+`。
//! - 正则通过 `once_cell::sync::Lazy` 首次使用时编译，后续复用。
//! - `TemplateContext` 每次粘贴重新构建，构建后不可变。

use std::borrow::Cow;

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::paste::ActiveDocument;

/// 占位符正则：`${identifier}`
static VARIABLE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{(\w+)\}").unwrap());

pub const VAR_CURRENT_FILE_DIR: &str = "currentFileDir";
pub const VAR_CURRENT_FILE_NAME: &str = "currentFileName";
pub const VAR_CURRENT_FILE_NAME_WITHOUT_EXT: &str = "currentFileNameWithoutExt";
pub const VAR_TIMESTAMP: &str = "timestamp";
pub const VAR_CLIPBOARD_IMAGE_TYPE: &str = "clipboardImageType";
pub const VAR_VAULT_PATH: &str = "vaultPath";
pub const VAR_IMAGE_FILE_NAME: &str = "imageFileName";

/// 用户可用的全部模板变量名（用于 `vars` 预览与帮助文本）
pub const TEMPLATE_VARIABLES: [&str; 7] = [
    VAR_CURRENT_FILE_DIR,
    VAR_CURRENT_FILE_NAME,
    VAR_CURRENT_FILE_NAME_WITHOUT_EXT,
    VAR_TIMESTAMP,
    VAR_CLIPBOARD_IMAGE_TYPE,
    VAR_VAULT_PATH,
    VAR_IMAGE_FILE_NAME,
];

/// 一次粘贴的模板上下文。
///
/// `image_file_name` 只有在最终文件名确定后才会设置，
/// 因此在目录 / 文件名模板里 `${imageFileName}` 会原样保留。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateContext {
    pub current_file_dir: String,
    pub current_file_name: String,
    pub current_file_name_without_ext: String,
    pub timestamp: String,
    pub clipboard_image_type: String,
    pub vault_path: String,
    pub image_file_name: Option<String>,
}

impl TemplateContext {
    /// 根据活动文档、图片格式、Vault 路径与时间戳构建上下文。
    pub fn build(
        document: Option<&ActiveDocument>,
        clipboard_image_type: &str,
        vault_path: &str,
        timestamp: &str,
    ) -> Self {
        let (dir, name, stem) = match document {
            Some(doc) => (
                doc.parent_folder.clone(),
                doc.name.clone(),
                doc.name_without_ext.clone(),
            ),
            None => (String::new(), String::new(), String::new()),
        };

        Self {
            current_file_dir: dir,
            current_file_name: name,
            current_file_name_without_ext: stem,
            timestamp: timestamp.to_string(),
            clipboard_image_type: clipboard_image_type.to_string(),
            vault_path: vault_path.to_string(),
            image_file_name: None,
        }
    }

    /// 返回带最终文件名的新上下文，原上下文不变。
    pub fn with_image_file_name(&self, file_name: &str) -> Self {
        Self {
            image_file_name: Some(file_name.to_string()),
            ..self.clone()
        }
    }

    /// 按变量名查找值；未知变量或尚未设置的 `imageFileName` 返回 `None`。
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            VAR_CURRENT_FILE_DIR => Some(&self.current_file_dir),
            VAR_CURRENT_FILE_NAME => Some(&self.current_file_name),
            VAR_CURRENT_FILE_NAME_WITHOUT_EXT => Some(&self.current_file_name_without_ext),
            VAR_TIMESTAMP => Some(&self.timestamp),
            VAR_CLIPBOARD_IMAGE_TYPE => Some(&self.clipboard_image_type),
            VAR_VAULT_PATH => Some(&self.vault_path),
            VAR_IMAGE_FILE_NAME => self.image_file_name.as_deref(),
            _ => None,
        }
    }
}

/// 展开模板中的 `${identifier}` 占位符。
///
/// 纯函数：未知变量保持原文，不含占位符的模板原样返回。
///
/// # 示例
/// ```
/// use image_paste::template::{expand_template, TemplateContext};
///
/// let ctx = TemplateContext::default();
/// assert_eq!(expand_template("${unknown}", &ctx), "${unknown}");
/// ```
pub fn expand_template(template: &str, context: &TemplateContext) -> String {
    let expanded: Cow<'_, str> = VARIABLE_PATTERN.replace_all(template, |caps: &Captures<'_>| {
        match context.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        }
    });
    expanded.into_owned()
}

/// 展开插入模板，并把字面量 `\n` 转为真实换行（设置项只能单行输入）。
pub fn expand_insert_text(pattern: &str, context: &TemplateContext) -> String {
    expand_template(pattern, context).replace("\\n", "\n")
}

/// 时间戳格式：`YYMMDD_HHMMSS`
pub fn format_timestamp(datetime: &NaiveDateTime) -> String {
    datetime.format("%y%m%d_%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn sample_context() -> TemplateContext {
        let doc = ActiveDocument::from_path("notes/daily/a.md");
        TemplateContext::build(Some(&doc), "png", "/home/me/vault", "240102_030405")
    }

    #[test]
    fn expands_known_variables() {
        let ctx = sample_context();
        assert_eq!(
            expand_template("${currentFileDir}/images/${currentFileNameWithoutExt}", &ctx),
            "notes/daily/images/a"
        );
        assert_eq!(expand_template("${currentFileName}.${clipboardImageType}", &ctx), "a.md.png");
        assert_eq!(expand_template("${vaultPath}", &ctx), "/home/me/vault");
    }

    #[test]
    fn unknown_placeholders_are_left_verbatim() {
        assert_eq!(expand_template("${unknown}", &TemplateContext::default()), "${unknown}");
        assert_eq!(expand_template("a${nope}b${timestamp}", &sample_context()), "a${nope}b240102_030405");
    }

    #[test]
    fn image_file_name_only_expands_once_set() {
        let ctx = sample_context();
        assert_eq!(expand_template("![[${imageFileName}]]", &ctx), "![[${imageFileName}]]");

        let ctx = ctx.with_image_file_name("x.png");
        assert_eq!(expand_template("![[${imageFileName}]]", &ctx), "![[x.png]]");
    }

    #[test]
    fn malformed_placeholders_are_untouched() {
        let ctx = sample_context();
        assert_eq!(expand_template("${timestamp", &ctx), "${timestamp");
        assert_eq!(expand_template("$timestamp", &ctx), "$timestamp");
        assert_eq!(expand_template("${}", &ctx), "${}");
    }

    #[test]
    fn insert_text_turns_escaped_newlines_into_real_ones() {
        let ctx = sample_context().with_image_file_name("x.png");
        assert_eq!(expand_insert_text("![[${imageFileName}]]\\n", &ctx), "![[x.png]]\n");
    }

    #[test]
    fn timestamp_uses_two_digit_year_and_underscore() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(3, 4, 5))
            .expect("valid datetime");
        assert_eq!(format_timestamp(&dt), "240102_030405");
    }

    proptest! {
        #[test]
        fn templates_without_placeholders_are_unchanged(s in "[^$]*") {
            prop_assert_eq!(expand_template(&s, &sample_context()), s);
        }
    }
}
