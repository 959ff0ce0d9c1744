//! Vault 内路径解析模块
//!
//! # 设计思路
//!
//! 保存目录由用户模板展开得到，必须被限制在 Vault 根目录之内。
//! 解析失败时直接返回错误，而不是静默地把路径"夹"回 Vault。
//!
//! # 实现思路
//!
//! 1. 展开模板并去掉首尾空白，空串表示 Vault 根目录
//! 2. 规范化分隔符（`\` → `/`、合并重复 `/`、去掉 `.` 段与末尾 `/`）
//! 3. 展开结果为绝对路径或含 `..` 段 → `InvalidPath`（开头展开为空的变量及其后的分隔符先被跳过）
//! 4. 相对 Vault 根做词法解析，结果不在根目录下 → `BoundaryViolation`
//!
//! 全程只做字符串 / 词法运算，不访问文件系统。

use std::path::{Component, Path, PathBuf};

use crate::error::PasteError;
use crate::template::{expand_template, TemplateContext};

/// 规范化 Vault 内路径（保留开头的 `/`，交给校验阶段判断）。
pub fn normalize_path(input: &str) -> String {
    let replaced = input.replace('\\', "/").replace('\u{00A0}', " ");
    let absolute = replaced.starts_with('/');
    let joined = replaced
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/");

    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

fn is_absolute_like(path: &str) -> bool {
    if path.starts_with('/') || path.starts_with('\\') {
        return true;
    }
    // Windows 盘符，如 `C:` / `c:/x`
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// 校验相对路径：拒绝绝对路径与 `..` 段。
///
/// 也用于保存设置时对目录模板做静态检查。
pub fn validate_relative_path(path: &str) -> Result<(), PasteError> {
    if path.is_empty() {
        return Ok(());
    }
    if is_absolute_like(path) {
        return Err(PasteError::InvalidPath(
            "不能使用绝对路径，请使用 Vault 内的相对路径。".to_string(),
        ));
    }
    if path.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(PasteError::InvalidPath("路径中不能包含 .. 段。".to_string()));
    }
    Ok(())
}

/// 词法规范化：处理 `.` 与 `..`，不解析符号链接。
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// 确认相对路径解析后仍位于 Vault 根目录下。
pub fn ensure_vault_boundary(vault_root: &Path, relative: &str) -> Result<(), PasteError> {
    let root = lexical_normalize(vault_root);
    let resolved = lexical_normalize(&root.join(relative));
    if !resolved.starts_with(&root) {
        return Err(PasteError::BoundaryViolation(format!(
            "不能使用 Vault 之外的路径：{}",
            resolved.display()
        )));
    }
    Ok(())
}

/// 跳过开头展开为空串的变量及其后的分隔符。
///
/// 根目录下的文档 `${currentFileDir}` 为空，`${currentFileDir}/images` 应得到 `images`
/// 而不是 `/images`；其余展开成绝对路径的模板仍由校验阶段拒绝。
fn skip_empty_leading_variables<'a>(template: &'a str, context: &TemplateContext) -> &'a str {
    let mut rest = template.trim_start();
    let mut skipped = false;
    while let Some(after) = rest.strip_prefix("${") {
        let Some((name, tail)) = after.split_once('}') else {
            break;
        };
        if context.get(name) != Some("") {
            break;
        }
        rest = tail;
        skipped = true;
    }

    if skipped {
        rest.trim_start_matches(['/', '\\'])
    } else {
        template
    }
}

/// 展开保存目录模板并校验。
///
/// # 返回
/// - `Ok("")` — Vault 根目录
/// - `Ok(path)` — 规范化后的 Vault 相对路径
/// - `Err(InvalidPath | BoundaryViolation)`
pub fn resolve_folder_path(
    template: &str,
    context: &TemplateContext,
    vault_root: Option<&Path>,
) -> Result<String, PasteError> {
    let expanded = expand_template(skip_empty_leading_variables(template, context), context);
    let trimmed = expanded.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }

    let normalized = normalize_path(trimmed);
    validate_relative_path(&normalized)?;
    if let Some(root) = vault_root {
        ensure_vault_boundary(root, &normalized)?;
    }
    Ok(normalized)
}

/// 拼接目录与文件名，目录为空时直接返回文件名。
pub fn combine_path(folder: &str, file_name: &str) -> String {
    if folder.is_empty() {
        normalize_path(file_name)
    } else {
        normalize_path(&format!("{}/{}", folder, file_name))
    }
}

/// 取父目录；没有 `/` 时返回空串（Vault 根）。
pub fn parent_folder(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((parent, _)) => parent,
        None => "",
    }
}
