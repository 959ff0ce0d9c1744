//! 图片存储位置管理模块
//!
//! # 设计思路
//!
//! 负责两件与 Vault 目录相关的事：
//! - **重名回避**：在目标目录中探测已存在文件，追加 ` (n)` 直到找到空闲文件名
//! - **目录创建**：逐级检查并创建缺失的目录段
//!
//! # 实现思路
//!
//! - 探测次数有硬上限（`MAX_DUPLICATE_ATTEMPTS`），不会无限循环。
//! - 探测结果与之后的写入不是原子的：并发写入者之间的竞态被接受（尽力而为）。
//! - 逐级建目录：先查后建，每一级都是幂等的。

use crate::error::PasteError;
use crate::paste::VaultAdapter;
use crate::path::combine_path;
use crate::sanitize::{clamp_name_length, sanitize_base_name, DEFAULT_FALLBACK_NAME, DEFAULT_MAX_NAME_LENGTH};

/// 第 0 次使用原名，之后最多追加 ` (1)` … ` (100)`，共 101 次探测。
pub const MAX_DUPLICATE_ATTEMPTS: usize = 100;

/// 生成目标目录下不存在的文件名（只返回文件名，不含目录）。
///
/// # 参数
/// * `vault` - Vault 能力，仅使用 `exists`
/// * `folder` - Vault 相对目录，空串为根目录
/// * `base_name` - 已净化的文件名主体
/// * `extension` - 扩展名（不含点），为空时使用 `png`
///
/// # 返回
/// - `Ok(file_name)` — 第一个空闲文件名
/// - `Err(NameExhaustion)` — 101 次探测均已存在
/// - `Err(NameTooLong)` — 扩展名超出长度上限
pub async fn generate_unique_file_name<V: VaultAdapter>(
    vault: &V,
    folder: &str,
    base_name: &str,
    extension: &str,
) -> Result<String, PasteError> {
    let extension = if extension.is_empty() { "png" } else { extension };

    for attempt in 0..=MAX_DUPLICATE_ATTEMPTS {
        let suffix = if attempt == 0 {
            String::new()
        } else {
            format!(" ({})", attempt)
        };
        let candidate_base = sanitize_base_name(&format!("{}{}", base_name, suffix), DEFAULT_FALLBACK_NAME);
        let file_name = clamp_name_length(&candidate_base, extension, DEFAULT_MAX_NAME_LENGTH)?;
        let candidate_path = combine_path(folder, &file_name);

        if !vault.exists(&candidate_path).await? {
            if attempt > 0 {
                log::debug!("🔁 文件名重名，第 {} 次尝试得到：{}", attempt, file_name);
            }
            return Ok(file_name);
        }
    }

    Err(PasteError::NameExhaustion {
        attempts: MAX_DUPLICATE_ATTEMPTS,
    })
}

/// 逐级确保目录存在，空串（Vault 根）直接返回。
pub async fn ensure_folder_exists<V: VaultAdapter>(vault: &V, folder: &str) -> Result<(), PasteError> {
    if folder.is_empty() {
        return Ok(());
    }

    let mut current = String::new();
    for segment in folder.split('/').filter(|s| !s.is_empty()) {
        if current.is_empty() {
            current.push_str(segment);
        } else {
            current.push('/');
            current.push_str(segment);
        }

        if !vault.exists(&current).await? {
            log::debug!("📁 创建目录：{}", current);
            vault.mkdir(&current).await?;
        }
    }
    Ok(())
}
