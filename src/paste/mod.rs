//! # 粘贴编排模块（paste）
//!
//! ## 设计思路
//!
//! 宿主编辑器（文件系统、编辑器、提示框）一律作为注入能力，核心逻辑不直接依赖任何宿主：
//!
//! - `VaultAdapter`：Vault 内的存在性检查、建目录、写二进制
//! - `Workspace`：活动文档、光标处插入文本、用户提示
//!
//! `PasteHandler` 只负责编排，子步骤分别委托 `template / path / sanitize / storage / clipboard`。
//!
//! ## 调用链
//!
//! ```text
//! run_command（捕获错误 → 一条提示）
//!    ↓
//! handle_paste（单飞守卫）
//!    ├─ clipboard::read_clipboard（按序尝试提供者）
//!    ├─ path::resolve_folder_path
//!    ├─ sanitize::sanitize_base_name
//!    ├─ storage::generate_unique_file_name
//!    ├─ storage::ensure_folder_exists
//!    ├─ VaultAdapter::write_binary
//!    └─ Workspace::insert_at_cursor
//! ```

mod guard;
mod handler;

use std::path::PathBuf;

use crate::error::PasteError;
use crate::path::parent_folder;

pub use handler::{PasteHandler, PasteOutcome, PastePlan};

/// 活动文档描述（路径均为 Vault 相对路径，分隔符为 `/`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDocument {
    pub path: String,
    pub name: String,
    pub name_without_ext: String,
    pub parent_folder: String,
}

impl ActiveDocument {
    /// 从 Vault 相对路径推导文件名、主干名与父目录。
    pub fn from_path(path: &str) -> Self {
        let path = path.replace('\\', "/");
        let name = path.rsplit('/').next().unwrap_or_default().to_string();
        let name_without_ext = match name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem.to_string(),
            _ => name.clone(),
        };
        let parent = parent_folder(&path).to_string();

        Self {
            path,
            name,
            name_without_ext,
            parent_folder: parent,
        }
    }
}

/// Vault 文件系统能力（路径均为 Vault 相对路径）
#[allow(async_fn_in_trait)]
pub trait VaultAdapter {
    async fn exists(&self, path: &str) -> Result<bool, PasteError>;

    /// 只创建单级目录，上级目录由调用方保证存在。
    async fn mkdir(&self, path: &str) -> Result<(), PasteError>;

    async fn write_binary(&self, path: &str, bytes: &[u8]) -> Result<(), PasteError>;

    /// Vault 根目录的绝对路径；宿主不暴露时返回 `None`，此时跳过越界检查。
    fn base_path(&self) -> Option<PathBuf>;
}

/// 编辑器工作区能力
#[allow(async_fn_in_trait)]
pub trait Workspace {
    fn active_document(&self) -> Option<ActiveDocument>;

    /// 用文本替换当前选区（无选区时即在光标处插入）。
    async fn insert_at_cursor(&self, text: &str) -> Result<(), PasteError>;

    /// 面向用户的一次性提示。
    fn notice(&self, message: &str);
}
