//! 文件系统宿主
//!
//! # 设计思路
//!
//! 命令行下没有编辑器，宿主能力由本地文件系统提供：
//! - `FsVault`：以某个目录为 Vault 根，所有路径都是相对该根的路径
//! - `NoteWorkspace`：把一个笔记文件当作"活动文档"，光标位置由命令行指定
//!
//! # 实现思路
//!
//! - 文件 I/O 统一走 `tokio::fs`，与编排层的 async 调用链保持一致。
//! - 插入时整体读出笔记、在光标处拼接、再整体写回。
//! - `Print` 模式不改动笔记，只把插入文本输出到 stdout，便于脚本拼接。

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::PasteError;
use crate::paste::{ActiveDocument, VaultAdapter, Workspace};

/// 以本地目录为根的 Vault
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, relative: &str) -> PathBuf {
        if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }
}

impl VaultAdapter for FsVault {
    async fn exists(&self, path: &str) -> Result<bool, PasteError> {
        Ok(tokio::fs::try_exists(self.full_path(path)).await?)
    }

    async fn mkdir(&self, path: &str) -> Result<(), PasteError> {
        match tokio::fs::create_dir(self.full_path(path)).await {
            Ok(()) => {
                log::debug!("📁 创建目录: {}", path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_binary(&self, path: &str, bytes: &[u8]) -> Result<(), PasteError> {
        tokio::fs::write(self.full_path(path), bytes).await?;
        log::debug!("💾 写入文件: {} ({} 字节)", path, bytes.len());
        Ok(())
    }

    fn base_path(&self) -> Option<PathBuf> {
        Some(self.root.clone())
    }
}

/// 插入位置（行列均从 1 开始，列按字符计）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    End,
    At { line: usize, column: usize },
}

impl std::str::FromStr for Cursor {
    type Err = String;

    /// 解析 `行:列`，或 `end`。
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("end") {
            return Ok(Cursor::End);
        }
        let (line, column) = s
            .split_once(':')
            .ok_or_else(|| format!("光标位置格式应为 行:列，实际为 {}", s))?;
        let line: usize = line.trim().parse().map_err(|_| format!("无效的行号: {}", line))?;
        let column: usize = column.trim().parse().map_err(|_| format!("无效的列号: {}", column))?;
        if line == 0 || column == 0 {
            return Err("行号与列号从 1 开始".to_string());
        }
        Ok(Cursor::At { line, column })
    }
}

/// 插入方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMode {
    Splice(Cursor),
    Print,
}

/// 单个笔记文件构成的工作区
#[derive(Debug, Clone)]
pub struct NoteWorkspace {
    vault_root: PathBuf,
    note: String,
    mode: InsertMode,
}

impl NoteWorkspace {
    /// `note` 为 Vault 相对路径。
    pub fn new(vault_root: impl Into<PathBuf>, note: &str, mode: InsertMode) -> Self {
        Self {
            vault_root: vault_root.into(),
            note: note.replace('\\', "/"),
            mode,
        }
    }

    pub fn note_path(&self) -> PathBuf {
        self.vault_root.join(&self.note)
    }
}

/// 计算光标对应的字节偏移；越界的行 / 列收缩到末尾。
pub fn cursor_offset(content: &str, cursor: Cursor) -> usize {
    let (line, column) = match cursor {
        Cursor::End => return content.len(),
        Cursor::At { line, column } => (line, column),
    };

    let mut line_start = 0;
    for _ in 1..line {
        match content[line_start..].find('\n') {
            Some(pos) => line_start += pos + 1,
            None => return content.len(),
        }
    }

    let line_end = content[line_start..]
        .find('\n')
        .map(|pos| line_start + pos)
        .unwrap_or(content.len());
    let line_text = &content[line_start..line_end];

    line_text
        .char_indices()
        .nth(column.saturating_sub(1))
        .map(|(idx, _)| line_start + idx)
        .unwrap_or(line_end)
}

impl Workspace for NoteWorkspace {
    fn active_document(&self) -> Option<ActiveDocument> {
        if self.note.trim().is_empty() || !self.note_path().is_file() {
            return None;
        }
        Some(ActiveDocument::from_path(&self.note))
    }

    async fn insert_at_cursor(&self, text: &str) -> Result<(), PasteError> {
        let cursor = match self.mode {
            InsertMode::Print => {
                println!("{}", text);
                return Ok(());
            }
            InsertMode::Splice(cursor) => cursor,
        };

        let path = self.note_path();
        let mut content = tokio::fs::read_to_string(&path).await?;
        let offset = cursor_offset(&content, cursor);
        content.insert_str(offset, text);
        tokio::fs::write(&path, content).await?;

        log::info!("📝 已插入到 {} (偏移 {})", self.note, offset);
        Ok(())
    }

    fn notice(&self, message: &str) {
        eprintln!("{}", message);
    }
}
