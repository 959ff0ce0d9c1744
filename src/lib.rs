//! # 剪贴板图片粘贴工具 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 宿主 (编辑器插件 / 命令行)                 │
//! │                                                          │
//! │  VaultAdapter (exists · mkdir · write_binary)            │
//! │  Workspace    (active_document · insert_at_cursor · notice)│
//! └───────┬──────────────────────────────────────────────────┘
//!         ↕ 注入能力 (Result<T, PasteError>)
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            核心 (Rust)                           │
//! │                                                          │
//! │  ┌─ paste ────── PasteHandler 编排 + 单飞守卫 (RAII)      │
//! │  │                                                       │
//! │  ├─ clipboard ── 原生 / 媒体类型 两条读取途径             │
//! │  ├─ template     ${变量} 展开                             │
//! │  ├─ path         目录解析 + Vault 越界检查                │
//! │  ├─ sanitize     文件名净化 + 长度截断                    │
//! │  ├─ storage      重名回避 + 逐级建目录                    │
//! │  ├─ settings     设置净化 / 更新 / JSON 持久化            │
//! │  └─ error        PasteError (统一错误类型)                │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `PasteError`，错误码与用户提示 |
//! | [`template`] | 模板上下文与 `${identifier}` 展开 |
//! | [`path`] | 保存目录解析、规范化与越界检查 |
//! | [`sanitize`] | 文件名非法字符替换、保留名处理、长度截断 |
//! | [`storage`] | 目标目录内的重名回避与目录创建 |
//! | [`clipboard`] | 按序尝试各剪贴板途径，返回被允许的图片 |
//! | [`settings`] | 设置的净化、局部更新与 JSON 读写 |
//! | [`paste`] | 宿主能力接口与粘贴流程编排 |
//! | [`vault`] | 基于本地文件系统的宿主实现 |

pub mod error;
pub mod template;
pub mod path;
pub mod sanitize;
pub mod storage;
pub mod clipboard;
pub mod settings;
pub mod paste;
pub mod vault;
