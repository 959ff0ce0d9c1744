//! 设置模块
//!
//! # 设计思路
//!
//! `Settings` 是不可变值：每次修改都通过净化构造生成一份新值并整体替换，
//! 避免"改了一半"的不一致状态。持久化格式是扁平 JSON 记录（camelCase 键名），
//! 缺失或非法字段在加载时被默认值填补。
//!
//! # 实现思路
//!
//! - `RawSettings`：磁盘 / 外部输入的宽松形态，所有字段可缺省。
//! - `Settings::sanitized`：纯函数，填补默认值并强制不变量。
//! - `Settings::with_patch`：面向设置界面的更新入口，非法输入直接报错而不是静默回退。
//! - `SettingsStore`：JSON 读写；文件不存在或无法解析时回退为默认设置。

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PasteError;
use crate::path::validate_relative_path;
use crate::template::VAR_IMAGE_FILE_NAME;

pub const DEFAULT_IMAGE_FOLDER_PATH: &str = "${currentFileDir}/images";
pub const DEFAULT_NAME: &str = "image${timestamp}";
pub const DEFAULT_NAME_PREFIX: &str = "${currentFileNameWithoutExt}_";
pub const DEFAULT_INSERT_PATTERN: &str =
    "<img src='./images/${imageFileName}' alt='image' style='width: 600px; border: 1px solid black;'>";
pub const DEFAULT_SUPPORTED_FORMATS: [&str; 3] = ["png", "jpg", "gif"];

/// 插入模板缺少 `${imageFileName}` 时在粘贴阶段使用的兜底模板
pub const FALLBACK_INSERT_PATTERN: &str = "![[${imageFileName}]]";

const MAX_NAME_PREFIX_CHARS: usize = 64;

fn image_file_name_placeholder() -> String {
    format!("${{{}}}", VAR_IMAGE_FILE_NAME)
}

/// 已净化的设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub image_folder_path: String,
    pub default_name: String,
    pub name_prefix: String,
    pub insert_pattern: String,
    pub supported_formats: Vec<String>,
}

/// 持久化 / 外部输入的宽松形态
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSettings {
    pub image_folder_path: Option<String>,
    pub default_name: Option<String>,
    pub name_prefix: Option<String>,
    pub insert_pattern: Option<String>,
    pub supported_formats: Option<Vec<serde_json::Value>>,
}

/// 局部更新：只包含要修改的字段
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub image_folder_path: Option<String>,
    pub default_name: Option<String>,
    pub name_prefix: Option<String>,
    pub insert_pattern: Option<String>,
    pub supported_formats: Option<Vec<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            image_folder_path: DEFAULT_IMAGE_FOLDER_PATH.to_string(),
            default_name: DEFAULT_NAME.to_string(),
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            insert_pattern: DEFAULT_INSERT_PATTERN.to_string(),
            supported_formats: DEFAULT_SUPPORTED_FORMATS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn sanitize_template(value: Option<&str>, fallback: &str) -> String {
    match value.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => trimmed.to_string(),
        _ => fallback.to_string(),
    }
}

/// 格式列表：去空白、小写、去重（保持首次出现顺序）。
pub fn sanitize_formats<I, S>(formats: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    formats
        .into_iter()
        .map(|entry| entry.as_ref().trim().to_lowercase())
        .filter(|entry| !entry.is_empty())
        .filter(|entry| seen.insert(entry.clone()))
        .collect()
}

impl Settings {
    /// 纯净化构造：填补缺省值并强制全部不变量。
    ///
    /// - 目录模板去首尾空白（可为空，表示 Vault 根目录）
    /// - 文件名模板、插入模板为空时回退默认值
    /// - 插入模板必须包含 `${imageFileName}`，否则回退默认值
    /// - 前缀去空白并截断到 64 字符，显式空串表示不加前缀
    /// - 格式列表净化后为空时回退默认列表
    pub fn sanitized(raw: RawSettings) -> Self {
        let placeholder = image_file_name_placeholder();

        let mut insert_pattern = sanitize_template(raw.insert_pattern.as_deref(), DEFAULT_INSERT_PATTERN);
        if !insert_pattern.contains(&placeholder) {
            log::warn!("插入模板缺少 {}，已回退默认模板", placeholder);
            insert_pattern = DEFAULT_INSERT_PATTERN.to_string();
        }

        let name_prefix = match raw.name_prefix.as_deref() {
            Some(prefix) => prefix.trim().chars().take(MAX_NAME_PREFIX_CHARS).collect(),
            None => DEFAULT_NAME_PREFIX.to_string(),
        };

        let supported_formats = raw
            .supported_formats
            .map(|values| {
                sanitize_formats(values.iter().map(|value| value.as_str().unwrap_or_default()))
            })
            .filter(|formats| !formats.is_empty())
            .unwrap_or_else(|| Settings::default().supported_formats);

        Self {
            image_folder_path: raw
                .image_folder_path
                .map(|folder| folder.trim().to_string())
                .unwrap_or_else(|| DEFAULT_IMAGE_FOLDER_PATH.to_string()),
            default_name: sanitize_template(raw.default_name.as_deref(), DEFAULT_NAME),
            name_prefix,
            insert_pattern,
            supported_formats,
        }
    }

    /// 应用局部更新，返回新的设置值；非法输入返回 `Settings` / `InvalidPath` 错误。
    pub fn with_patch(&self, patch: SettingsPatch) -> Result<Settings, PasteError> {
        let mut next = self.clone();

        if let Some(folder) = patch.image_folder_path {
            let trimmed = folder.trim();
            validate_relative_path(trimmed)?;
            next.image_folder_path = trimmed.to_string();
        }

        if let Some(name) = patch.default_name {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(PasteError::Settings("文件名模板不能为空".to_string()));
            }
            next.default_name = trimmed.to_string();
        }

        if let Some(prefix) = patch.name_prefix {
            next.name_prefix = prefix.trim().chars().take(MAX_NAME_PREFIX_CHARS).collect();
        }

        if let Some(pattern) = patch.insert_pattern {
            let trimmed = pattern.trim();
            let placeholder = image_file_name_placeholder();
            if !trimmed.contains(&placeholder) {
                return Err(PasteError::Settings(format!("插入模板必须包含 {}", placeholder)));
            }
            next.insert_pattern = trimmed.to_string();
        }

        if let Some(formats) = patch.supported_formats {
            let sanitized = sanitize_formats(formats);
            if sanitized.is_empty() {
                return Err(PasteError::Settings("至少需要指定一种图片格式".to_string()));
            }
            next.supported_formats = sanitized;
        }

        Ok(next)
    }

    /// 转为持久化形态
    pub fn to_raw(&self) -> RawSettings {
        RawSettings {
            image_folder_path: Some(self.image_folder_path.clone()),
            default_name: Some(self.default_name.clone()),
            name_prefix: Some(self.name_prefix.clone()),
            insert_pattern: Some(self.insert_pattern.clone()),
            supported_formats: Some(
                self.supported_formats
                    .iter()
                    .map(|f| serde_json::Value::String(f.clone()))
                    .collect(),
            ),
        }
    }
}

/// 设置文件读写
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Vault 内的默认设置文件位置
    pub fn default_path(vault_root: &Path) -> PathBuf {
        vault_root.join(".image-paste").join("settings.json")
    }

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 加载设置；文件不存在或无法解析时返回默认设置。
    pub fn load(&self) -> Settings {
        if !self.path.exists() {
            return Settings::default();
        }

        let raw = match fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str::<RawSettings>(&content).unwrap_or_else(|e| {
                log::warn!("解析设置文件失败，使用默认设置: {} ({})", e, self.path.display());
                RawSettings::default()
            }),
            Err(e) => {
                log::warn!("读取设置文件失败，使用默认设置: {} ({})", e, self.path.display());
                RawSettings::default()
            }
        };
        Settings::sanitized(raw)
    }

    pub fn save(&self, settings: &Settings) -> Result<(), PasteError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| PasteError::Settings(format!("创建设置目录失败: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(&settings.to_raw())
            .map_err(|e| PasteError::Settings(format!("序列化设置失败: {}", e)))?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}
