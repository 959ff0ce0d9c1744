use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::Notify;

use image_paste::clipboard::{ClipboardImage, ClipboardProvider};
use image_paste::error::PasteError;
use image_paste::paste::{ActiveDocument, PasteHandler, VaultAdapter, Workspace};
use image_paste::settings::Settings;

#[derive(Default)]
struct MemoryVault {
    files: RefCell<HashMap<String, Vec<u8>>>,
    dirs: RefCell<HashSet<String>>,
    io_calls: Cell<usize>,
    /// 设置后，写入会先通知 `entered` 再等待 `release`
    gate: Option<(Notify, Notify)>,
}

impl VaultAdapter for MemoryVault {
    async fn exists(&self, path: &str) -> Result<bool, PasteError> {
        self.io_calls.set(self.io_calls.get() + 1);
        Ok(self.files.borrow().contains_key(path) || self.dirs.borrow().contains(path))
    }

    async fn mkdir(&self, path: &str) -> Result<(), PasteError> {
        self.io_calls.set(self.io_calls.get() + 1);
        self.dirs.borrow_mut().insert(path.to_string());
        Ok(())
    }

    async fn write_binary(&self, path: &str, bytes: &[u8]) -> Result<(), PasteError> {
        self.io_calls.set(self.io_calls.get() + 1);
        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }
        self.files.borrow_mut().insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn base_path(&self) -> Option<PathBuf> {
        Some(PathBuf::from("/vault"))
    }
}

#[derive(Default)]
struct MemoryWorkspace {
    document: Option<String>,
    inserted: RefCell<Vec<String>>,
    notices: RefCell<Vec<String>>,
}

impl Workspace for MemoryWorkspace {
    fn active_document(&self) -> Option<ActiveDocument> {
        self.document.as_deref().map(ActiveDocument::from_path)
    }

    async fn insert_at_cursor(&self, text: &str) -> Result<(), PasteError> {
        self.inserted.borrow_mut().push(text.to_string());
        Ok(())
    }

    fn notice(&self, message: &str) {
        self.notices.borrow_mut().push(message.to_string());
    }
}

struct StaticProvider(Option<ClipboardImage>);

impl ClipboardProvider for StaticProvider {
    fn name(&self) -> &'static str {
        "static"
    }

    fn try_read(&self, _allowed: &[String]) -> Result<Option<ClipboardImage>, PasteError> {
        Ok(self.0.clone())
    }
}

fn clock() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .and_then(|d| d.and_hms_opt(3, 4, 5))
        .expect("valid datetime")
}

fn image(format: &str) -> ClipboardImage {
    ClipboardImage {
        bytes: vec![7, 7, 7],
        format: format.to_string(),
    }
}

fn example_settings() -> Settings {
    Settings {
        image_folder_path: "${currentFileDir}/images".to_string(),
        default_name: "img${timestamp}".to_string(),
        name_prefix: String::new(),
        insert_pattern: "![[${imageFileName}]]".to_string(),
        supported_formats: vec!["png".to_string()],
    }
}

fn build(
    vault: MemoryVault,
    document: Option<&str>,
    image: Option<ClipboardImage>,
    settings: Settings,
) -> PasteHandler<MemoryVault, MemoryWorkspace> {
    let workspace = MemoryWorkspace {
        document: document.map(str::to_string),
        ..Default::default()
    };
    PasteHandler::new(vault, workspace, vec![Arc::new(StaticProvider(image))], settings).with_clock(clock)
}

#[tokio::test]
async fn pastes_png_next_to_note() {
    let handler = build(MemoryVault::default(), Some("notes/a.md"), Some(image("png")), example_settings());

    let outcome = handler.run_command().await.expect("paste succeeds");

    assert_eq!(outcome.file_path, "notes/images/img240102_030405.png");
    assert_eq!(
        handler.vault().files.borrow().get("notes/images/img240102_030405.png"),
        Some(&vec![7, 7, 7])
    );
    assert_eq!(
        *handler.workspace().inserted.borrow(),
        vec!["![[img240102_030405.png]]".to_string()]
    );
    assert!(handler.workspace().notices.borrow().is_empty());
}

#[tokio::test]
async fn second_paste_while_busy_is_rejected_without_io() {
    let vault = MemoryVault {
        gate: Some((Notify::new(), Notify::new())),
        ..Default::default()
    };
    let handler = build(vault, Some("notes/a.md"), Some(image("png")), example_settings());

    let first = handler.handle_paste();
    let second = async {
        let (entered, release) = handler.vault().gate.as_ref().expect("gate");
        entered.notified().await;

        let calls_before = handler.vault().io_calls.get();
        let result = handler.handle_paste().await;
        let calls_after = handler.vault().io_calls.get();

        release.notify_one();
        (result, calls_after - calls_before)
    };

    let (first, (second, extra_io)) = tokio::join!(first, second);

    assert!(first.is_ok());
    assert!(matches!(second, Err(PasteError::Busy)));
    assert_eq!(extra_io, 0);
    assert_eq!(handler.vault().files.borrow().len(), 1);
}

#[tokio::test]
async fn no_active_document_notices_once() {
    let handler = build(MemoryVault::default(), None, Some(image("png")), example_settings());

    assert!(handler.run_command().await.is_none());
    assert_eq!(*handler.workspace().notices.borrow(), vec![PasteError::NoEditor.notice()]);
    assert_eq!(handler.vault().io_calls.get(), 0);
}

#[tokio::test]
async fn empty_clipboard_notices_no_image() {
    let handler = build(MemoryVault::default(), Some("a.md"), None, example_settings());

    assert!(handler.run_command().await.is_none());
    assert_eq!(*handler.workspace().notices.borrow(), vec![PasteError::NoImage.notice()]);
}

#[tokio::test]
async fn disallowed_format_is_rejected() {
    let handler = build(MemoryVault::default(), Some("a.md"), Some(image("JPEG")), example_settings());

    match handler.handle_paste().await {
        Err(PasteError::UnsupportedFormat { format, allowed }) => {
            assert_eq!(format, "jpg");
            assert_eq!(allowed, "png");
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(handler.vault().files.borrow().is_empty());
}

#[tokio::test]
async fn escaping_folder_template_writes_nothing() {
    let mut settings = example_settings();
    settings.image_folder_path = "${currentFileDir}/../../outside".to_string();
    let handler = build(MemoryVault::default(), Some("notes/a.md"), Some(image("png")), settings);

    assert!(handler.run_command().await.is_none());
    assert!(handler.vault().files.borrow().is_empty());
    assert!(handler.workspace().inserted.borrow().is_empty());
    assert_eq!(handler.workspace().notices.borrow().len(), 1);
}

#[tokio::test]
async fn existing_file_gets_numbered_suffix() {
    let vault = MemoryVault::default();
    vault
        .files
        .borrow_mut()
        .insert("notes/images/img240102_030405.png".to_string(), vec![1]);
    vault
        .files
        .borrow_mut()
        .insert("notes/images/img240102_030405 (1).png".to_string(), vec![1]);
    let handler = build(vault, Some("notes/a.md"), Some(image("png")), example_settings());

    let outcome = handler.handle_paste().await.expect("paste succeeds");
    assert_eq!(outcome.file_name, "img240102_030405 (2).png");
}

#[tokio::test]
async fn folder_template_may_target_vault_root() {
    let mut settings = example_settings();
    settings.image_folder_path = String::new();
    let handler = build(MemoryVault::default(), Some("notes/a.md"), Some(image("png")), settings);

    let outcome = handler.handle_paste().await.expect("paste succeeds");
    assert_eq!(outcome.file_path, "img240102_030405.png");
    assert!(handler.vault().dirs.borrow().is_empty());
}
