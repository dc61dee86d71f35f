//! ローカルファイルシステムのサービス実装
//!
//! 文書は下書きディレクトリにファイルとして書き出され、フォルダはディレクトリとして扱われます。
//! ロケーターは`file://`形式のURLです。文書のファイル名が重複する場合は番号を付けて別ファイルにし、
//! `create_file`で作成するファイルは同名のものを上書きします。

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use url::Url;

use crate::api::DocumentFormat;
use crate::document::{Document, DocumentState, StoredDocument};
use crate::error::MergeError;
use crate::output::DocumentRenderer;
use crate::pdf::PdfRenderer;
use crate::security::{sanitize_file_name, validate_file_name};
use crate::services::{DocumentService, Folder, Prompt, Storage, GENERATED_FOLDER_NAME};
use crate::types::Locator;

/// ファイルパスを`file://`ロケーターに変換
fn file_locator(path: &Path) -> Result<Locator, MergeError> {
    let absolute = path.canonicalize()?;
    Url::from_file_path(&absolute)
        .map(|url| Locator::new(url.to_string()))
        .map_err(|_| {
            MergeError::Storage(format!("Cannot build a file URL for {}", absolute.display()))
        })
}

/// `file://`ロケーターをファイルパスに戻す
fn locator_path(locator: &Locator) -> Result<PathBuf, MergeError> {
    Url::parse(locator.as_str())
        .ok()
        .and_then(|url| url.to_file_path().ok())
        .ok_or_else(|| MergeError::Storage(format!("Not a local file locator: {}", locator)))
}

/// 安全なファイル名を組み立てる
fn file_name(title: &str, extension: &str) -> Result<String, MergeError> {
    let name = format!("{}.{}", sanitize_file_name(title), extension);
    validate_file_name(&name)?;
    Ok(name)
}

/// `dir`の中で未使用のパスを返す
///
/// 同名のファイルがあれば`"name (2).ext"`、`"name (3).ext"`と番号を付けます。
/// タイトルが同じ文書でも、ファイルは別々になります。
fn unique_path(dir: &Path, name: &OsStr) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let original = Path::new(name);
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = original
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut n = 2;
    loop {
        let candidate = dir.join(format!("{} ({}){}", stem, n, extension));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// ローカルの文書サービス
///
/// 確定した文書を`drafts_dir`に指定形式（テキスト、Markdown、JSON）で書き出します。
#[derive(Debug)]
pub struct LocalDocumentService {
    drafts_dir: PathBuf,
    format: DocumentFormat,
    next_id: usize,
}

impl LocalDocumentService {
    pub fn new(drafts_dir: impl Into<PathBuf>, format: DocumentFormat) -> Self {
        Self {
            drafts_dir: drafts_dir.into(),
            format,
            next_id: 0,
        }
    }

    pub fn drafts_dir(&self) -> &Path {
        &self.drafts_dir
    }
}

impl DocumentService for LocalDocumentService {
    fn create(&mut self, title: &str) -> Result<Document, MergeError> {
        self.next_id += 1;
        Ok(Document::new(format!("local-{}", self.next_id), title))
    }

    fn save_and_close(&mut self, mut document: Document) -> Result<StoredDocument, MergeError> {
        document.finalize()?;

        fs::create_dir_all(&self.drafts_dir)?;
        let name = file_name(document.title(), self.format.extension())?;
        let path = unique_path(&self.drafts_dir, OsStr::new(&name));

        let mut writer = BufWriter::new(File::create(&path)?);
        DocumentRenderer::from_format(self.format).render(&document, &mut writer)?;
        drop(writer);

        tracing::debug!(path = %path.display(), "document written");
        Ok(StoredDocument {
            locator: file_locator(&path)?,
            location: self.drafts_dir.display().to_string(),
            document,
        })
    }

    fn render_pdf(&mut self, stored: &mut StoredDocument) -> Result<Vec<u8>, MergeError> {
        if !stored.state().can_transition_to(DocumentState::Rendered) {
            return Err(MergeError::InvalidTransition {
                document: stored.title().to_string(),
                from: stored.state(),
                to: DocumentState::Rendered,
            });
        }
        let bytes = PdfRenderer::new().render(&stored.document)?;
        stored.document.transition(DocumentState::Rendered)?;
        Ok(bytes)
    }
}

/// ローカルのストレージ
///
/// ワークブックにパスがない場合、`root`の下に出力フォルダを作成します。
#[derive(Debug)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Storage for LocalStorage {
    fn destination_for(&mut self, workbook: Option<&Path>) -> Result<Folder, MergeError> {
        let dir = match workbook.and_then(Path::parent) {
            Some(parent) if parent.as_os_str().is_empty() => PathBuf::from("."),
            Some(parent) => parent.to_path_buf(),
            None => {
                let dir = self.root.join(GENERATED_FOLDER_NAME);
                fs::create_dir_all(&dir)?;
                tracing::info!(folder = %dir.display(), "output folder created");
                dir
            }
        };

        let name = dir
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| dir.display().to_string());
        Ok(Folder {
            name,
            location: dir.display().to_string(),
        })
    }

    fn relocate(&mut self, stored: &mut StoredDocument, folder: &Folder) -> Result<(), MergeError> {
        if !stored.state().can_transition_to(DocumentState::Relocated) {
            return Err(MergeError::InvalidTransition {
                document: stored.title().to_string(),
                from: stored.state(),
                to: DocumentState::Relocated,
            });
        }

        let source = locator_path(&stored.locator)?;
        let name = source
            .file_name()
            .ok_or_else(|| MergeError::Storage(format!("No file name in {}", source.display())))?;
        let target_dir = PathBuf::from(&folder.location);
        fs::create_dir_all(&target_dir)?;
        let target = if target_dir.join(name).canonicalize().ok() == Some(source.clone()) {
            // すでに移動先にある
            source.clone()
        } else {
            let target = unique_path(&target_dir, name);
            // ディレクトリをまたぐ場合はrenameできないため、コピーして削除する
            if fs::rename(&source, &target).is_err() {
                fs::copy(&source, &target)?;
                fs::remove_file(&source)?;
            }
            target
        };

        stored.document.transition(DocumentState::Relocated)?;
        stored.locator = file_locator(&target)?;
        stored.location = folder.location.clone();
        Ok(())
    }

    fn create_file(
        &mut self,
        folder: &Folder,
        name: &str,
        bytes: Vec<u8>,
    ) -> Result<Locator, MergeError> {
        let name = sanitize_file_name(name);
        validate_file_name(&name)?;

        let dir = PathBuf::from(&folder.location);
        fs::create_dir_all(&dir)?;
        let path = dir.join(name);
        fs::write(&path, bytes)?;
        tracing::debug!(path = %path.display(), "file written");
        file_locator(&path)
    }
}

/// 端末で確認と通知を行うプロンプト
///
/// `assume_yes`が設定されている場合は入力を待たずに「はい」とみなします。
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
    assume_yes: bool,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W, assume_yes: bool) -> Self {
        Self {
            input,
            output,
            assume_yes,
        }
    }
}

impl<R: BufRead, W: Write> Prompt for TerminalPrompt<R, W> {
    fn confirm(&mut self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        if write!(self.output, "{} [y/N] ", message)
            .and_then(|_| self.output.flush())
            .is_err()
        {
            return false;
        }

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(_) => matches!(
                line.trim().to_lowercase().as_str(),
                "y" | "yes" | "o" | "oui"
            ),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read confirmation");
                false
            }
        }
    }

    fn alert(&mut self, message: &str) {
        if let Err(e) = writeln!(self.output, "{}", message) {
            tracing::warn!(error = %e, "failed to display alert");
        }
    }
}
