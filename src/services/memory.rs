//! メモリ上で動作するサービス実装
//!
//! ホスト型のドライブと同じく、IDは一意で名前の重複を許します。
//! 作成された文書・フォルダ・ファイルと通知内容を記録するため、テストで結果を検査できます。

use std::collections::VecDeque;
use std::path::Path;

use crate::document::{Document, DocumentState, StoredDocument};
use crate::error::MergeError;
use crate::pdf::PdfRenderer;
use crate::services::{DocumentService, Folder, Prompt, Storage, GENERATED_FOLDER_NAME};
use crate::types::Locator;

/// 文書が最初に作成される場所
const ROOT_LOCATION: &str = "memory://root";

/// メモリ上の文書サービス
#[derive(Debug, Default)]
pub struct MemoryDocumentService {
    next_id: usize,
    documents: Vec<Document>,
}

impl MemoryDocumentService {
    pub fn new() -> Self {
        Self::default()
    }

    /// 確定済みの文書（確定順）
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }
}

impl DocumentService for MemoryDocumentService {
    fn create(&mut self, title: &str) -> Result<Document, MergeError> {
        self.next_id += 1;
        Ok(Document::new(format!("doc-{}", self.next_id), title))
    }

    fn save_and_close(&mut self, mut document: Document) -> Result<StoredDocument, MergeError> {
        document.finalize()?;
        self.documents.push(document.clone());
        let locator = Locator::new(format!("memory://documents/{}", document.id()));
        Ok(StoredDocument {
            document,
            locator,
            location: ROOT_LOCATION.to_string(),
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

/// メモリ上のファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryFile {
    pub folder: Folder,
    pub name: String,
    pub bytes: Vec<u8>,
    pub locator: Locator,
}

/// メモリ上のストレージ
#[derive(Debug, Default)]
pub struct MemoryStorage {
    next_id: usize,
    folders: Vec<Folder>,
    files: Vec<MemoryFile>,
    placements: Vec<(String, String)>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 作成されたフォルダ
    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    /// 作成されたファイル
    pub fn files(&self) -> &[MemoryFile] {
        &self.files
    }

    /// 移動された文書のIDと移動先の組
    pub fn placements(&self) -> &[(String, String)] {
        &self.placements
    }

    fn next_id(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }
}

impl Storage for MemoryStorage {
    fn destination_for(&mut self, workbook: Option<&Path>) -> Result<Folder, MergeError> {
        // 相対パスのファイル名だけなら、親は現在のディレクトリ
        let parent = workbook.and_then(Path::parent).map(|p| {
            if p.as_os_str().is_empty() {
                Path::new(".")
            } else {
                p
            }
        });

        if let Some(parent) = parent {
            let name = parent
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| parent.display().to_string());
            return Ok(Folder {
                name,
                location: parent.display().to_string(),
            });
        }

        let id = self.next_id();
        let folder = Folder {
            name: GENERATED_FOLDER_NAME.to_string(),
            location: format!("memory://folders/{}", id),
        };
        self.folders.push(folder.clone());
        Ok(folder)
    }

    fn relocate(&mut self, stored: &mut StoredDocument, folder: &Folder) -> Result<(), MergeError> {
        stored.document.transition(DocumentState::Relocated)?;
        stored.location = folder.location.clone();
        self.placements
            .push((stored.document.id().to_string(), folder.location.clone()));
        Ok(())
    }

    fn create_file(
        &mut self,
        folder: &Folder,
        name: &str,
        bytes: Vec<u8>,
    ) -> Result<Locator, MergeError> {
        let id = self.next_id();
        let locator = Locator::new(format!("memory://files/{}", id));
        self.files.push(MemoryFile {
            folder: folder.clone(),
            name: name.to_string(),
            bytes,
            locator: locator.clone(),
        });
        Ok(locator)
    }
}

/// 決められた応答を返すプロンプト
///
/// 応答が尽きた後は`default_answer`を返します。
#[derive(Debug)]
pub struct ScriptedPrompt {
    answers: VecDeque<bool>,
    default_answer: bool,
    questions: Vec<String>,
    alerts: Vec<String>,
}

impl Default for ScriptedPrompt {
    fn default() -> Self {
        Self::always(true)
    }
}

impl ScriptedPrompt {
    /// 常に同じ応答を返す
    pub fn always(answer: bool) -> Self {
        Self {
            answers: VecDeque::new(),
            default_answer: answer,
            questions: Vec::new(),
            alerts: Vec::new(),
        }
    }

    /// 応答を順に返す
    pub fn with_answers(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            ..Self::always(true)
        }
    }

    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm(&mut self, message: &str) -> bool {
        self.questions.push(message.to_string());
        self.answers.pop_front().unwrap_or(self.default_answer)
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn finalized(service: &mut MemoryDocumentService, title: &str) -> StoredDocument {
        let mut doc = service.create(title).unwrap();
        doc.append_paragraph("body").unwrap();
        service.save_and_close(doc).unwrap()
    }

    #[test]
    fn test_ids_are_unique_and_names_may_repeat() {
        let mut service = MemoryDocumentService::new();
        let a = finalized(&mut service, "Client_7_Dupont");
        let b = finalized(&mut service, "Client_7_Dupont");
        assert_ne!(a.locator, b.locator);
        assert_eq!(service.documents().len(), 2);
        assert_eq!(a.location, ROOT_LOCATION);
    }

    #[test]
    fn test_destination_uses_workbook_parent() {
        let mut storage = MemoryStorage::new();
        let path = PathBuf::from("/drive/Clients/clients.xlsx");
        let folder = storage.destination_for(Some(&path)).unwrap();
        assert_eq!(folder.name, "Clients");
        assert_eq!(folder.location, "/drive/Clients");
        assert!(storage.folders().is_empty());
    }

    #[test]
    fn test_destination_creates_generated_folder() {
        let mut storage = MemoryStorage::new();
        let first = storage.destination_for(None).unwrap();
        let second = storage.destination_for(None).unwrap();
        assert_eq!(first.name, GENERATED_FOLDER_NAME);
        assert_eq!(second.name, GENERATED_FOLDER_NAME);
        assert_ne!(first.location, second.location);
        assert_eq!(storage.folders().len(), 2);
    }

    #[test]
    fn test_bare_file_name_uses_current_directory() {
        let mut storage = MemoryStorage::new();
        let folder = storage
            .destination_for(Some(Path::new("clients.xlsx")))
            .unwrap();
        assert_eq!(folder.location, ".");
        assert!(storage.folders().is_empty());
    }

    #[test]
    fn test_relocate_requires_finalized() {
        let mut storage = MemoryStorage::new();
        let folder = storage.destination_for(None).unwrap();

        let mut unfinished = StoredDocument {
            document: Document::new("doc-x", "T"),
            locator: Locator::new("memory://documents/doc-x"),
            location: ROOT_LOCATION.to_string(),
        };
        assert!(storage.relocate(&mut unfinished, &folder).is_err());

        let mut service = MemoryDocumentService::new();
        let mut stored = finalized(&mut service, "T");
        storage.relocate(&mut stored, &folder).unwrap();
        assert_eq!(stored.state(), DocumentState::Relocated);
        assert_eq!(stored.location, folder.location);
        assert_eq!(storage.placements().len(), 1);
    }

    #[test]
    fn test_render_pdf_after_finalize() {
        let mut service = MemoryDocumentService::new();
        let mut stored = finalized(&mut service, "T");
        let bytes = service.render_pdf(&mut stored).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(stored.state(), DocumentState::Rendered);
        assert!(service.render_pdf(&mut stored).is_err());
    }

    #[test]
    fn test_scripted_prompt() {
        let mut prompt = ScriptedPrompt::with_answers([false]);
        assert!(!prompt.confirm("first?"));
        assert!(prompt.confirm("second?"));
        prompt.alert("done");
        assert_eq!(prompt.questions().len(), 2);
        assert_eq!(prompt.alerts(), &["done".to_string()]);
    }
}
