//! Services Module
//!
//! 差し込み処理が依存する外部サービス（文書サービス、ストレージ、ユーザーへの確認）を
//! トレイトとして抽象化するモジュール。
//!
//! 実装は2種類を提供します。
//!
//! - [`memory`]: メモリ上で動作するバックエンド（テスト・ドライラン用）
//! - [`local`]: ローカルファイルシステムに文書とPDFを書き出すバックエンド

pub mod local;
pub mod memory;

use std::path::Path;

use crate::document::{Document, StoredDocument};
use crate::error::MergeError;
use crate::types::Locator;

/// 保存先フォルダ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    /// 表示名
    pub name: String,

    /// バックエンド固有の場所（ディレクトリのパス、または仮想パス）
    pub location: String,
}

/// 文書サービス
///
/// 文書の作成・確定とPDFへの変換を担当します。
pub trait DocumentService {
    /// 空の文書を作成（`Created`状態）
    ///
    /// 同じタイトルの文書が既に存在しても、新しい文書を作成します。
    fn create(&mut self, title: &str) -> Result<Document, MergeError>;

    /// 文書を確定して保存し、ロケーターを返す
    fn save_and_close(&mut self, document: Document) -> Result<StoredDocument, MergeError>;

    /// 確定済みの文書をPDFに変換（`Rendered`状態へ）
    fn render_pdf(&mut self, stored: &mut StoredDocument) -> Result<Vec<u8>, MergeError>;
}

/// ストレージ
///
/// 生成物の保存先フォルダの決定と、文書の移動、ファイルの作成を担当します。
pub trait Storage {
    /// ワークブックの保存場所から出力先フォルダを決定する
    ///
    /// ワークブックのパスがない場合は`"Documents générés"`フォルダを作成します。
    /// ファイル名だけの相対パスは現在のディレクトリにあるものとして扱います。
    fn destination_for(&mut self, workbook: Option<&Path>) -> Result<Folder, MergeError>;

    /// 確定済みの文書をフォルダへ移動（`Relocated`状態へ）
    ///
    /// 移動によって場所が変わる場合は`stored.locator`も更新されます。
    fn relocate(&mut self, stored: &mut StoredDocument, folder: &Folder) -> Result<(), MergeError>;

    /// フォルダにファイルを作成し、ロケーターを返す
    fn create_file(
        &mut self,
        folder: &Folder,
        name: &str,
        bytes: Vec<u8>,
    ) -> Result<Locator, MergeError>;
}

/// ユーザーへの確認と通知
pub trait Prompt {
    /// はい/いいえの確認（`true`ではい）
    fn confirm(&mut self, message: &str) -> bool;

    /// 通知を表示（ユーザーが閉じるまでブロックしてよい）
    fn alert(&mut self, message: &str);
}

/// 親フォルダがない場合に作成する出力フォルダ名
pub const GENERATED_FOLDER_NAME: &str = "Documents générés";
