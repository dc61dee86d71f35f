//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

use crate::document::DocumentState;

/// mergezeroクレート全体で使用するエラー型
///
/// ワークブックの読み書き、文書の生成、ストレージへの配置、PDF変換中に
/// 発生するすべてのエラーを統一的に扱うために使用されます。
///
/// シートやヘッダーが存在しない場合、行番号が範囲外の場合はエラーではなく
/// `RunOutcome::Skipped`として扱われます。
///
/// # 使用例
///
/// ```rust,no_run
/// use mergezero::MergeError;
/// use std::fs::File;
///
/// fn read_workbook(path: &str) -> Result<(), MergeError> {
///     let file = File::open(path)?;  // Ioエラーが自動的に変換される
///     // ... 処理 ...
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum MergeError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Excelファイルの解析中に発生したエラー（calamine由来）
    #[error("Failed to parse Excel file: {0}")]
    Parse(#[from] calamine::Error),

    /// Excelファイルの書き込み中に発生したエラー（rust_xlsxwriter由来）
    #[error("Failed to write Excel file: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// PDFの生成に失敗したエラー
    #[error("PDF rendering error: {0}")]
    Pdf(String),

    /// 設定の検証に失敗したエラー
    ///
    /// `MailMergeBuilder::build()`時や設定ファイルの読み込み時に発生します。
    ///
    /// # 例
    ///
    /// ```rust,no_run
    /// use mergezero::{MailMergeBuilder, MergeError};
    ///
    /// let result = MailMergeBuilder::new()
    ///     .with_time_zone("+25:00")
    ///     .build();
    ///
    /// match result {
    ///     Err(MergeError::Config(msg)) => {
    ///         println!("設定エラー: {}", msg);
    ///     }
    ///     _ => {}
    /// }
    /// ```
    #[error("Configuration error: {0}")]
    Config(String),

    /// 文書サービスまたはストレージ側の失敗
    #[error("Storage error: {0}")]
    Storage(String),

    /// 文書のライフサイクルに反する操作
    ///
    /// 例えば、確定（Finalized）後の差し込みや、未確定の文書の移動です。
    #[error("Document '{document}' cannot go from {from:?} to {to:?}")]
    InvalidTransition {
        /// 文書のタイトル
        document: String,
        /// 現在の状態
        from: DocumentState,
        /// 要求された状態
        to: DocumentState,
    },

    /// セキュリティ制限に違反したエラー
    ///
    /// 入力ファイルサイズの上限超過などで発生します。
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error: MergeError = io_err.into();

        match error {
            MergeError::Io(e) => {
                assert_eq!(e.kind(), io::ErrorKind::NotFound);
                assert_eq!(e.to_string(), "File not found");
            }
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_parse_error_display() {
        let parse_err = calamine::Error::Msg("Corrupted file");
        let error: MergeError = parse_err.into();

        let error_msg = error.to_string();
        assert!(error_msg.contains("Failed to parse Excel file"));
        assert!(error_msg.contains("Corrupted file"));
    }

    #[test]
    fn test_config_error_display() {
        let error = MergeError::Config("Invalid time zone: 'xyz'".to_string());
        let error_msg = error.to_string();

        assert!(error_msg.contains("Configuration error"));
        assert!(error_msg.contains("Invalid time zone: 'xyz'"));
    }

    #[test]
    fn test_invalid_transition_display() {
        let error = MergeError::InvalidTransition {
            document: "Client_7_Dupont".to_string(),
            from: DocumentState::Finalized,
            to: DocumentState::Populated,
        };

        let error_msg = error.to_string();
        assert!(error_msg.contains("Client_7_Dupont"));
        assert!(error_msg.contains("Finalized"));
        assert!(error_msg.contains("Populated"));
    }

    // エラー変換のテスト（?演算子の動作確認）
    #[test]
    fn test_error_conversion_with_question_mark() {
        fn io_operation() -> Result<(), MergeError> {
            let _file = std::fs::File::open("nonexistent_file.xlsx")?;
            Ok(())
        }

        match io_operation() {
            Err(MergeError::Io(_)) => {}
            _ => panic!("Expected Io error from ? operator"),
        }
    }

    #[test]
    fn test_all_error_formats() {
        let io_err: MergeError = io::Error::other("test io").into();
        assert!(io_err.to_string().starts_with("IO error"));

        let parse_err: MergeError = calamine::Error::Msg("test parse").into();
        assert!(parse_err
            .to_string()
            .starts_with("Failed to parse Excel file"));

        let pdf_err = MergeError::Pdf("test pdf".to_string());
        assert!(pdf_err.to_string().starts_with("PDF rendering error"));

        let storage_err = MergeError::Storage("test storage".to_string());
        assert!(storage_err.to_string().starts_with("Storage error"));

        let security_err = MergeError::SecurityViolation("too big".to_string());
        assert!(security_err.to_string().starts_with("Security violation"));
    }
}
