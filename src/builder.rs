//! Builder Module
//!
//! Fluent Builder APIを提供し、`MailMerge`インスタンスを段階的に構築する。

use chrono::FixedOffset;

use crate::api::{LocatorReset, ValueEscaping};
use crate::error::MergeError;
use crate::fields::TemplateFields;
use crate::merger::RowMerger;
use crate::normalizer::{parse_time_zone, ValueNormalizer};
use crate::services::{DocumentService, Prompt, Storage};
use crate::workbook::DEFAULT_SHEET_NAME;

/// 結果ロケーター列の既定の列名
pub const DEFAULT_LOCATOR_COLUMN: &str = "URL Document";

/// 差し込み処理の設定
///
/// `MailMergeBuilder::build()`で検証済みの値のみを保持します。
#[derive(Debug, Clone)]
pub struct MailMergeConfig {
    /// 対象シート名
    pub(crate) sheet_name: String,

    /// 日付表示のタイムゾーン
    pub(crate) time_zone: FixedOffset,

    /// 結果ロケーター列の列名
    pub(crate) locator_column: String,

    /// 一括生成前のロケーター列の扱い
    pub(crate) locator_reset: LocatorReset,

    /// テンプレートのフィールド定義
    pub(crate) fields: TemplateFields,

    /// 差し込み値のエスケープ方式
    pub(crate) escaping: ValueEscaping,

    /// 実行前に確認するか
    pub(crate) confirm_before_run: bool,

    /// 失敗時に通知するか
    pub(crate) report_failures: bool,
}

impl MailMergeConfig {
    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn time_zone(&self) -> FixedOffset {
        self.time_zone
    }

    pub fn locator_column(&self) -> &str {
        &self.locator_column
    }

    pub fn locator_reset(&self) -> LocatorReset {
        self.locator_reset
    }

    pub fn fields(&self) -> &TemplateFields {
        &self.fields
    }

    pub fn escaping(&self) -> ValueEscaping {
        self.escaping
    }

    pub fn confirm_before_run(&self) -> bool {
        self.confirm_before_run
    }

    pub fn report_failures(&self) -> bool {
        self.report_failures
    }
}

/// Fluent Builder APIを提供する構造体
///
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust,no_run
/// use mergezero::{LocatorReset, MailMergeBuilder, TemplateFields};
/// use mergezero::services::memory::{MemoryDocumentService, MemoryStorage, ScriptedPrompt};
///
/// # fn main() -> Result<(), mergezero::MergeError> {
/// let merge = MailMergeBuilder::new()
///     .with_time_zone("+02:00")
///     .with_fields(TemplateFields::french())
///     .with_locator_reset(LocatorReset::ClearBeforeRun)
///     .build_with(
///         MemoryDocumentService::new(),
///         MemoryStorage::new(),
///         ScriptedPrompt::always(true),
///     )?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MailMergeBuilder {
    sheet_name: String,
    time_zone: String,
    locator_column: String,
    locator_reset: LocatorReset,
    fields: TemplateFields,
    escaping: ValueEscaping,
    confirm_before_run: bool,
    report_failures: bool,
}

impl Default for MailMergeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MailMergeBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - シート名: `"Données"`
    /// - タイムゾーン: UTC
    /// - ロケーター列: `"URL Document"`
    /// - ロケーター列の扱い: 行ごとに上書き
    /// - フィールド: `Id, ClientName, Address, Phone, Email, DueDate`
    /// - エスケープ: なし
    /// - 実行前の確認: あり
    /// - 失敗時の通知: あり
    pub fn new() -> Self {
        Self {
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            time_zone: "UTC".to_string(),
            locator_column: DEFAULT_LOCATOR_COLUMN.to_string(),
            locator_reset: LocatorReset::default(),
            fields: TemplateFields::default(),
            escaping: ValueEscaping::default(),
            confirm_before_run: true,
            report_failures: true,
        }
    }

    /// 対象シート名を指定する
    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    /// 日付表示のタイムゾーンを指定する
    ///
    /// # 引数
    ///
    /// * `offset` - `"UTC"`、`"+02:00"`、`"-0530"`、`"+9"`のようなUTCからのオフセット
    ///
    /// 解析は`build()`時に行われ、不正な値は`MergeError::Config`になります。
    pub fn with_time_zone(mut self, offset: impl Into<String>) -> Self {
        self.time_zone = offset.into();
        self
    }

    /// 結果ロケーター列の列名を指定する
    pub fn with_locator_column(mut self, name: impl Into<String>) -> Self {
        self.locator_column = name.into();
        self
    }

    /// 一括生成前のロケーター列の扱いを指定する
    pub fn with_locator_reset(mut self, reset: LocatorReset) -> Self {
        self.locator_reset = reset;
        self
    }

    /// テンプレートのフィールド定義を指定する
    pub fn with_fields(mut self, fields: TemplateFields) -> Self {
        self.fields = fields;
        self
    }

    /// 差し込み値のエスケープ方式を指定する
    pub fn with_escaping(mut self, escaping: ValueEscaping) -> Self {
        self.escaping = escaping;
        self
    }

    /// 実行前にユーザーへ確認するかを指定する
    pub fn with_confirmation(mut self, confirm: bool) -> Self {
        self.confirm_before_run = confirm;
        self
    }

    /// 失敗時にユーザーへ通知するかを指定する
    pub fn with_failure_reporting(mut self, report: bool) -> Self {
        self.report_failures = report;
        self
    }

    /// 設定を検証して`MailMergeConfig`を生成する
    ///
    /// # 戻り値
    ///
    /// * `Ok(MailMergeConfig)` - 設定が有効な場合
    /// * `Err(MergeError::Config)` - シート名・列名が空、タイムゾーンが不正、
    ///   フィールドのキーが空または重複、ロケーター列がフィールドと重複する場合
    pub fn build(self) -> Result<MailMergeConfig, MergeError> {
        // 1. シート名・列名の検証
        if self.sheet_name.trim().is_empty() {
            return Err(MergeError::Config(
                "Sheet name must not be empty".to_string(),
            ));
        }
        if self.locator_column.trim().is_empty() {
            return Err(MergeError::Config(
                "Locator column name must not be empty".to_string(),
            ));
        }

        // 2. フィールド定義の検証
        self.fields.validate()?;
        if self.fields.keys().contains(&self.locator_column) {
            return Err(MergeError::Config(format!(
                "Locator column '{}' collides with a template field",
                self.locator_column
            )));
        }

        // 3. タイムゾーンの解析
        let time_zone = parse_time_zone(&self.time_zone)?;

        Ok(MailMergeConfig {
            sheet_name: self.sheet_name,
            time_zone,
            locator_column: self.locator_column,
            locator_reset: self.locator_reset,
            fields: self.fields,
            escaping: self.escaping,
            confirm_before_run: self.confirm_before_run,
            report_failures: self.report_failures,
        })
    }

    /// 設定を検証し、サービスを組み合わせて`MailMerge`を生成する
    pub fn build_with<D, S, P>(
        self,
        documents: D,
        storage: S,
        prompt: P,
    ) -> Result<MailMerge<D, S, P>, MergeError>
    where
        D: DocumentService,
        S: Storage,
        P: Prompt,
    {
        Ok(MailMerge::new(self.build()?, documents, storage, prompt))
    }
}

/// 差し込み処理のファサード
///
/// 設定と3つのサービス（文書サービス、ストレージ、プロンプト）を保持し、
/// 顧客ごとの一括生成、1ページへの集約、1行のテスト生成を提供します。
///
/// # 使用例
///
/// ```rust,no_run
/// use mergezero::{MailMergeBuilder, Workbook};
/// use mergezero::api::DocumentFormat;
/// use mergezero::services::local::{LocalDocumentService, LocalStorage, TerminalPrompt};
///
/// # fn main() -> Result<(), mergezero::MergeError> {
/// let stdin = std::io::stdin();
/// let mut merge = MailMergeBuilder::new().build_with(
///     LocalDocumentService::new("drafts", DocumentFormat::Markdown),
///     LocalStorage::new("."),
///     TerminalPrompt::new(stdin.lock(), std::io::stdout(), false),
/// )?;
///
/// let mut workbook = Workbook::open("clients.xlsx", merge.config().time_zone())?;
/// let outcome = merge.generate_per_client(&mut workbook)?;
/// if let Some(report) = outcome.completed() {
///     println!("{} documents", report.generated);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MailMerge<D, S, P> {
    pub(crate) config: MailMergeConfig,
    pub(crate) merger: RowMerger,
    pub(crate) documents: D,
    pub(crate) storage: S,
    pub(crate) prompt: P,
}

impl<D: DocumentService, S: Storage, P: Prompt> MailMerge<D, S, P> {
    pub fn new(config: MailMergeConfig, documents: D, storage: S, prompt: P) -> Self {
        let normalizer = ValueNormalizer::new(config.fields.phone.key.clone(), config.time_zone);
        let merger = RowMerger::new(normalizer, config.fields.clone(), config.escaping);
        Self {
            config,
            merger,
            documents,
            storage,
            prompt,
        }
    }

    pub fn config(&self) -> &MailMergeConfig {
        &self.config
    }

    pub fn merger(&self) -> &RowMerger {
        &self.merger
    }

    pub fn documents(&self) -> &D {
        &self.documents
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    /// 設定に応じてユーザーに確認する（確認しない設定なら常に`true`）
    pub(crate) fn confirm(&mut self, message: &str) -> bool {
        !self.config.confirm_before_run || self.prompt.confirm(message)
    }

    /// 処理結果を受け取り、失敗を通知してからそのまま返す
    pub(crate) fn report<T>(&mut self, result: Result<T, MergeError>) -> Result<T, MergeError> {
        if let Err(e) = &result {
            tracing::error!(error = %e, "operation failed");
            if self.config.report_failures {
                self.prompt.alert(&format!("Échec de la génération :\n{}", e));
            }
        }
        result
    }
}
