//! Aggregate Module
//!
//! 全顧客を1つの文書にまとめ、PDFとして出力先フォルダに保存するモジュール。
//! テンプレートは使わず、値を直接書き込みます。

use chrono::{NaiveDate, Utc};

use crate::api::RunOutcome;
use crate::builder::MailMerge;
use crate::document::{Document, HeadingLevel};
use crate::error::MergeError;
use crate::normalizer::escape_value;
use crate::orchestrator::Table;
use crate::services::{DocumentService, Prompt, Storage};
use crate::types::{Locator, Record};
use crate::workbook::Workbook;

/// 集約文書のタイトル（`"Tous les clients - YYYY-MM-DD"`）
pub fn aggregate_title(date: NaiveDate) -> String {
    format!("Tous les clients - {}", date.format("%Y-%m-%d"))
}

/// 1ページ集約の結果
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateReport {
    /// 文書タイトル
    pub title: String,

    /// PDFに変換した文書（`Rendered`状態）
    pub document: Document,

    /// 保存したPDF（`"<title>.pdf"`）のロケーター
    pub pdf: Locator,
}

impl<D: DocumentService, S: Storage, P: Prompt> MailMerge<D, S, P> {
    /// 全顧客を1つの文書にまとめてPDFを生成する
    ///
    /// タイトルの日付には、設定したタイムゾーンでの今日の日付を使います。
    pub fn generate_single_page(
        &mut self,
        workbook: &Workbook,
    ) -> Result<RunOutcome<AggregateReport>, MergeError> {
        let today = Utc::now().with_timezone(&self.config.time_zone).date_naive();
        self.generate_single_page_on(workbook, today)
    }

    /// 日付を指定して全顧客を1つの文書にまとめる
    ///
    /// 各行について、見出し（レベル2）`"Client ID: <id>"`、ラベル付きの5行、
    /// 空段落、水平線を行順に追加します。
    pub fn generate_single_page_on(
        &mut self,
        workbook: &Workbook,
        date: NaiveDate,
    ) -> Result<RunOutcome<AggregateReport>, MergeError> {
        let table = match Table::read(workbook, &self.config.sheet_name) {
            Ok(table) => table,
            Err(reason) => {
                tracing::info!(?reason, "aggregate skipped");
                return Ok(RunOutcome::Skipped(reason));
            }
        };

        let question = format!(
            "Générer un document PDF avec les {} clients sur une seule page ?",
            table.rows.len()
        );
        if !self.confirm(&question) {
            return Ok(RunOutcome::Cancelled);
        }

        let result = self.run_aggregate(workbook, &table, date);
        let report = self.report(result)?;
        self.prompt
            .alert(&format!("Document PDF généré :\n{}", report.pdf));
        Ok(RunOutcome::Completed(report))
    }

    fn run_aggregate(
        &mut self,
        workbook: &Workbook,
        table: &Table,
        date: NaiveDate,
    ) -> Result<AggregateReport, MergeError> {
        let title = aggregate_title(date);
        let mut document = self.documents.create(&title)?;

        for values in &table.rows {
            let record = self
                .merger
                .normalizer()
                .build_record(&table.headers, values);
            self.append_client(&mut document, &record)?;
        }

        let mut stored = self.documents.save_and_close(document)?;
        let pdf = self.documents.render_pdf(&mut stored)?;
        let folder = self.storage.destination_for(workbook.path())?;
        let locator = self
            .storage
            .create_file(&folder, &format!("{}.pdf", title), pdf)?;

        tracing::info!(
            title = %title,
            clients = table.rows.len(),
            pdf = %locator,
            "aggregate generated"
        );
        Ok(AggregateReport {
            title,
            document: stored.document,
            pdf: locator,
        })
    }

    fn append_client(&self, document: &mut Document, record: &Record) -> Result<(), MergeError> {
        let fields = self.merger.fields();
        let escaping = self.merger.escaping();
        let value = |key: &str| escape_value(record.get_or_empty(key), escaping);

        document.append_heading(
            format!("{}{}", fields.id.label, value(&fields.id.key)),
            HeadingLevel::Heading2,
        )?;
        for binding in fields.body() {
            document.append_paragraph(format!("{}{}", binding.label, value(&binding.key)))?;
        }
        document.append_paragraph("")?;
        document.append_horizontal_rule()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SkipReason;
    use crate::builder::MailMergeBuilder;
    use crate::document::{Block, DocumentState};
    use crate::services::memory::{MemoryDocumentService, MemoryStorage, ScriptedPrompt};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn merge() -> MailMerge<MemoryDocumentService, MemoryStorage, ScriptedPrompt> {
        MailMergeBuilder::new()
            .build_with(
                MemoryDocumentService::new(),
                MemoryStorage::new(),
                ScriptedPrompt::always(true),
            )
            .unwrap()
    }

    #[test]
    fn test_aggregate_title() {
        assert_eq!(aggregate_title(date()), "Tous les clients - 2024-05-01");
    }

    #[test]
    fn test_aggregate_layout() {
        let mut wb = Workbook::new();
        let sheet = wb.sheet_or_insert("Données");
        sheet.set_cell(1, 1, "Id").unwrap();
        sheet.set_cell(1, 2, "ClientName").unwrap();
        sheet.set_cell(2, 1, 7.0).unwrap();
        sheet.set_cell(2, 2, "Dupont").unwrap();

        let mut merge = merge();
        let report = merge
            .generate_single_page_on(&wb, date())
            .unwrap()
            .completed()
            .unwrap();

        assert_eq!(report.document.state(), DocumentState::Rendered);
        let blocks = report.document.blocks();
        assert_eq!(blocks.len(), 8);
        assert_eq!(
            blocks[0],
            Block::Paragraph {
                text: "Client ID: 7".to_string(),
                heading: Some(HeadingLevel::Heading2),
            }
        );
        assert_eq!(report.document.body_text().lines().nth(1), Some("Nom : Dupont"));
        // 列がない項目は空になる
        assert_eq!(report.document.body_text().lines().nth(2), Some("Adresse : "));
        assert_eq!(blocks[7], Block::HorizontalRule);

        let files = merge.storage().files();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "Tous les clients - 2024-05-01.pdf");
        assert!(files[0].bytes.starts_with(b"%PDF"));
        assert_eq!(files[0].locator, report.pdf);
    }

    #[test]
    fn test_aggregate_missing_sheet() {
        let mut merge = merge();
        let outcome = merge
            .generate_single_page_on(&Workbook::new(), date())
            .unwrap();
        assert_eq!(
            outcome,
            RunOutcome::Skipped(SkipReason::MissingSheet("Données".to_string()))
        );
        assert!(merge.storage().files().is_empty());
    }
}
