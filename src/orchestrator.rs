//! Orchestrator Module
//!
//! シートの全データ行から顧客ごとの文書を生成する一括処理と、
//! 1行だけを対象にしたテスト生成を提供するモジュール。

use crate::api::{LocatorReset, RunOutcome, SkipReason};
use crate::builder::MailMerge;
use crate::document::StoredDocument;
use crate::error::MergeError;
use crate::services::{DocumentService, Folder, Prompt, Storage};
use crate::template::{build_template, initialize_header};
use crate::types::{CellCoord, CellValue, Locator, Record};
use crate::workbook::Workbook;

/// 最初のデータ行（1行目はヘッダー）
pub(crate) const FIRST_DATA_ROW: usize = 2;

/// シートから読み出したヘッダーとデータ行
#[derive(Debug, Clone)]
pub(crate) struct Table {
    pub headers: Vec<String>,
    /// 2行目から最終行までの値（各行はヘッダーと同じ幅）
    pub rows: Vec<Vec<CellValue>>,
    pub last_row: usize,
}

impl Table {
    /// ワークブックから対象シートを読み出す
    ///
    /// シートがない場合、ヘッダー行が空の場合はスキップ理由を返します。
    pub fn read(workbook: &Workbook, sheet_name: &str) -> Result<Self, SkipReason> {
        let sheet = workbook
            .sheet(sheet_name)
            .ok_or_else(|| SkipReason::MissingSheet(sheet_name.to_string()))?;
        let schema = sheet.header().ok_or(SkipReason::MissingHeader)?;
        let headers = schema.fields().to_vec();

        let last_row = sheet.last_row();
        let rows = (FIRST_DATA_ROW..=last_row)
            .map(|row| sheet.row_values(row, headers.len()))
            .collect();

        Ok(Self {
            headers,
            rows,
            last_row,
        })
    }
}

/// 一括生成の結果
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    /// 生成した文書の数
    pub generated: usize,

    /// 行順のロケーター（`locators[0]`が2行目）
    pub locators: Vec<Locator>,

    /// 文書の移動先フォルダ
    pub folder: Folder,
}

/// 1行のテスト生成の結果
#[derive(Debug, Clone, PartialEq)]
pub struct SingleReport {
    /// 対象行（1始まり）
    pub row: usize,

    /// 正規化済みのレコード
    pub record: Record,

    /// 確定済みの文書
    pub document: StoredDocument,
}

impl<D: DocumentService, S: Storage, P: Prompt> MailMerge<D, S, P> {
    /// 顧客（データ行）ごとに文書を生成する
    ///
    /// 各文書はワークブックの親フォルダ（なければ`"Documents générés"`）へ移動され、
    /// そのロケーターがロケーター列の同じ行に書き込まれます。
    ///
    /// # 戻り値
    ///
    /// * `Ok(RunOutcome::Completed(BatchReport))` - すべての行を処理した場合
    /// * `Ok(RunOutcome::Skipped(_))` - シートまたはヘッダーがない場合（副作用なし）
    /// * `Ok(RunOutcome::Cancelled)` - ユーザーが確認を拒否した場合（副作用なし）
    /// * `Err(MergeError)` - 文書サービスまたはストレージが失敗した場合
    ///
    /// 失敗した時点で処理を中断します。それまでに書き込んだロケーターは残り、
    /// ワークブックはエラーを返す前に保存されます。
    pub fn generate_per_client(
        &mut self,
        workbook: &mut Workbook,
    ) -> Result<RunOutcome<BatchReport>, MergeError> {
        let table = match Table::read(workbook, &self.config.sheet_name) {
            Ok(table) => table,
            Err(reason) => {
                tracing::info!(?reason, "batch skipped");
                return Ok(RunOutcome::Skipped(reason));
            }
        };

        let question = format!(
            "Générer un document pour chacun des {} clients de la feuille « {} » ?",
            table.rows.len(),
            self.config.sheet_name
        );
        if !self.confirm(&question) {
            return Ok(RunOutcome::Cancelled);
        }

        let result = self.run_batch(workbook, &table);
        let report = self.report(result)?;
        self.prompt.alert(&format!(
            "Tous les documents ont été générés avec leurs liens ! ({} documents)",
            report.generated
        ));
        Ok(RunOutcome::Completed(report))
    }

    fn run_batch(
        &mut self,
        workbook: &mut Workbook,
        table: &Table,
    ) -> Result<BatchReport, MergeError> {
        let sheet_name = self.config.sheet_name.clone();
        let locator_name = self.config.locator_column.clone();

        let folder = self.storage.destination_for(workbook.path())?;
        tracing::info!(folder = %folder.name, rows = table.rows.len(), "batch started");

        let sheet = workbook
            .sheet_mut(&sheet_name)
            .ok_or_else(|| MergeError::Config(format!("Sheet '{}' not found", sheet_name)))?;

        let schema = sheet.header().unwrap_or_default();
        let locator_col = match schema.column_of(&locator_name) {
            Some(col) => col,
            None => {
                // 見出しのない列に値がある場合も、その右に追加する
                let col = sheet.last_column().max(schema.len()) + 1;
                sheet.set_cell(1, col, locator_name.as_str())?;
                col
            }
        };
        if self.config.locator_reset == LocatorReset::ClearBeforeRun {
            sheet.clear_column(locator_col, FIRST_DATA_ROW);
        }

        let mut locators = Vec::with_capacity(table.rows.len());
        let mut failure = None;
        for (offset, values) in table.rows.iter().enumerate() {
            let row = FIRST_DATA_ROW + offset;
            let placed = self
                .place_row(&table.headers, values, &folder)
                .and_then(|locator| {
                    sheet.set_cell(row, locator_col, locator.as_str())?;
                    tracing::debug!(
                        cell = %CellCoord::new(row, locator_col).to_a1_notation(),
                        "locator written"
                    );
                    Ok(locator)
                });
            match placed {
                Ok(locator) => locators.push(locator),
                Err(e) => {
                    tracing::warn!(row, error = %e, "batch aborted");
                    failure = Some(e);
                    break;
                }
            }
        }

        // 途中で失敗した場合も、書き込み済みのロケーターを保存してからエラーを返す
        let saved = self.persist(workbook);
        if let Some(e) = failure {
            if let Err(save_error) = saved {
                tracing::warn!(error = %save_error, "workbook could not be saved after failure");
            }
            return Err(e);
        }
        saved?;

        tracing::info!(generated = locators.len(), "batch finished");
        Ok(BatchReport {
            generated: locators.len(),
            locators,
            folder,
        })
    }

    /// 1行を差し込み、出力先フォルダへ移動してロケーターを返す
    fn place_row(
        &mut self,
        headers: &[String],
        values: &[CellValue],
        folder: &Folder,
    ) -> Result<Locator, MergeError> {
        let (_, mut stored) = self.merger.merge_row(&mut self.documents, headers, values)?;
        self.storage.relocate(&mut stored, folder)?;
        tracing::info!(document = %stored.title(), locator = %stored.locator, "document generated");
        Ok(stored.locator)
    }

    /// 指定した1行だけを差し込む（テスト用）
    ///
    /// 文書の移動とロケーターの書き込みは行わず、ロケーターを通知します。
    ///
    /// # 引数
    ///
    /// * `workbook` - 対象のワークブック
    /// * `row` - 行番号（1始まり、2以上）
    pub fn generate_for_row(
        &mut self,
        workbook: &Workbook,
        row: usize,
    ) -> Result<RunOutcome<SingleReport>, MergeError> {
        let table = match Table::read(workbook, &self.config.sheet_name) {
            Ok(table) => table,
            Err(reason) => return Ok(RunOutcome::Skipped(reason)),
        };
        if row < FIRST_DATA_ROW || row > table.last_row {
            return Ok(RunOutcome::Skipped(SkipReason::RowOutOfRange {
                row,
                last_row: table.last_row,
            }));
        }

        if !self.confirm(&format!("Générer le document de test pour la ligne {} ?", row)) {
            return Ok(RunOutcome::Cancelled);
        }

        let values = &table.rows[row - FIRST_DATA_ROW];
        let result = self.merger.merge_row(&mut self.documents, &table.headers, values);
        let (record, document) = self.report(result)?;

        self.prompt
            .alert(&format!("Document généré :\n{}", document.locator));
        Ok(RunOutcome::Completed(SingleReport {
            row,
            record,
            document,
        }))
    }

    /// シートのヘッダー行を初期化する
    ///
    /// シートがなければ作成し、1行目にフィールドの列名とロケーター列を書き込みます。
    /// ワークブックにパスがあれば保存します。
    pub fn initialize_sheet(
        &mut self,
        workbook: &mut Workbook,
    ) -> Result<RunOutcome<()>, MergeError> {
        let question = format!(
            "Réinitialiser l’en-tête de la feuille « {} » ?",
            self.config.sheet_name
        );
        if !self.confirm(&question) {
            return Ok(RunOutcome::Cancelled);
        }

        let sheet = workbook.sheet_or_insert(&self.config.sheet_name);
        let result = initialize_header(sheet, &self.config.fields, &self.config.locator_column)
            .and_then(|_| self.persist(workbook));
        self.report(result)?;
        Ok(RunOutcome::Completed(()))
    }

    /// 差し込み前のテンプレート文書を作成して保存する
    pub fn create_template(&mut self, title: &str) -> Result<StoredDocument, MergeError> {
        let result = build_template(&mut self.documents, title, &self.config.fields)
            .and_then(|document| self.documents.save_and_close(document));
        self.report(result)
    }

    /// パスを持つワークブックのみ保存する
    pub(crate) fn persist(&self, workbook: &Workbook) -> Result<(), MergeError> {
        match workbook.path() {
            Some(_) => workbook.save(),
            None => {
                tracing::debug!("workbook has no path; changes kept in memory");
                Ok(())
            }
        }
    }
}
