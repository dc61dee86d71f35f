//! Row Merger Module
//!
//! 1行分の値からレコードを作り、テンプレートに差し込んで文書を確定するモジュール。

use crate::api::ValueEscaping;
use crate::document::StoredDocument;
use crate::error::MergeError;
use crate::fields::{placeholder, TemplateFields};
use crate::normalizer::{escape_value, ValueNormalizer};
use crate::services::DocumentService;
use crate::template::build_template;
use crate::types::{CellValue, Record};

/// 行マージャー
#[derive(Debug, Clone)]
pub struct RowMerger {
    normalizer: ValueNormalizer,
    fields: TemplateFields,
    escaping: ValueEscaping,
}

impl RowMerger {
    pub fn new(
        normalizer: ValueNormalizer,
        fields: TemplateFields,
        escaping: ValueEscaping,
    ) -> Self {
        Self {
            normalizer,
            fields,
            escaping,
        }
    }

    pub fn normalizer(&self) -> &ValueNormalizer {
        &self.normalizer
    }

    pub fn fields(&self) -> &TemplateFields {
        &self.fields
    }

    pub fn escaping(&self) -> ValueEscaping {
        self.escaping
    }

    /// レコードから文書名を生成（`"Client_" + Id + "_" + ClientName`）
    ///
    /// 列が存在しない場合は空文字列として扱います。
    pub fn document_name(&self, record: &Record) -> String {
        format!(
            "Client_{}_{}",
            record.get_or_empty(&self.fields.id.key),
            record.get_or_empty(&self.fields.client_name.key)
        )
    }

    /// 1行を差し込んで文書を確定する
    ///
    /// # 引数
    ///
    /// * `service` - 文書サービス
    /// * `headers` - ヘッダー行の列名
    /// * `values` - 対象行の値（ヘッダーと同じ順序）
    ///
    /// # 戻り値
    ///
    /// * `Ok((Record, StoredDocument))` - 正規化済みのレコードと確定済みの文書
    /// * `Err(MergeError)` - 文書サービスが失敗した場合
    ///
    /// テンプレートにあってレコードにないプレースホルダーはそのまま残ります。
    pub fn merge_row<D: DocumentService + ?Sized>(
        &self,
        service: &mut D,
        headers: &[String],
        values: &[CellValue],
    ) -> Result<(Record, StoredDocument), MergeError> {
        let record = self.normalizer.build_record(headers, values);
        let name = self.document_name(&record);

        let mut document = build_template(service, &name, &self.fields)?;
        for (key, value) in record.iter() {
            document.replace_text(&placeholder(key), &escape_value(value, self.escaping))?;
        }

        let stored = service.save_and_close(document)?;
        tracing::debug!(document = %name, locator = %stored.locator, "row merged");
        Ok((record, stored))
    }
}
