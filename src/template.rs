//! Template Module
//!
//! プレースホルダー（`{{Field}}`）を含むテンプレート文書の作成と、
//! データシートのヘッダー行の初期化を行うモジュール。

use crate::document::{Document, HeadingLevel};
use crate::error::MergeError;
use crate::fields::TemplateFields;
use crate::services::DocumentService;
use crate::workbook::{HeaderStyle, Sheet};

/// タイトル未指定時のテンプレート名
pub const DEFAULT_TEMPLATE_TITLE: &str = "Modèle client";

/// テンプレート文書を作成
///
/// 見出し（レベル1）`"Client ID: {{Id}}"`と、ラベル付きの本文5段落を固定順で追加します。
/// 返される文書は`Populated`状態で、まだ確定されていません。
///
/// # 引数
///
/// * `service` - 文書を作成する文書サービス
/// * `title` - 文書タイトル（空の場合は`"Modèle client"`）
/// * `fields` - 差し込むフィールドの定義
pub fn build_template<D: DocumentService + ?Sized>(
    service: &mut D,
    title: &str,
    fields: &TemplateFields,
) -> Result<Document, MergeError> {
    let title = if title.trim().is_empty() {
        DEFAULT_TEMPLATE_TITLE
    } else {
        title
    };

    let mut document = service.create(title)?;
    document.append_heading(
        format!("{}{}", fields.id.label, fields.id.token()),
        HeadingLevel::Heading1,
    )?;
    for binding in fields.body() {
        document.append_paragraph(format!("{}{}", binding.label, binding.token()))?;
    }

    tracing::debug!(title = %document.title(), "template built");
    Ok(document)
}

/// データシートのヘッダー行を初期化
///
/// 1行目にフィールドの列名とロケーター列を書き込み、ヘッダースタイルを設定します。
/// 既存のデータ行は変更しません。
pub fn initialize_header(
    sheet: &mut Sheet,
    fields: &TemplateFields,
    locator_column: &str,
) -> Result<(), MergeError> {
    let mut names = fields.keys();
    names.push(locator_column.to_string());
    sheet.write_header(&names)?;
    sheet.set_header_style(HeaderStyle::default());

    tracing::info!(sheet = %sheet.name(), columns = names.len(), "header initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::MemoryDocumentService;
    use crate::types::CellValue;

    #[test]
    fn test_build_template_default_fields() {
        let mut service = MemoryDocumentService::new();
        let doc = build_template(&mut service, "", &TemplateFields::default()).unwrap();

        assert_eq!(doc.title(), DEFAULT_TEMPLATE_TITLE);
        assert_eq!(
            doc.body_text(),
            "Client ID: {{Id}}\n\
             Nom : {{ClientName}}\n\
             Adresse : {{Address}}\n\
             Téléphone : {{Phone}}\n\
             Email : {{Email}}\n\
             Date d’échéance : {{DueDate}}\n"
        );
        assert_eq!(
            doc.blocks()[0],
            crate::document::Block::Paragraph {
                text: "Client ID: {{Id}}".to_string(),
                heading: Some(HeadingLevel::Heading1),
            }
        );
    }

    #[test]
    fn test_build_template_french_keys() {
        let mut service = MemoryDocumentService::new();
        let doc =
            build_template(&mut service, "Client_7_Dupont", &TemplateFields::french()).unwrap();
        assert_eq!(doc.title(), "Client_7_Dupont");
        assert!(doc.body_text().contains("Nom : {{Nom_client}}"));
        assert!(doc.body_text().contains("Date d’échéance : {{Date_échéance}}"));
    }

    #[test]
    fn test_initialize_header() {
        let mut sheet = Sheet::new("Données");
        sheet.set_cell(2, 1, 7.0).unwrap();
        initialize_header(&mut sheet, &TemplateFields::default(), "URL Document").unwrap();

        let header = sheet.header().unwrap();
        assert_eq!(header.len(), 7);
        assert_eq!(header.column_of("URL Document"), Some(7));
        assert!(sheet.header_style().is_some());
        assert_eq!(sheet.cell(2, 1), Some(&CellValue::Number(7.0)));
    }
}
