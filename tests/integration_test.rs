//! Integration Tests for mergezero
//!
//! rust_xlsxwriterで生成したワークブックを読み込み、
//! 顧客ごとの生成・1ページ集約・1行テスト生成を通しで検証します。

use std::io::Cursor;

use chrono::{FixedOffset, NaiveDate};
use mergezero::services::local::{LocalDocumentService, LocalStorage, TerminalPrompt};
use mergezero::services::memory::{MemoryDocumentService, MemoryStorage, ScriptedPrompt};
use mergezero::{
    Block, CellValue, DocumentFormat, DocumentState, HeadingLevel, LocatorReset, MailMerge,
    MailMergeBuilder, RunOutcome, TemplateFields, Workbook,
};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook as XlsxWorkbook, XlsxError};

type MemoryMerge = MailMerge<MemoryDocumentService, MemoryStorage, ScriptedPrompt>;

// Helper module for generating test fixtures
mod fixtures {
    use super::*;

    pub const HEADER: [&str; 6] = ["Id", "ClientName", "Address", "Phone", "Email", "DueDate"];

    /// 1顧客分の行
    pub struct Client<'a> {
        pub id: f64,
        pub name: &'a str,
        pub address: &'a str,
        pub phone: f64,
        pub email: &'a str,
        pub due: (u16, u8, u8),
    }

    pub fn dupont() -> Client<'static> {
        Client {
            id: 7.0,
            name: "Dupont",
            address: "1 Rue A",
            phone: 612345678.0,
            email: "a@b.com",
            due: (2024, 5, 1),
        }
    }

    pub fn three_clients() -> Vec<Client<'static>> {
        vec![
            dupont(),
            Client {
                id: 8.0,
                name: "Martin",
                address: "2 Rue B",
                phone: 611111111.0,
                email: "m@b.com",
                due: (2024, 6, 15),
            },
            Client {
                id: 9.0,
                name: "Bernard",
                address: "3 Rue C",
                phone: 622222222.0,
                email: "c@b.com",
                due: (2024, 7, 31),
            },
        ]
    }

    /// "Données"シートに顧客表を書き込んだXLSXを生成
    pub fn generate_clients(clients: &[Client]) -> Result<Vec<u8>, XlsxError> {
        let mut workbook = XlsxWorkbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Données")?;

        for (col, name) in HEADER.iter().enumerate() {
            worksheet.write_string(0, col as u16, *name)?;
        }

        let date_format = Format::new().set_num_format("dd/mm/yyyy");
        for (i, client) in clients.iter().enumerate() {
            let row = (i + 1) as u32;
            worksheet.write_number(row, 0, client.id)?;
            worksheet.write_string(row, 1, client.name)?;
            worksheet.write_string(row, 2, client.address)?;
            worksheet.write_number(row, 3, client.phone)?;
            worksheet.write_string(row, 4, client.email)?;
            let (y, m, d) = client.due;
            let due = ExcelDateTime::from_ymd(y, m, d)?;
            worksheet.write_datetime_with_format(row, 5, &due, &date_format)?;
        }

        workbook.save_to_buffer()
    }
}

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

fn load(clients: &[fixtures::Client]) -> Workbook {
    let bytes = fixtures::generate_clients(clients).unwrap();
    Workbook::from_reader(Cursor::new(bytes), utc()).unwrap()
}

fn memory_merge(builder: MailMergeBuilder) -> MemoryMerge {
    builder
        .build_with(
            MemoryDocumentService::new(),
            MemoryStorage::new(),
            ScriptedPrompt::always(true),
        )
        .unwrap()
}

#[test]
fn test_read_fixture_types() {
    let workbook = load(&[fixtures::dupont()]);
    let sheet = workbook.sheet("Données").unwrap();

    assert_eq!(sheet.last_row(), 2);
    assert_eq!(sheet.cell(2, 1), Some(&CellValue::Number(7.0)));
    assert!(matches!(sheet.cell(2, 6), Some(CellValue::DateTime(_))));
}

#[test]
fn test_dupont_single_row() {
    let workbook = load(&[fixtures::dupont()]);
    let mut merge = memory_merge(MailMergeBuilder::new());

    let report = merge
        .generate_for_row(&workbook, 2)
        .unwrap()
        .completed()
        .unwrap();

    let record = &report.record;
    assert_eq!(record.get("Id"), Some("7"));
    assert_eq!(record.get("ClientName"), Some("Dupont"));
    assert_eq!(record.get("Address"), Some("1 Rue A"));
    assert_eq!(record.get("Phone"), Some("0612345678"));
    assert_eq!(record.get("Email"), Some("a@b.com"));
    assert_eq!(record.get("DueDate"), Some("01/05/2024"));

    assert_eq!(report.document.title(), "Client_7_Dupont");
    let body = report.document.document.body_text();
    assert!(body.contains("Nom : Dupont"));
    assert!(!body.contains("{{"));

    // テスト生成では移動もロケーターの書き込みも行わない
    assert_eq!(report.document.state(), DocumentState::Finalized);
    assert!(merge.storage().placements().is_empty());
    assert_eq!(
        merge.prompt().alerts().last().map(String::as_str),
        Some("Document généré :\nmemory://documents/doc-1")
    );
}

#[test]
fn test_french_field_names() {
    let bytes = {
        let mut workbook = XlsxWorkbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Données").unwrap();
        for (col, name) in ["Id", "Nom_client", "Telephone"].iter().enumerate() {
            worksheet.write_string(0, col as u16, *name).unwrap();
        }
        worksheet.write_number(1, 0, 3).unwrap();
        worksheet.write_string(1, 1, "Petit").unwrap();
        worksheet.write_number(1, 2, 698765432).unwrap();
        workbook.save_to_buffer().unwrap()
    };
    let workbook = Workbook::from_reader(Cursor::new(bytes), utc()).unwrap();
    let mut merge = memory_merge(MailMergeBuilder::new().with_fields(TemplateFields::french()));

    let report = merge
        .generate_for_row(&workbook, 2)
        .unwrap()
        .completed()
        .unwrap();
    assert_eq!(report.record.get("Telephone"), Some("0698765432"));
    assert_eq!(report.document.title(), "Client_3_Petit");
    assert!(report
        .document
        .document
        .body_text()
        .contains("Téléphone : 0698765432"));
}

#[test]
fn test_per_client_writes_locators_back() {
    let mut workbook = load(&fixtures::three_clients());
    let mut merge = memory_merge(MailMergeBuilder::new());

    let report = merge
        .generate_per_client(&mut workbook)
        .unwrap()
        .completed()
        .unwrap();
    assert_eq!(report.generated, 3);
    assert_eq!(report.folder.name, "Documents générés");

    let sheet = workbook.sheet("Données").unwrap();
    assert_eq!(sheet.cell(1, 7), Some(&CellValue::from("URL Document")));
    for (i, locator) in report.locators.iter().enumerate() {
        assert_eq!(sheet.cell(i + 2, 7), Some(&CellValue::from(locator.as_str())));
    }

    let titles: Vec<_> = merge
        .documents()
        .documents()
        .iter()
        .map(|d| d.title().to_string())
        .collect();
    assert_eq!(
        titles,
        vec!["Client_7_Dupont", "Client_8_Martin", "Client_9_Bernard"]
    );
    assert_eq!(merge.storage().placements().len(), 3);
    assert_eq!(
        merge.prompt().alerts().last().map(String::as_str),
        Some("Tous les documents ont été générés avec leurs liens ! (3 documents)")
    );

    // 書き戻した列はXLSXとして保存しても残る
    let saved = workbook.save_to_buffer().unwrap();
    let reloaded = Workbook::from_reader(Cursor::new(saved), utc()).unwrap();
    assert_eq!(
        reloaded.sheet("Données").unwrap().cell(4, 7),
        Some(&CellValue::from(report.locators[2].as_str()))
    );
}

#[test]
fn test_clear_before_run_is_idempotent() {
    let mut workbook = load(&fixtures::three_clients());
    let mut merge = memory_merge(
        MailMergeBuilder::new().with_locator_reset(LocatorReset::ClearBeforeRun),
    );

    let first = merge
        .generate_per_client(&mut workbook)
        .unwrap()
        .completed()
        .unwrap();
    let second = merge
        .generate_per_client(&mut workbook)
        .unwrap()
        .completed()
        .unwrap();

    assert_eq!(second.generated, 3);
    assert_ne!(first.locators, second.locators);

    // ロケーター列は増えず、最新の実行結果だけが残る
    let sheet = workbook.sheet("Données").unwrap();
    assert_eq!(sheet.header().unwrap().fields().len(), 7);
    for (i, locator) in second.locators.iter().enumerate() {
        assert_eq!(sheet.cell(i + 2, 7), Some(&CellValue::from(locator.as_str())));
    }
}

#[test]
fn test_single_page_over_three_rows() {
    let workbook = load(&fixtures::three_clients());
    let mut merge = memory_merge(MailMergeBuilder::new());
    let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

    let report = merge
        .generate_single_page_on(&workbook, date)
        .unwrap()
        .completed()
        .unwrap();

    let headings: Vec<_> = report
        .document
        .blocks()
        .iter()
        .filter_map(|block| match block {
            Block::Paragraph {
                text,
                heading: Some(HeadingLevel::Heading2),
            } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(
        headings,
        vec!["Client ID: 7", "Client ID: 8", "Client ID: 9"]
    );

    let rules = report
        .document
        .blocks()
        .iter()
        .filter(|block| matches!(block, Block::HorizontalRule))
        .count();
    assert_eq!(rules, 3);

    let files = merge.storage().files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "Tous les clients - 2024-05-01.pdf");
    assert_eq!(files[0].name, format!("{}.pdf", report.title));
    assert!(files[0].bytes.starts_with(b"%PDF"));
}

#[test]
fn test_cancelled_run_has_no_side_effects() {
    let mut workbook = load(&fixtures::three_clients());
    let mut merge = MailMergeBuilder::new()
        .build_with(
            MemoryDocumentService::new(),
            MemoryStorage::new(),
            ScriptedPrompt::always(false),
        )
        .unwrap();

    let outcome = merge.generate_per_client(&mut workbook).unwrap();
    assert_eq!(outcome, RunOutcome::Cancelled);
    assert!(merge.documents().documents().is_empty());
    assert!(merge.storage().folders().is_empty());
    assert_eq!(workbook.sheet("Données").unwrap().last_column(), 6);
}

#[test]
fn test_local_backend_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clients.xlsx");
    std::fs::write(&path, fixtures::generate_clients(&fixtures::three_clients()).unwrap()).unwrap();

    let mut merge = MailMergeBuilder::new()
        .build_with(
            LocalDocumentService::new(dir.path().join("drafts"), DocumentFormat::Markdown),
            LocalStorage::new(dir.path()),
            TerminalPrompt::new(Cursor::new(Vec::new()), Vec::new(), true),
        )
        .unwrap();

    let mut workbook = Workbook::open(&path, utc()).unwrap();
    let report = merge
        .generate_per_client(&mut workbook)
        .unwrap()
        .completed()
        .unwrap();
    assert_eq!(report.generated, 3);

    // 文書はワークブックと同じディレクトリへ移動される
    let moved = dir.path().join("Client_7_Dupont.md");
    assert!(moved.exists());
    assert!(!dir.path().join("drafts").join("Client_7_Dupont.md").exists());
    let content = std::fs::read_to_string(&moved).unwrap();
    assert!(content.contains("Nom : Dupont"));
    assert!(content.contains("Date d’échéance : 01/05/2024"));

    // ロケーターはファイルに保存されている
    let reloaded = Workbook::open(&path, utc()).unwrap();
    let sheet = reloaded.sheet("Données").unwrap();
    match sheet.cell(2, 7) {
        Some(CellValue::String(locator)) => {
            assert!(locator.starts_with("file://"));
            assert!(locator.ends_with("Client_7_Dupont.md"));
        }
        other => panic!("unexpected locator cell {:?}", other),
    }
}
