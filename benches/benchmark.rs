//! パフォーマンスベンチマーク
//!
//! rust_xlsxwriterで生成した顧客表を使い、以下を測定します。
//!
//! - XLSXの読み込み
//! - メモリバックエンドでの顧客ごとの一括生成（行数あたりのスループット）
//! - 1ページ集約とPDF出力

use chrono::{FixedOffset, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mergezero::services::memory::{MemoryDocumentService, MemoryStorage, ScriptedPrompt};
use mergezero::{MailMergeBuilder, Workbook};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook as XlsxWorkbook};
use std::io::Cursor;

const ROW_COUNTS: [usize; 3] = [10, 100, 1_000];

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

/// `rows`行の顧客表を生成
fn generate_clients(rows: usize) -> Vec<u8> {
    let mut workbook = XlsxWorkbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Données").unwrap();

    let header = ["Id", "ClientName", "Address", "Phone", "Email", "DueDate"];
    for (col, name) in header.iter().enumerate() {
        worksheet.write_string(0, col as u16, *name).unwrap();
    }

    let date_format = Format::new().set_num_format("dd/mm/yyyy");
    let due = ExcelDateTime::from_ymd(2024, 5, 1).unwrap();
    for i in 0..rows {
        let row = (i + 1) as u32;
        worksheet.write_number(row, 0, i as f64).unwrap();
        worksheet
            .write_string(row, 1, format!("Client {}", i))
            .unwrap();
        worksheet
            .write_string(row, 2, format!("{} Rue de la Paix", i))
            .unwrap();
        worksheet.write_number(row, 3, 612345678.0).unwrap();
        worksheet
            .write_string(row, 4, format!("client{}@example.com", i))
            .unwrap();
        worksheet
            .write_datetime_with_format(row, 5, &due, &date_format)
            .unwrap();
    }

    workbook.save_to_buffer().unwrap()
}

fn benchmark_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_workbook");
    for rows in ROW_COUNTS {
        let data = generate_clients(rows);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &data, |b, data| {
            b.iter(|| {
                let workbook = Workbook::from_reader(Cursor::new(black_box(data)), utc()).unwrap();
                black_box(workbook)
            });
        });
    }
    group.finish();
}

fn benchmark_per_client(c: &mut Criterion) {
    let mut group = c.benchmark_group("per_client");
    for rows in ROW_COUNTS {
        let source = Workbook::from_reader(Cursor::new(generate_clients(rows)), utc()).unwrap();
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &source, |b, source| {
            b.iter(|| {
                let mut workbook = source.clone();
                let mut merge = MailMergeBuilder::new()
                    .with_confirmation(false)
                    .build_with(
                        MemoryDocumentService::new(),
                        MemoryStorage::new(),
                        ScriptedPrompt::default(),
                    )
                    .unwrap();
                black_box(merge.generate_per_client(&mut workbook).unwrap())
            });
        });
    }
    group.finish();
}

fn benchmark_single_page(c: &mut Criterion) {
    let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let mut group = c.benchmark_group("single_page_pdf");
    group.sample_size(20);
    for rows in [10, 100] {
        let source = Workbook::from_reader(Cursor::new(generate_clients(rows)), utc()).unwrap();
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &source, |b, source| {
            b.iter(|| {
                let mut merge = MailMergeBuilder::new()
                    .with_confirmation(false)
                    .build_with(
                        MemoryDocumentService::new(),
                        MemoryStorage::new(),
                        ScriptedPrompt::default(),
                    )
                    .unwrap();
                black_box(merge.generate_single_page_on(source, date).unwrap())
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_read,
    benchmark_per_client,
    benchmark_single_page
);
criterion_main!(benches);
