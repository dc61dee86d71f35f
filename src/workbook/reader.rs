//! calamineを使用したXLSX読み込み。

use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use crate::error::MergeError;
use crate::normalizer::ExcelSerial;
use crate::security::SecurityConfig;
use crate::types::CellValue;
use crate::workbook::{Sheet, Workbook};

/// パスからワークブックを読み込む
pub(super) fn read_path(path: &Path, time_zone: FixedOffset) -> Result<Workbook, MergeError> {
    // 読み込む前にサイズを確認する
    let size = std::fs::metadata(path)?.len();
    SecurityConfig::default().check_input_size(size)?;

    read(File::open(path)?, time_zone)
}

/// リーダーからワークブックを読み込む
///
/// ファイル全体をメモリに読み込んでからcalamineに渡します。XLSX以外の形式は拒否します。
pub(super) fn read<R: Read>(mut reader: R, time_zone: FixedOffset) -> Result<Workbook, MergeError> {
    let security_config = SecurityConfig::default();

    let mut buffer = Vec::new();
    let bytes_read = reader
        .by_ref()
        .take(security_config.max_input_file_size + 1)
        .read_to_end(&mut buffer)?;
    security_config.check_input_size(bytes_read as u64)?;

    let sheets = open_workbook_auto_from_rs(Cursor::new(buffer)).map_err(MergeError::Parse)?;
    let mut xlsx = match sheets {
        Sheets::Xlsx(workbook) => workbook,
        _ => {
            return Err(MergeError::Config(
                "Only XLSX format is supported".to_string(),
            ))
        }
    };

    let names = xlsx.sheet_names().to_vec();
    let mut result = Vec::with_capacity(names.len());
    for name in names {
        let range = xlsx
            .worksheet_range(&name)
            .map_err(|e| MergeError::Parse(e.into()))?;

        // rangeは最初の値を持つセルから始まるため、絶対位置に戻す
        let (row_offset, col_offset) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); row_offset];
        for row in range.rows() {
            let mut cells = vec![CellValue::Empty; col_offset];
            cells.extend(row.iter().map(|cell| convert_cell(cell, time_zone)));
            rows.push(cells);
        }

        tracing::debug!(sheet = %name, rows = rows.len(), "sheet loaded");
        result.push(Sheet::from_rows(name, rows));
    }

    Ok(Workbook::from_sheets(result, time_zone))
}

/// calamineのセル値を変換
///
/// 日付はExcelシリアル値から、`time_zone`における壁時計時刻として解釈します。
fn convert_cell(cell: &Data, time_zone: FixedOffset) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::String(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            match ExcelSerial::to_datetime(serial).and_then(|naive| localize(naive, time_zone)) {
                Some(value) => CellValue::DateTime(value),
                None => CellValue::Number(serial),
            }
        }
        Data::DateTimeIso(s) => parse_iso(s)
            .and_then(|naive| localize(naive, time_zone))
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::String(s.clone())),
        Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
        Data::Empty => CellValue::Empty,
    }
}

fn localize(naive: NaiveDateTime, time_zone: FixedOffset) -> Option<DateTime<FixedOffset>> {
    naive.and_local_timezone(time_zone).single()
}

fn parse_iso(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
