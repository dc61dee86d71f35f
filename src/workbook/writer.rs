//! rust_xlsxwriterを使用したXLSX書き込み。

use rust_xlsxwriter::{Color, Format, Workbook as XlsxWorkbook, Worksheet};
use std::path::Path;

use crate::error::MergeError;
use crate::normalizer::ExcelSerial;
use crate::types::CellValue;
use crate::workbook::{HeaderStyle, Sheet, Workbook};

/// 日付セルの表示形式
const DATE_NUM_FORMAT: &str = "dd/mm/yyyy";

pub(super) fn write_path(workbook: &Workbook, path: &Path) -> Result<(), MergeError> {
    let mut xlsx = build(workbook)?;
    xlsx.save(path)?;
    tracing::debug!(path = %path.display(), "workbook saved");
    Ok(())
}

pub(super) fn write_buffer(workbook: &Workbook) -> Result<Vec<u8>, MergeError> {
    let mut xlsx = build(workbook)?;
    Ok(xlsx.save_to_buffer()?)
}

fn build(workbook: &Workbook) -> Result<XlsxWorkbook, MergeError> {
    let mut xlsx = XlsxWorkbook::new();
    let date_format = Format::new().set_num_format(DATE_NUM_FORMAT);

    for sheet in workbook.sheets() {
        let worksheet = xlsx.add_worksheet();
        worksheet.set_name(sheet.name())?;
        write_sheet(worksheet, sheet, workbook, &date_format)?;
    }

    // 空のワークブックは保存できないため、空シートを1枚用意する
    if workbook.sheets().is_empty() {
        xlsx.add_worksheet();
    }
    Ok(xlsx)
}

fn write_sheet(
    worksheet: &mut Worksheet,
    sheet: &Sheet,
    workbook: &Workbook,
    date_format: &Format,
) -> Result<(), MergeError> {
    let header_format = sheet.header_style().map(header_format);

    for (coord, value) in sheet.cells() {
        let row = (coord.row - 1) as u32;
        let col = (coord.col - 1) as u16;

        if let (1, Some(format)) = (coord.row, header_format.as_ref()) {
            worksheet.write_string_with_format(row, col, value.as_raw_string(), format)?;
            continue;
        }

        match value {
            CellValue::Number(n) => {
                worksheet.write_number(row, col, *n)?;
            }
            CellValue::String(s) => {
                worksheet.write_string(row, col, s)?;
            }
            CellValue::Bool(b) => {
                worksheet.write_boolean(row, col, *b)?;
            }
            CellValue::DateTime(dt) => {
                let local = dt.with_timezone(&workbook.time_zone()).naive_local();
                match ExcelSerial::from_datetime(&local) {
                    Some(serial) => {
                        worksheet.write_number_with_format(row, col, serial, date_format)?;
                    }
                    None => {
                        worksheet.write_string(row, col, dt.to_rfc3339())?;
                    }
                }
            }
            CellValue::Error(e) => {
                worksheet.write_string(row, col, e)?;
            }
            CellValue::Empty => {}
        }
    }

    if let Some(style) = sheet.header_style() {
        if let Some(header) = sheet.header() {
            for col in 0..header.len() {
                worksheet.set_column_width(col as u16, style.column_width)?;
            }
        }
    }
    Ok(())
}

fn header_format(style: &HeaderStyle) -> Format {
    let mut format = Format::new()
        .set_font_name(style.font_name.as_str())
        .set_font_color(Color::RGB(style.font_color))
        .set_background_color(Color::RGB(style.background_color));
    if style.bold {
        format = format.set_bold();
    }
    format
}
