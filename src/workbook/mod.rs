//! Workbook Module
//!
//! 顧客データを保持するワークブックのメモリ上のモデル。
//! 読み込みは`calamine`（[`reader`]）、書き戻しは`rust_xlsxwriter`（[`writer`]）で行います。
//!
//! 行・列の番号はすべて1始まりです（1行目がヘッダー）。

mod reader;
mod writer;

use chrono::{FixedOffset, Offset, Utc};
use std::path::{Path, PathBuf};

use crate::error::MergeError;
use crate::types::{CellCoord, CellValue, FieldSchema};

/// 既定のシート名
pub const DEFAULT_SHEET_NAME: &str = "Données";

/// ヘッダー行のスタイル
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderStyle {
    pub bold: bool,
    pub font_name: String,
    /// 文字色（0xRRGGBB）
    pub font_color: u32,
    /// 背景色（0xRRGGBB）
    pub background_color: u32,
    pub column_width: f64,
}

impl Default for HeaderStyle {
    fn default() -> Self {
        Self {
            bold: true,
            font_name: "Arial".to_string(),
            font_color: 0xFFFFFF,
            background_color: 0x4285F4,
            column_width: 25.0,
        }
    }
}

/// ワークシート
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    name: String,
    rows: Vec<Vec<CellValue>>,
    header_style: Option<HeaderStyle>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            header_style: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 値を持つ最後の行（値がなければ0）
    pub fn last_row(&self) -> usize {
        self.rows
            .iter()
            .rposition(|row| row.iter().any(|v| !v.is_empty()))
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    /// 値を持つ最後の列（値がなければ0）
    pub fn last_column(&self) -> usize {
        self.rows
            .iter()
            .filter_map(|row| row.iter().rposition(|v| !v.is_empty()))
            .max()
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    /// 1行目を列名のリストとして取得
    ///
    /// 1行目が空の場合は`None`を返します。
    pub fn header(&self) -> Option<FieldSchema> {
        let first = self.rows.first()?;
        let width = first.iter().rposition(|v| !v.is_empty())? + 1;
        Some(FieldSchema::new(
            first[..width].iter().map(CellValue::as_raw_string).collect(),
        ))
    }

    /// 指定行の値を`width`列分取得（足りない列は空セル）
    pub fn row_values(&self, row: usize, width: usize) -> Vec<CellValue> {
        let mut values = row
            .checked_sub(1)
            .and_then(|i| self.rows.get(i))
            .map(|r| r.iter().take(width).cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        values.resize(width, CellValue::Empty);
        values
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        let r = row.checked_sub(1)?;
        let c = col.checked_sub(1)?;
        self.rows.get(r)?.get(c)
    }

    /// セルに値を設定（必要に応じてグリッドを拡張）
    pub fn set_cell(
        &mut self,
        row: usize,
        col: usize,
        value: impl Into<CellValue>,
    ) -> Result<(), MergeError> {
        if row == 0 || col == 0 {
            return Err(MergeError::Config(format!(
                "Cell coordinates are 1-based, got row {} column {}",
                row, col
            )));
        }
        if self.rows.len() < row {
            self.rows.resize_with(row, Vec::new);
        }
        let cells = &mut self.rows[row - 1];
        if cells.len() < col {
            cells.resize(col, CellValue::Empty);
        }
        cells[col - 1] = value.into();
        Ok(())
    }

    /// `from_row`行目以降の指定列を空にする
    pub fn clear_column(&mut self, col: usize, from_row: usize) {
        let Some(c) = col.checked_sub(1) else {
            return;
        };
        for row in self.rows.iter_mut().skip(from_row.saturating_sub(1)) {
            if let Some(cell) = row.get_mut(c) {
                *cell = CellValue::Empty;
            }
        }
    }

    /// ヘッダー行を書き込む（既存の1行目は置き換え）
    pub fn write_header(&mut self, names: &[String]) -> Result<(), MergeError> {
        if let Some(first) = self.rows.first_mut() {
            first.clear();
        }
        for (i, name) in names.iter().enumerate() {
            self.set_cell(1, i + 1, name.as_str())?;
        }
        Ok(())
    }

    pub fn header_style(&self) -> Option<&HeaderStyle> {
        self.header_style.as_ref()
    }

    pub fn set_header_style(&mut self, style: HeaderStyle) {
        self.header_style = Some(style);
    }

    /// 値を持つセルを座標付きで列挙
    pub fn cells(&self) -> impl Iterator<Item = (CellCoord, &CellValue)> {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, v)| !matches!(v, CellValue::Empty))
                .map(move |(c, v)| (CellCoord::new(r + 1, c + 1), v))
        })
    }

    pub(crate) fn from_rows(name: String, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name,
            rows,
            header_style: None,
        }
    }
}

/// ワークブック
///
/// 日付セルは読み込み時に指定したタイムゾーンの壁時計時刻として解釈され、
/// 書き戻し時も同じタイムゾーンでシリアル値に変換されます。
#[derive(Debug, Clone, PartialEq)]
pub struct Workbook {
    path: Option<PathBuf>,
    sheets: Vec<Sheet>,
    time_zone: FixedOffset,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbook {
    /// 空のワークブックを作成（UTC、パスなし）
    pub fn new() -> Self {
        Self {
            path: None,
            sheets: Vec::new(),
            time_zone: Utc.fix(),
        }
    }

    /// XLSXファイルを開く
    ///
    /// # 引数
    ///
    /// * `path` - XLSXファイルのパス
    /// * `time_zone` - 日付セルを解釈するタイムゾーン
    ///
    /// # 戻り値
    ///
    /// * `Ok(Workbook)` - 読み込みに成功した場合（`path()`はこのパスを返す）
    /// * `Err(MergeError)` - ファイルが開けない、XLSXでない、サイズ上限を超える場合
    pub fn open(path: impl AsRef<Path>, time_zone: FixedOffset) -> Result<Self, MergeError> {
        let path = path.as_ref();
        let mut workbook = reader::read_path(path, time_zone)?;
        workbook.path = Some(path.to_path_buf());
        Ok(workbook)
    }

    /// リーダーからXLSXを読み込む（パスは設定されない）
    pub fn from_reader<R: std::io::Read>(
        reader: R,
        time_zone: FixedOffset,
    ) -> Result<Self, MergeError> {
        reader::read(reader, time_zone)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
    }

    pub fn time_zone(&self) -> FixedOffset {
        self.time_zone
    }

    pub fn set_time_zone(&mut self, time_zone: FixedOffset) {
        self.time_zone = time_zone;
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(Sheet::name).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    /// シートを取得し、存在しなければ末尾に追加する
    pub fn sheet_or_insert(&mut self, name: &str) -> &mut Sheet {
        let index = match self.sheets.iter().position(|s| s.name == name) {
            Some(index) => index,
            None => {
                self.sheets.push(Sheet::new(name));
                self.sheets.len() - 1
            }
        };
        &mut self.sheets[index]
    }

    /// 読み込み元のパスへ書き戻す
    pub fn save(&self) -> Result<(), MergeError> {
        let path = self.path.as_deref().ok_or_else(|| {
            MergeError::Config("Workbook has no path; use save_as".to_string())
        })?;
        writer::write_path(self, path)
    }

    /// 指定パスへ書き込み、以後の保存先とする
    pub fn save_as(&mut self, path: impl Into<PathBuf>) -> Result<(), MergeError> {
        let path = path.into();
        writer::write_path(self, &path)?;
        self.path = Some(path);
        Ok(())
    }

    /// XLSXのバイト列として書き出す
    pub fn save_to_buffer(&self) -> Result<Vec<u8>, MergeError> {
        writer::write_buffer(self)
    }

    pub(crate) fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub(crate) fn from_sheets(sheets: Vec<Sheet>, time_zone: FixedOffset) -> Self {
        Self {
            path: None,
            sheets,
            time_zone,
        }
    }
}
