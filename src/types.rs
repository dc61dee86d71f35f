//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use chrono::{DateTime, FixedOffset};
use std::fmt;

/// セルの値を表す列挙型
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// 数値（f64）
    Number(f64),

    /// 文字列
    String(String),

    /// 論理値
    Bool(bool),

    /// 日付・日時（タイムゾーン付きの時点）
    DateTime(DateTime<FixedOffset>),

    /// エラー値（例: #DIV/0!）
    Error(String),

    /// 空セル
    Empty,
}

impl CellValue {
    /// 値が空かどうかを判定
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// 値を文字列として取得（正規化前）
    ///
    /// 整数値の数値は小数部なしで出力されます（例: `7.0` → `"7"`）。
    pub fn as_raw_string(&self) -> String {
        match self {
            CellValue::Number(n) => n.to_string(),
            CellValue::String(s) => s.clone(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::DateTime(dt) => dt.to_rfc3339(),
            CellValue::Error(e) => e.clone(),
            CellValue::Empty => String::new(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::String(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<DateTime<FixedOffset>> for CellValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        CellValue::DateTime(value)
    }
}

/// セル座標（1始まり、1行目はヘッダー行）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    pub row: usize,
    pub col: usize,
}

impl CellCoord {
    /// 新しい座標を生成
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// A1形式の文字列に変換（例: (1, 1) -> "A1"）
    #[allow(clippy::wrong_self_convention)]
    pub fn to_a1_notation(&self) -> String {
        format!("{}{}", Self::col_index_to_letter(self.col), self.row)
    }

    /// 列番号を文字列に変換（1 -> "A", 26 -> "Z", 27 -> "AA"）
    fn col_index_to_letter(col: usize) -> String {
        let mut result = String::new();
        let mut col = col.max(1) - 1;
        loop {
            let remainder = col % 26;
            result.insert(0, (b'A' + remainder as u8) as char);
            if col < 26 {
                break;
            }
            col = col / 26 - 1;
        }
        result
    }
}

/// 列名の順序付きリスト（シートの1行目）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldSchema {
    fields: Vec<String>,
}

impl FieldSchema {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 列名の位置（1始まり）
    pub fn column_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name).map(|i| i + 1)
    }
}

/// 1件の顧客レコード（正規化済みの値）
///
/// キーの順序はヘッダーの順序を保持します。同じキーが複数ある場合、
/// 値は後のもので上書きされますが、位置は最初のものを維持します。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    entries: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// 値を設定（既存キーは上書き）
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 値を取得（存在しない場合は空文字列）
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 生成物を識別するロケーター（URL）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator(String);

impl Locator {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_cell_value_is_empty() {
        assert!(CellValue::Empty.is_empty());
        assert!(CellValue::String(String::new()).is_empty());
        assert!(!CellValue::Number(42.0).is_empty());
        assert!(!CellValue::String("test".to_string()).is_empty());
        assert!(!CellValue::Bool(false).is_empty());
    }

    #[test]
    fn test_cell_value_as_raw_string() {
        assert_eq!(CellValue::Empty.as_raw_string(), "");
        assert_eq!(CellValue::Number(42.5).as_raw_string(), "42.5");
        assert_eq!(CellValue::Number(7.0).as_raw_string(), "7");
        assert_eq!(CellValue::from("hello").as_raw_string(), "hello");
        assert_eq!(CellValue::Bool(true).as_raw_string(), "true");
        assert_eq!(
            CellValue::Error("#DIV/0!".to_string()).as_raw_string(),
            "#DIV/0!"
        );

        let utc = FixedOffset::east_opt(0).unwrap();
        let dt = utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        assert_eq!(
            CellValue::DateTime(dt).as_raw_string(),
            "2024-05-01T00:00:00+00:00"
        );
    }

    #[test]
    fn test_cell_coord_to_a1_notation() {
        assert_eq!(CellCoord::new(1, 1).to_a1_notation(), "A1");
        assert_eq!(CellCoord::new(1, 26).to_a1_notation(), "Z1");
        assert_eq!(CellCoord::new(1, 27).to_a1_notation(), "AA1");
        assert_eq!(CellCoord::new(100, 702).to_a1_notation(), "ZZ100");
        assert_eq!(CellCoord::new(2, 7).to_a1_notation(), "G2");
    }

    #[test]
    fn test_field_schema_column_of() {
        let schema = FieldSchema::new(vec!["Id".to_string(), "ClientName".to_string()]);
        assert_eq!(schema.column_of("ClientName"), Some(2));
        assert_eq!(schema.column_of("URL Document"), None);
        assert_eq!(schema.len(), 2);
    }

    #[test]
    fn test_record_keeps_first_position_on_overwrite() {
        let mut record = Record::new();
        record.insert("Id", "7");
        record.insert("ClientName", "Dupont");
        record.insert("Id", "8");

        let keys: Vec<&str> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Id", "ClientName"]);
        assert_eq!(record.get("Id"), Some("8"));
        assert_eq!(record.get_or_empty("Email"), "");
    }
}
