//! Normalizer Module
//!
//! セル値を文書に差し込む表示文字列へ変換するモジュール。
//! 電話番号の先頭ゼロ補完と、日付の`DD/MM/YYYY`形式への変換を行います。

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Timelike};

use crate::api::ValueEscaping;
use crate::error::MergeError;
use crate::types::{CellValue, Record};

/// 日付の出力書式（DD/MM/YYYY）
const DATE_FORMAT: &str = "%d/%m/%Y";

/// 1日の秒数
const SECONDS_PER_DAY: f64 = 86_400.0;

/// 値ノーマライザー
///
/// 電話番号列の判定に使う列名と、日付の表示に使うタイムゾーンを保持します。
/// 変換は失敗しません。未知の型はそのまま文字列化されます。
#[derive(Debug, Clone)]
pub struct ValueNormalizer {
    /// 電話番号の列名
    phone_key: String,

    /// 日付表示のタイムゾーン
    time_zone: FixedOffset,
}

impl ValueNormalizer {
    pub fn new(phone_key: impl Into<String>, time_zone: FixedOffset) -> Self {
        Self {
            phone_key: phone_key.into(),
            time_zone,
        }
    }

    pub fn time_zone(&self) -> FixedOffset {
        self.time_zone
    }

    /// セル値を表示文字列に変換
    ///
    /// # 変換規則
    ///
    /// 1. 電話番号列の数値: `"0"` + 10進表記（例: `612345678` → `"0612345678"`）
    /// 2. 日付: 設定タイムゾーンでの`DD/MM/YYYY`
    /// 3. その他: そのまま文字列化（空セルは空文字列）
    pub fn normalize(&self, field: &str, value: &CellValue) -> String {
        match value {
            CellValue::Number(n) if field == self.phone_key => format!("0{}", n),
            CellValue::DateTime(dt) => self.format_date(dt),
            other => other.as_raw_string(),
        }
    }

    /// ヘッダーと行の値からレコードを構築
    ///
    /// 値が足りない列は空セルとして扱います。
    pub fn build_record(&self, headers: &[String], values: &[CellValue]) -> Record {
        let mut record = Record::new();
        for (i, header) in headers.iter().enumerate() {
            let value = values.get(i).unwrap_or(&CellValue::Empty);
            record.insert(header.clone(), self.normalize(header, value));
        }
        record
    }

    fn format_date(&self, dt: &DateTime<FixedOffset>) -> String {
        dt.with_timezone(&self.time_zone)
            .format(DATE_FORMAT)
            .to_string()
    }
}

/// 差し込み値をエスケープ
pub(crate) fn escape_value(value: &str, escaping: ValueEscaping) -> String {
    match escaping {
        ValueEscaping::Verbatim => value.to_string(),
        ValueEscaping::Markdown => escape_markdown(value),
    }
}

/// Markdown特殊文字をエスケープ
fn escape_markdown(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' | '`' | '*' | '_' | '#' | '[' | ']' | '|' | '<' | '>' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            '\n' => escaped.push_str("  \n"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// タイムゾーン文字列を解析
///
/// `"UTC"`、`"Z"`、空文字列はUTC。それ以外は`"+01:00"`、`"-05:30"`、`"+2"`の形式です。
pub fn parse_time_zone(value: &str) -> Result<FixedOffset, MergeError> {
    let trimmed = value.trim();
    let invalid = || MergeError::Config(format!("Invalid time zone: '{}'", value));

    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let sign = if trimmed.starts_with('-') { -1 } else { 1 };
    let body = trimmed.trim_start_matches(['+', '-']);
    let (hours, minutes) = match body.split_once(':') {
        Some((h, m)) => (h, m),
        None if body.len() == 4 => body.split_at(2),
        None => (body, "0"),
    };

    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// Excelシリアル値（1900年システム）と日時の相互変換
///
/// 1899年12月30日起算。シリアル値60（存在しない1900-02-29）未満は
/// Excelのうるう年バグを考慮して1日ずらします。
pub(crate) struct ExcelSerial;

impl ExcelSerial {
    fn epoch() -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(1899, 12, 30).and_then(|d| d.and_hms_opt(0, 0, 0))
    }

    /// シリアル値を日時に変換（秒単位に丸める）
    pub fn to_datetime(serial: f64) -> Option<NaiveDateTime> {
        if !serial.is_finite() || serial < 0.0 {
            return None;
        }
        let days = serial.floor() as i64;
        let seconds = ((serial - serial.floor()) * SECONDS_PER_DAY).round() as i64;
        let bug_offset = if days < 60 { 1 } else { 0 };

        Self::epoch()?
            .checked_add_signed(Duration::days(days + bug_offset))?
            .checked_add_signed(Duration::seconds(seconds))
    }

    /// 日時をシリアル値に変換
    pub fn from_datetime(dt: &NaiveDateTime) -> Option<f64> {
        let epoch = Self::epoch()?;
        let days = (dt.date() - epoch.date()).num_days();
        let days = if days <= 60 { days - 1 } else { days };
        let seconds = dt.time().num_seconds_from_midnight() as f64;
        Some(days as f64 + seconds / SECONDS_PER_DAY)
    }
}
