//! Date Module
//!
//! 生年月日セルを`YYYY-MM-DD`形式に正規化するモジュール。
//! 解析できない値はエラーにせず、欠損として扱います。

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

use crate::types::CellValue;

/// 出力する日付形式（ISO 8601）
const ISO_DATE: &str = "%Y-%m-%d";

/// 日時として解釈を試みる書式（タイムゾーンなし）
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// 日付として解釈を試みる書式
///
/// `%m/%d/%Y`は米国式（月/日/年）として扱います。
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %B %Y",
    "%B %d, %Y",
    "%B %d %Y",
];

/// セル値を`YYYY-MM-DD`形式の日付文字列に変換する
///
/// # 戻り値
///
/// * `Some(String)` - 日付として解釈できた場合
/// * `None` - 空、または解釈できない場合
pub fn normalize_date(value: &CellValue) -> Option<String> {
    parse_date(value).map(|date| date.format(ISO_DATE).to_string())
}

/// セル値を日付として解釈する
pub fn parse_date(value: &CellValue) -> Option<NaiveDate> {
    match value {
        CellValue::Empty => None,
        CellValue::Date(dt) => Some(dt.date()),
        CellValue::Number(n) => serial_to_date(*n),
        CellValue::Text(s) => parse_date_text(s),
    }
}

/// 文字列を日付として解釈する
///
/// オフセット付きのRFC 3339タイムスタンプはUTCに変換してから日付部分を取り出します。
fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        })
}

/// スプレッドシートのシリアル日付値を日付に変換する（1900年システム）
///
/// # エポックシステム
///
/// - シリアル値1 = 1900年1月1日
/// - シリアル値60 = 1900年2月29日（存在しない日、Excelのうるう年バグ）
/// - シリアル値61以降は1899年12月30日起算
///
/// 1未満の値、存在しない日、範囲外の値は`None`を返します。
pub(crate) fn serial_to_date(serial_value: f64) -> Option<NaiveDate> {
    if !serial_value.is_finite() || serial_value < 1.0 {
        return None;
    }

    let days = serial_value.floor();
    // 9999-12-31
    if days > 2_958_465.0 {
        return None;
    }
    let days = days as i64;

    let epoch = match days {
        1..=59 => NaiveDate::from_ymd_opt(1899, 12, 31)?,
        60 => return None,
        _ => NaiveDate::from_ymd_opt(1899, 12, 30)?,
    };

    epoch.checked_add_signed(Duration::days(days))
}
