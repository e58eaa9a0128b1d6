//! Output Format Module
//!
//! Strategy Patternによる出力フォーマットの抽象化を提供するモジュール。

mod formatters;

use crate::api::OutputFormat;
use crate::error::TraeFeedError;
use crate::record::NormalizedRecord;
use std::io::Write;

pub use formatters::*;

/// 出力フォーマッター（Strategy Pattern）
#[derive(Debug, Clone, Copy)]
pub enum OutputFormatter {
    Jsonl,
    Json,
}

impl OutputFormatter {
    /// 出力フォーマットからフォーマッターを生成
    pub fn from_format(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Jsonl => OutputFormatter::Jsonl,
            OutputFormat::Json => OutputFormatter::Json,
        }
    }

    /// レコードを指定されたフォーマットで出力する
    ///
    /// # 引数
    ///
    /// * `records` - 出力するレコード
    /// * `writer` - 出力先のライター
    ///
    /// # 戻り値
    ///
    /// * `Ok(())` - 出力に成功した場合
    /// * `Err(TraeFeedError)` - エラーが発生した場合
    pub fn render<W: Write>(
        &self,
        records: &[NormalizedRecord],
        writer: &mut W,
    ) -> Result<(), TraeFeedError> {
        match self {
            OutputFormatter::Jsonl => JsonlFormatter.render(records, writer),
            OutputFormatter::Json => JsonFormatter.render(records, writer),
        }
    }
}

/// レコードをJSON Lines形式の文字列に変換する
///
/// 1行に1レコードを出力し、改行（`\n`）で連結します。末尾に改行は付きません。
///
/// ```rust
/// use trae_feed::{to_jsonl, transform_row, RawRow};
///
/// let records = vec![
///     transform_row(&RawRow::new().with("id", "1"), &[]),
///     transform_row(&RawRow::new().with("id", "2"), &[]),
/// ];
/// let jsonl = to_jsonl(&records).unwrap();
/// assert_eq!(jsonl.lines().count(), 2);
/// assert!(!jsonl.ends_with('\n'));
/// ```
pub fn to_jsonl(records: &[NormalizedRecord]) -> Result<String, TraeFeedError> {
    let mut buffer = Vec::new();
    write_jsonl(records, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| TraeFeedError::Config(format!("UTF-8 conversion error: {}", e)))
}

/// レコードをJSON Lines形式でライターに書き込む
pub fn write_jsonl<W: Write>(records: &[NormalizedRecord], mut writer: W) -> Result<(), TraeFeedError> {
    JsonlFormatter.render(records, &mut writer)
}

/// ダウンロード用のファイル名を生成する
///
/// # 引数
///
/// * `timestamp_millis` - UNIXエポックからのミリ秒
///
/// ```rust
/// use trae_feed::jsonl_file_name;
///
/// assert_eq!(jsonl_file_name(1700000000000), "ISO_Converted_1700000000000.jsonl");
/// ```
pub fn jsonl_file_name(timestamp_millis: i64) -> String {
    format!("ISO_Converted_{}.jsonl", timestamp_millis)
}
