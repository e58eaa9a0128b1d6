//! Output Formatters Implementation
//!
//! 各出力フォーマットの実装を提供するモジュール。

use crate::error::TraeFeedError;
use crate::record::NormalizedRecord;
use std::io::Write;

/// JSON Lines形式のフォーマッター
pub struct JsonlFormatter;

impl JsonlFormatter {
    pub fn render<W: Write>(
        &self,
        records: &[NormalizedRecord],
        writer: &mut W,
    ) -> Result<(), TraeFeedError> {
        for (idx, record) in records.iter().enumerate() {
            if idx > 0 {
                writer.write_all(b"\n")?;
            }
            serde_json::to_writer(&mut *writer, record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// JSON形式のフォーマッター（整形済み配列）
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn render<W: Write>(
        &self,
        records: &[NormalizedRecord],
        writer: &mut W,
    ) -> Result<(), TraeFeedError> {
        serde_json::to_writer_pretty(&mut *writer, records)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}
