//! Sheet Module
//!
//! calamineで読み込んだワークシートを入力行に変換するモジュール。
//! 先頭行を列ヘッダーとして扱い、2行目以降を1行ずつ`RawRow`にします。

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use std::io::Cursor;

use crate::api::SheetSelector;
use crate::error::TraeFeedError;
use crate::types::{CellValue, RawRow};

/// ワークブックリーダー
///
/// calamineのラッパーとして、シート選択と行の抽出を提供します。
/// 形式（XLSX、XLS、ODS等）はcalamineが自動判定します。
pub(crate) struct WorkbookReader {
    workbook: Sheets<Cursor<Vec<u8>>>,
}

impl WorkbookReader {
    /// メモリ上のバイト列からワークブックを開く
    ///
    /// # 戻り値
    ///
    /// * `Ok(WorkbookReader)` - ワークブックの読み込みに成功した場合
    /// * `Err(TraeFeedError::Parse)` - ワークブックとして解釈できない場合
    pub fn open(buffer: Vec<u8>) -> Result<Self, TraeFeedError> {
        let workbook = open_workbook_auto_from_rs(Cursor::new(buffer))?;
        Ok(Self { workbook })
    }

    /// すべてのシート名を取得
    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    /// シート選択方式に基づいてシートを1つ選択
    ///
    /// # 戻り値
    ///
    /// * `Ok(String)` - 選択されたシート名
    /// * `Err(TraeFeedError::Config)` - シートが存在しない、またはインデックスが範囲外の場合
    pub fn select_sheet(&self, selector: &SheetSelector) -> Result<String, TraeFeedError> {
        let names = self.sheet_names();

        match selector {
            SheetSelector::First => names
                .into_iter()
                .next()
                .ok_or_else(|| TraeFeedError::Config("Workbook contains no sheets".to_string())),

            SheetSelector::Index(index) => {
                let total = names.len();
                names.into_iter().nth(*index).ok_or_else(|| {
                    TraeFeedError::Config(format!(
                        "Sheet index {} is out of range (total: {})",
                        index, total
                    ))
                })
            }

            SheetSelector::Name(name) => {
                if names.contains(name) {
                    Ok(name.clone())
                } else {
                    Err(TraeFeedError::Config(format!("Sheet '{}' not found", name)))
                }
            }
        }
    }

    /// シートを読み込み、入力行のリストを返す
    pub fn read_rows(&mut self, sheet_name: &str) -> Result<Vec<RawRow>, TraeFeedError> {
        let range = self.workbook.worksheet_range(sheet_name)?;
        Ok(rows_from_range(&range))
    }
}

/// ワークブックのバイト列から選択したシートの入力行を読み込む
pub fn read_sheet_rows(
    buffer: Vec<u8>,
    selector: &SheetSelector,
) -> Result<Vec<RawRow>, TraeFeedError> {
    let mut reader = WorkbookReader::open(buffer)?;
    let sheet_name = reader.select_sheet(selector)?;
    let rows = reader.read_rows(&sheet_name)?;
    tracing::debug!(sheet = %sheet_name, rows = rows.len(), "read worksheet");
    Ok(rows)
}

/// セル範囲を入力行のリストに変換する
///
/// - 先頭行を列ヘッダーとし、ヘッダーが空の列は読み飛ばします
/// - 値のないセルは`CellValue::Empty`として行に含めます
/// - すべてのセルが空の行は出力しません
///
/// # 引数
///
/// * `range` - calamineのセル範囲
pub fn rows_from_range(range: &Range<Data>) -> Vec<RawRow> {
    let mut rows = range.rows();

    let headers: Vec<Option<String>> = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|cell| cell_value(cell).as_trimmed_text())
            .collect(),
        None => return Vec::new(),
    };

    rows.filter(|cells| cells.iter().any(|cell| !cell_value(cell).is_empty()))
        .map(|cells| {
            headers
                .iter()
                .enumerate()
                .filter_map(|(col, header)| {
                    let header = header.as_ref()?;
                    let value = cells.get(col).map(cell_value).unwrap_or(CellValue::Empty);
                    Some((header.clone(), value))
                })
                .collect()
        })
        .collect()
}

/// calamineのセル値を`CellValue`に変換する
///
/// 真偽値は文字列（`"true"`/`"false"`）、エラーセルは欠損値として扱います。
/// 日付セルの変換はcalamineに任せるため、1904年システムのブックも正しく読めます。
pub fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::Date)
            .unwrap_or(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) | Data::Empty => CellValue::Empty,
    }
}
