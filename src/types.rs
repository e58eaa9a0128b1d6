//! Types Module
//!
//! 入力行とセル値を表す共通データ型を定義するモジュール。

use chrono::NaiveDateTime;

use crate::error::TraeFeedError;

/// セルの値を表す列挙型
///
/// ホストから渡される値は文字列・数値・日付・欠損のいずれかです。
/// 各フィールドの抽出処理はこの列挙型をパターンマッチして扱います。
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// 欠損値（空セル、null）
    Empty,

    /// 文字列
    Text(String),

    /// 数値（f64）
    Number(f64),

    /// 日付（スプレッドシートの日付セル）
    Date(NaiveDateTime),
}

impl CellValue {
    /// 値が空かどうかを判定
    ///
    /// 空白のみの文字列も空として扱います。
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(n) => n.is_nan(),
            CellValue::Date(_) => false,
        }
    }

    /// 値を文字列として取得（加工なし）
    ///
    /// 整数値の数値は小数部なしで文字列化します（`123.0` → `"123"`）。
    /// 空の値の場合は`None`を返します。
    pub fn as_text(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Date(dt) => Some(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
        }
    }

    /// 値を前後の空白を除去した文字列として取得
    pub fn as_trimmed_text(&self) -> Option<String> {
        self.as_text().map(|s| s.trim().to_string())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::Date(dt)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Empty)
    }
}

impl From<&serde_json::Value> for CellValue {
    fn from(value: &serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => CellValue::Empty,
            Value::Bool(b) => CellValue::Text(b.to_string()),
            Value::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or(CellValue::Empty),
            Value::String(s) => CellValue::Text(s.clone()),
            // 配列・オブジェクトはセル値として扱わない
            Value::Array(_) | Value::Object(_) => CellValue::Empty,
        }
    }
}

/// 数値を文字列化する
///
/// 整数として表現できる値は小数部を付けずに出力します。
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// 列ヘッダーを正規化する
///
/// 前後の引用符と空白を取り除きます（例: `"  \"name\" "` → `name`）。
pub fn normalize_header(header: &str) -> &str {
    header.trim_matches(|c: char| c.is_whitespace() || is_quote(c))
}

fn is_quote(c: char) -> bool {
    matches!(c, '"' | '\'' | '\u{201C}' | '\u{201D}' | '\u{2018}' | '\u{2019}')
}

/// 入力行（列ヘッダー → セル値の順序付きマッピング）
///
/// ヘッダーはホストから渡されたままの文字列で保持し、
/// 参照時に正規化します。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<(String, CellValue)>,
}

impl RawRow {
    /// 空の行を生成
    pub fn new() -> Self {
        Self::default()
    }

    /// セルを末尾に追加する
    pub fn push(&mut self, header: impl Into<String>, value: impl Into<CellValue>) {
        self.cells.push((header.into(), value.into()));
    }

    /// セルを追加した行を返す（ビルダー形式）
    pub fn with(mut self, header: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.push(header, value);
        self
    }

    /// 列ヘッダーを入力順に取得
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(h, _)| h.as_str())
    }

    /// セルを入力順に取得
    pub fn cells(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(h, v)| (h.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// JSONオブジェクトから行を生成する
    ///
    /// ブラウザ側のシートリーダーが出力する`{header: value}`形式を想定しています。
    pub fn from_json_object(object: &serde_json::Map<String, serde_json::Value>) -> Self {
        let cells = object
            .iter()
            .map(|(header, value)| (header.clone(), CellValue::from(value)))
            .collect();
        Self { cells }
    }

    /// JSON配列文字列から行のリストを生成する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Vec<RawRow>)` - 全要素がオブジェクトの場合
    /// * `Err(TraeFeedError::Json)` - JSONとして不正な場合
    /// * `Err(TraeFeedError::Config)` - 配列でない、またはオブジェクト以外の要素を含む場合
    pub fn parse_json_rows(input: &str) -> Result<Vec<RawRow>, TraeFeedError> {
        let value: serde_json::Value = serde_json::from_str(input)?;
        let items = value.as_array().ok_or_else(|| {
            TraeFeedError::Config("JSON rows must be an array of objects".to_string())
        })?;

        items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                item.as_object().map(RawRow::from_json_object).ok_or_else(|| {
                    TraeFeedError::Config(format!("JSON row {} is not an object", idx))
                })
            })
            .collect()
    }
}

impl<H: Into<String>, V: Into<CellValue>> FromIterator<(H, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (H, V)>>(iter: I) -> Self {
        let cells = iter
            .into_iter()
            .map(|(h, v)| (h.into(), v.into()))
            .collect();
        Self { cells }
    }
}
