//! WebAssembly bindings
//!
//! ブラウザから変換処理を呼び出すためのエントリーポイント。
//! `wasm`フィーチャーを有効にしてwasm32向けにビルドした場合のみ含まれます。

use wasm_bindgen::prelude::*;

use crate::builder::ConverterBuilder;
use crate::error::TraeFeedError;
use crate::types::RawRow;

fn to_js_error(error: TraeFeedError) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// JSON配列（`{header: value}`の配列）をJSON Lines形式に変換する
#[wasm_bindgen(js_name = convertRowsJson)]
pub fn convert_rows_json(rows_json: &str) -> Result<String, JsValue> {
    let rows = RawRow::parse_json_rows(rows_json).map_err(to_js_error)?;
    let converter = ConverterBuilder::new().build().map_err(to_js_error)?;
    converter.convert_rows_to_jsonl(&rows).map_err(to_js_error)
}

/// ワークブックのバイト列をJSON Lines形式に変換する
#[wasm_bindgen(js_name = convertWorkbook)]
pub fn convert_workbook(bytes: &[u8]) -> Result<String, JsValue> {
    let converter = ConverterBuilder::new().build().map_err(to_js_error)?;
    converter
        .convert_to_string(std::io::Cursor::new(bytes))
        .map_err(to_js_error)
}

/// ダウンロード用のファイル名を生成する（`Date.now()`のミリ秒を渡す）
#[wasm_bindgen(js_name = jsonlFileName)]
pub fn jsonl_file_name(timestamp_millis: f64) -> String {
    crate::output::jsonl_file_name(timestamp_millis as i64)
}
