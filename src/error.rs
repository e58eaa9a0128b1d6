//! Error Types Module
//!
//! ホスト側の処理（ワークブック読み込み、JSON入出力、設定検証）で使用する
//! 構造化エラー型を定義するモジュール。
//! 行の変換処理そのものは全域関数であり、このエラー型を返すことはありません。

use thiserror::Error;

/// trae-feedクレート全体で使用するエラー型
///
/// # エラーの種類
///
/// - `Io`: 入出力中に発生したエラー
/// - `Parse`: ワークブックの読み込みに失敗したエラー（calamine由来）
/// - `Json`: JSON行の読み込み・書き出しに失敗したエラー
/// - `Config`: 設定の検証やシート選択に失敗したエラー
/// - `SecurityViolation`: 入力サイズ制限に違反したエラー
///
/// # 使用例
///
/// ```rust,no_run
/// use trae_feed::TraeFeedError;
/// use std::fs::File;
///
/// fn open_upload(path: &str) -> Result<File, TraeFeedError> {
///     let file = File::open(path)?; // Ioエラーが自動的に変換される
///     Ok(file)
/// }
/// ```
#[derive(Error, Debug)]
pub enum TraeFeedError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ワークブックの読み込み中に発生したエラー
    ///
    /// ファイル形式が不正、破損したファイルなどが原因となります。
    #[error("Failed to read workbook: {0}")]
    Parse(#[from] calamine::Error),

    /// JSONのシリアライズ・デシリアライズエラー
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// 設定の検証に失敗したエラー
    ///
    /// `ConverterBuilder::build()`時の検証失敗、存在しないシートの指定、
    /// オブジェクトでないJSON行などで発生します。
    ///
    /// ```rust,no_run
    /// use trae_feed::{ConverterBuilder, TraeFeedError};
    ///
    /// let result = ConverterBuilder::new().with_chunk_size(0).build();
    ///
    /// if let Err(TraeFeedError::Config(msg)) = result {
    ///     println!("設定エラー: {}", msg);
    /// }
    /// ```
    #[error("Configuration error: {0}")]
    Config(String),

    /// 入力サイズ制限に違反したエラー
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}
