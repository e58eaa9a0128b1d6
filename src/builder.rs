//! Builder Module
//!
//! Fluent Builder APIを提供し、`Converter`インスタンスを段階的に構築する。

use crate::api::{
    AliasColumnRule, ColumnMapping, OutputFormat, ParentList, SheetSelector,
    DEFAULT_PROFILE_ID_PREFIX,
};
use crate::error::TraeFeedError;
use crate::output::{to_jsonl, OutputFormatter};
use crate::record::NormalizedRecord;
use crate::sheet::read_sheet_rows;
use crate::transform::{detect_alias_columns, RecordTransformer};
use crate::types::RawRow;
use rayon::prelude::*;
use std::io::{BufWriter, Read, Seek, Write};

/// 既定のチャンクサイズ（行数）
pub const DEFAULT_CHUNK_SIZE: usize = 1_000;

/// 入力ファイルの既定の最大サイズ（2GB）
pub const DEFAULT_MAX_INPUT_SIZE: u64 = 2_147_483_648;

/// 変換処理の設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct ConversionConfig {
    /// 出力フィールドと入力列の対応
    pub columns: ColumnMapping,

    /// `profileId`の接頭辞
    pub profile_id_prefix: String,

    /// 親リスト
    pub parent_list: ParentList,

    /// 別名列の命名規則
    pub alias_rule: AliasColumnRule,

    /// シート選択方式
    pub sheet_selector: SheetSelector,

    /// 1チャンクあたりの行数
    pub chunk_size: usize,

    /// チャンクを並列に処理するか
    pub parallel: bool,

    /// 出力フォーマット
    pub output_format: OutputFormat,

    /// 入力ファイルの最大サイズ（バイト）
    pub max_input_size: u64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            columns: ColumnMapping::default(),
            profile_id_prefix: DEFAULT_PROFILE_ID_PREFIX.to_string(),
            parent_list: ParentList::default(),
            alias_rule: AliasColumnRule::default(),
            sheet_selector: SheetSelector::First,
            chunk_size: DEFAULT_CHUNK_SIZE,
            parallel: false,
            output_format: OutputFormat::Jsonl,
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// `Converter`インスタンスを段階的に構築するためのビルダーです。
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust
/// use trae_feed::{ConverterBuilder, SheetSelector};
///
/// # fn main() -> Result<(), trae_feed::TraeFeedError> {
/// let converter = ConverterBuilder::new()
///     .with_sheet_selector(SheetSelector::Name("Clients".to_string()))
///     .with_profile_id_prefix("ACME-")
///     .parallel(true)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConverterBuilder {
    /// 内部設定（構築中）
    config: ConversionConfig,
}

impl Default for ConverterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - 列対応: [`ColumnMapping::default`]
    /// - `profileId`接頭辞: `TRAE-`
    /// - 親リスト: `TRAE-Import-File` / `TRAE Import File`
    /// - 別名列: `Also Known As` で始まり `]` で終わるヘッダー
    /// - シート選択: 先頭のシート
    /// - チャンクサイズ: 1000行、逐次処理
    /// - 出力フォーマット: JSON Lines
    /// - 入力サイズ上限: 2GB
    pub fn new() -> Self {
        Self {
            config: ConversionConfig::default(),
        }
    }

    /// 出力フィールドと入力列の対応を指定する
    pub fn with_columns(mut self, columns: ColumnMapping) -> Self {
        self.config.columns = columns;
        self
    }

    /// `profileId`の接頭辞を指定する
    ///
    /// 空文字列を指定すると、入力IDがそのまま`profileId`になります。
    pub fn with_profile_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.profile_id_prefix = prefix.into();
        self
    }

    /// 全レコードが所属する親リストを指定する
    ///
    /// # 引数
    ///
    /// * `id` - 親リストID（空白のみは不可）
    /// * `name` - 親リスト名（空白のみは不可）
    pub fn with_parent_list(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.config.parent_list = ParentList {
            id: id.into(),
            name: name.into(),
        };
        self
    }

    /// 別名列を識別するヘッダーの命名規則を指定する
    ///
    /// ```rust
    /// use trae_feed::ConverterBuilder;
    ///
    /// // "AKA (1)", "AKA (2)", ... を別名列として扱う
    /// let builder = ConverterBuilder::new().with_alias_rule("AKA (", ")");
    /// ```
    pub fn with_alias_rule(mut self, prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.config.alias_rule = AliasColumnRule {
            prefix: prefix.into(),
            suffix: suffix.into(),
        };
        self
    }

    /// 変換対象のシートを選択する
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use trae_feed::{ConverterBuilder, SheetSelector};
    ///
    /// // 単一シートをインデックスで指定
    /// let builder = ConverterBuilder::new()
    ///     .with_sheet_selector(SheetSelector::Index(1));
    ///
    /// // 単一シートを名前で指定
    /// let builder = ConverterBuilder::new()
    ///     .with_sheet_selector(SheetSelector::Name("Sheet1".to_string()));
    /// ```
    pub fn with_sheet_selector(mut self, selector: SheetSelector) -> Self {
        self.config.sheet_selector = selector;
        self
    }

    /// 1チャンクあたりの行数を指定する
    ///
    /// チャンクサイズは出力内容に影響しません。
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.chunk_size = chunk_size;
        self
    }

    /// チャンクを並列に処理するかを指定する
    ///
    /// * `true`: rayonのスレッドプールで処理（出力順は入力順のまま）
    /// * `false`: 逐次処理（デフォルト）
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// 出力フォーマットを指定する
    ///
    /// ```rust
    /// use trae_feed::{ConverterBuilder, OutputFormat};
    ///
    /// let builder = ConverterBuilder::new()
    ///     .with_output_format(OutputFormat::Json);
    /// ```
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    /// 入力ファイルの最大サイズ（バイト）を指定する
    pub fn with_max_input_size(mut self, bytes: u64) -> Self {
        self.config.max_input_size = bytes;
        self
    }

    /// 設定を検証し、`Converter`インスタンスを生成する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Converter)`: 設定が有効な場合、Converterインスタンス
    /// * `Err(TraeFeedError::Config)`: 設定が無効な場合
    ///
    /// # 発生し得るエラー
    ///
    /// * `TraeFeedError::Config(String)`: 設定の検証に失敗した場合
    ///   * 親リストのIDまたは名前が空
    ///   * 別名列の接頭辞が空
    ///   * チャンクサイズが0
    ///   * 入力サイズ上限が0
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use trae_feed::{ConverterBuilder, TraeFeedError};
    ///
    /// let result = ConverterBuilder::new().with_parent_list("", "Batch").build();
    /// assert!(matches!(result, Err(TraeFeedError::Config(_))));
    /// ```
    pub fn build(self) -> Result<Converter, TraeFeedError> {
        let config = self.config;

        // 1. 親リストの検証
        if config.parent_list.id.trim().is_empty() {
            return Err(TraeFeedError::Config(
                "Parent list id must not be empty".to_string(),
            ));
        }
        if config.parent_list.name.trim().is_empty() {
            return Err(TraeFeedError::Config(
                "Parent list name must not be empty".to_string(),
            ));
        }

        // 2. 別名列規則の検証
        if config.alias_rule.prefix.trim().is_empty() {
            return Err(TraeFeedError::Config(
                "Alias column prefix must not be empty".to_string(),
            ));
        }

        // 3. 処理単位の検証
        if config.chunk_size == 0 {
            return Err(TraeFeedError::Config(
                "Chunk size must be greater than 0".to_string(),
            ));
        }
        if config.max_input_size == 0 {
            return Err(TraeFeedError::Config(
                "Maximum input size must be greater than 0".to_string(),
            ));
        }

        let disabled = config.columns.empty_fields();
        if !disabled.is_empty() {
            tracing::debug!(fields = ?disabled, "fields without candidate headers are never populated");
        }

        // 4. Converterインスタンス生成
        Ok(Converter::new(config))
    }
}

/// 変換処理のファサード
///
/// 入力行（またはワークブック）を正規化済みレコードのフィードに変換するための
/// メインエントリーポイントです。
/// `ConverterBuilder`を使用して構築された設定に基づいて変換処理を実行します。
///
/// # 使用例
///
/// ```rust
/// use trae_feed::{ConverterBuilder, RawRow};
///
/// # fn main() -> Result<(), trae_feed::TraeFeedError> {
/// let converter = ConverterBuilder::new().build()?;
/// let rows = vec![
///     RawRow::new().with("id", "1").with("type", "person").with("name", "Jane Doe"),
///     RawRow::new().with("id", "2").with("type", "entity").with("name", "Acme"),
/// ];
/// let jsonl = converter.convert_rows_to_jsonl(&rows)?;
/// assert_eq!(jsonl.lines().count(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Converter {
    /// 変換設定
    config: ConversionConfig,

    /// レコード変換器
    transformer: RecordTransformer,
}

impl Converter {
    pub(crate) fn new(config: ConversionConfig) -> Self {
        Self {
            transformer: RecordTransformer::new(
                config.columns.clone(),
                config.profile_id_prefix.clone(),
                config.parent_list.clone(),
            ),
            config,
        }
    }

    /// 入力行1件を変換する
    ///
    /// # 引数
    ///
    /// * `row` - 入力行
    /// * `alias_columns` - 別名列のヘッダー
    pub fn transform(&self, row: &RawRow, alias_columns: &[String]) -> NormalizedRecord {
        self.transformer.transform(row, alias_columns)
    }

    /// バッチ先頭行のヘッダーから別名列を検出する
    pub fn alias_columns(&self, rows: &[RawRow]) -> Vec<String> {
        rows.first()
            .map(|row| detect_alias_columns(row.headers(), &self.config.alias_rule))
            .unwrap_or_default()
    }

    /// 入力行のバッチを変換する
    ///
    /// 別名列は先頭行のヘッダーから検出します。
    /// 出力順は入力順と一致し、チャンクサイズや並列処理の有無によって結果は変わりません。
    pub fn convert_rows(&self, rows: &[RawRow]) -> Vec<NormalizedRecord> {
        let alias_columns = self.alias_columns(rows);
        let chunk_size = self.config.chunk_size;

        tracing::info!(
            rows = rows.len(),
            alias_columns = alias_columns.len(),
            parallel = self.config.parallel,
            "converting rows"
        );

        let convert_chunk = |chunk: &[RawRow]| -> Vec<NormalizedRecord> {
            chunk
                .iter()
                .map(|row| self.transformer.transform(row, &alias_columns))
                .collect()
        };

        if self.config.parallel {
            rows.par_chunks(chunk_size)
                .map(convert_chunk)
                .flatten_iter()
                .collect()
        } else {
            rows.chunks(chunk_size)
                .enumerate()
                .flat_map(|(idx, chunk)| {
                    tracing::trace!(chunk = idx, rows = chunk.len(), "converted chunk");
                    convert_chunk(chunk)
                })
                .collect()
        }
    }

    /// 入力行のバッチをJSON Lines形式の文字列に変換する
    pub fn convert_rows_to_jsonl(&self, rows: &[RawRow]) -> Result<String, TraeFeedError> {
        to_jsonl(&self.convert_rows(rows))
    }

    /// ワークブックを変換し、出力先に書き込む
    ///
    /// # 引数
    ///
    /// * `input` - ワークブックを読み込むためのリーダー（Read + Seekトレイトを実装）
    /// * `output` - 出力先のライター（Writeトレイトを実装）
    ///
    /// # 戻り値
    ///
    /// * `Ok(())` - 変換に成功した場合
    /// * `Err(TraeFeedError)` - エラーが発生した場合
    ///
    /// # 処理フロー
    ///
    /// 1. 入力データをメモリに読み込み、サイズ上限を確認
    /// 2. シート選択と行の抽出
    /// 3. レコードへの変換
    /// 4. 出力フォーマットに応じて書き込み
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use trae_feed::ConverterBuilder;
    /// use std::fs::File;
    ///
    /// # fn main() -> Result<(), trae_feed::TraeFeedError> {
    /// let converter = ConverterBuilder::new().build()?;
    /// let input = File::open("clients.xlsx")?;
    /// let output = File::create("clients.jsonl")?;
    /// converter.convert(input, output)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn convert<R: Read + Seek, W: Write>(
        &self,
        mut input: R,
        mut output: W,
    ) -> Result<(), TraeFeedError> {
        // 1. 入力データをメモリに読み込む
        let mut buffer = Vec::new();
        let bytes_read = input.read_to_end(&mut buffer)?;

        if bytes_read as u64 > self.config.max_input_size {
            return Err(TraeFeedError::SecurityViolation(format!(
                "Input file size exceeds maximum: {} bytes (max: {} bytes)",
                bytes_read, self.config.max_input_size
            )));
        }

        // 2. シート選択と行の抽出
        let rows = read_sheet_rows(buffer, &self.config.sheet_selector)?;

        // 3. 変換
        let records = self.convert_rows(&rows);

        // 4. 出力
        let formatter = OutputFormatter::from_format(self.config.output_format);
        let mut writer = BufWriter::new(&mut output);
        formatter.render(&records, &mut writer)?;
        writer.flush()?;

        Ok(())
    }

    /// ワークブックを変換し、文字列として返す
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use std::fs::File;
    /// use trae_feed::ConverterBuilder;
    ///
    /// # fn main() -> Result<(), trae_feed::TraeFeedError> {
    /// let converter = ConverterBuilder::new().build()?;
    /// let input = File::open("clients.xlsx")?;
    /// let jsonl = converter.convert_to_string(input)?;
    /// println!("{}", jsonl);
    /// # Ok(())
    /// # }
    /// ```
    pub fn convert_to_string<R: Read + Seek>(&self, input: R) -> Result<String, TraeFeedError> {
        let mut buffer = Vec::new();
        self.convert(input, &mut buffer)?;

        let result = String::from_utf8(buffer).map_err(|e| {
            TraeFeedError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rows(count: usize) -> Vec<RawRow> {
        (0..count)
            .map(|i| {
                RawRow::new()
                    .with("id", i as f64)
                    .with("type", if i % 2 == 0 { "person" } else { "entity" })
                    .with("name", format!("Client {}", i))
                    .with("country", ["Russia", "Germany", "UAE", "Holland"][i % 4])
                    .with("Also Known As[1]", if i % 3 == 0 { "" } else { "Alias" })
                    .with("list_reference_details", "Sanctions List|PEP")
            })
            .collect()
    }

    #[test]
    fn test_converter_builder_new() {
        let builder = ConverterBuilder::new();
        assert_eq!(builder.config.sheet_selector, SheetSelector::First);
        assert_eq!(builder.config.profile_id_prefix, "TRAE-");
        assert_eq!(builder.config.parent_list, ParentList::default());
        assert_eq!(builder.config.alias_rule, AliasColumnRule::default());
        assert_eq!(builder.config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert!(!builder.config.parallel);
        assert_eq!(builder.config.output_format, OutputFormat::Jsonl);
        assert_eq!(builder.config.max_input_size, DEFAULT_MAX_INPUT_SIZE);
    }

    #[test]
    fn test_builder_method_chaining() {
        let builder = ConverterBuilder::new()
            .with_sheet_selector(SheetSelector::Index(2))
            .with_profile_id_prefix("ACME-")
            .with_parent_list("BATCH-7", "Batch 7")
            .with_alias_rule("AKA ", "")
            .with_chunk_size(10)
            .parallel(true)
            .with_output_format(OutputFormat::Json)
            .with_max_input_size(1024);

        assert!(matches!(
            builder.config.sheet_selector,
            SheetSelector::Index(2)
        ));
        assert_eq!(builder.config.profile_id_prefix, "ACME-");
        assert_eq!(builder.config.parent_list.id, "BATCH-7");
        assert_eq!(builder.config.alias_rule.prefix, "AKA ");
        assert_eq!(builder.config.chunk_size, 10);
        assert!(builder.config.parallel);
        assert_eq!(builder.config.output_format, OutputFormat::Json);
        assert_eq!(builder.config.max_input_size, 1024);
        assert!(builder.build().is_ok());
    }

    #[test]
    fn test_build_rejects_invalid_settings() {
        let cases = [
            (ConverterBuilder::new().with_parent_list(" ", "Batch"), "Parent list id"),
            (ConverterBuilder::new().with_parent_list("B-1", ""), "Parent list name"),
            (ConverterBuilder::new().with_alias_rule("", "]"), "Alias column prefix"),
            (ConverterBuilder::new().with_chunk_size(0), "Chunk size"),
            (ConverterBuilder::new().with_max_input_size(0), "Maximum input size"),
        ];

        for (builder, expected) in cases {
            match builder.build() {
                Err(TraeFeedError::Config(msg)) => {
                    assert!(msg.contains(expected), "message: {}", msg)
                }
                other => panic!("Expected Config error for {}, got {:?}", expected, other.map(|_| ())),
            }
        }
    }

    #[test]
    fn test_build_allows_disabled_fields() {
        let columns = ColumnMapping {
            gender: Vec::new(),
            ..ColumnMapping::default()
        };
        let converter = ConverterBuilder::new().with_columns(columns).build().unwrap();
        let record = converter.transform(&RawRow::new().with("gender", "female"), &[]);
        assert!(record.gender.is_none());
    }

    #[test]
    fn test_alias_columns_from_first_row() {
        let converter = ConverterBuilder::new().build().unwrap();
        let rows = vec![
            RawRow::new().with("name", "A").with("Also Known As[1]", "X"),
            RawRow::new()
                .with("name", "B")
                .with("Also Known As[1]", "Y")
                .with("Also Known As[2]", "Z"),
        ];

        assert_eq!(converter.alias_columns(&rows), vec!["Also Known As[1]".to_string()]);

        let records = converter.convert_rows(&rows);
        assert_eq!(records[1].aliases.len(), 1);
        assert_eq!(records[1].aliases[0].name, "Y");
        assert!(converter.alias_columns(&[]).is_empty());
    }

    #[test]
    fn test_chunking_does_not_change_output() {
        let rows = sample_rows(53);
        let expected = ConverterBuilder::new()
            .build()
            .unwrap()
            .convert_rows_to_jsonl(&rows)
            .unwrap();

        for (chunk_size, parallel) in [(1, false), (7, false), (1, true), (7, true), (100, true)] {
            let converter = ConverterBuilder::new()
                .with_chunk_size(chunk_size)
                .parallel(parallel)
                .build()
                .unwrap();
            assert_eq!(
                converter.convert_rows_to_jsonl(&rows).unwrap(),
                expected,
                "chunk_size={}, parallel={}",
                chunk_size,
                parallel
            );
        }
    }

    #[test]
    fn test_convert_rows_preserves_order() {
        let converter = ConverterBuilder::new()
            .with_chunk_size(4)
            .parallel(true)
            .build()
            .unwrap();
        let records = converter.convert_rows(&sample_rows(30));
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.profile_id, Some(format!("TRAE-{}", i)));
        }
    }

    #[test]
    fn test_custom_prefix_and_parent_list() {
        let converter = ConverterBuilder::new()
            .with_profile_id_prefix("ACME-")
            .with_parent_list("BATCH-7", "Batch 7")
            .build()
            .unwrap();
        let record = converter.transform(
            &RawRow::new().with("id", "9").with("list_reference_details", "PEP"),
            &[],
        );

        assert_eq!(record.profile_id.as_deref(), Some("ACME-9"));
        assert_eq!(record.lists[0].id, "BATCH-7");
        assert_eq!(record.lists[1].hierarchy[0].name, "Batch 7");
    }

    #[test]
    fn test_convert_rejects_oversized_input() {
        let converter = ConverterBuilder::new().with_max_input_size(4).build().unwrap();
        let result = converter.convert_to_string(std::io::Cursor::new(vec![0u8; 16]));
        assert!(matches!(result, Err(TraeFeedError::SecurityViolation(_))));
    }

    #[test]
    fn test_converter_convert_to_string_with_invalid_input() {
        let converter = ConverterBuilder::new().build().unwrap();
        // 無効な入力データ（空のVec）
        let invalid_input: Vec<u8> = vec![];
        let result = converter.convert_to_string(std::io::Cursor::new(invalid_input));
        assert!(result.is_err());
    }
}
