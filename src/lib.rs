//! trae-feed - Spreadsheet client records to normalized JSONL feed converter
//!
//! This crate turns tabular client/entity records (rows exported from spreadsheet
//! uploads) into a normalized, line-delimited JSON feed with a fixed downstream
//! schema: profile ids, record types, ISO 3166-1 alpha-2 country codes, ISO dates,
//! list memberships and aliases.
//!
//! # Quick Start
//!
//! ```rust
//! use trae_feed::{ConverterBuilder, RawRow};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create a converter with default settings
//!     let converter = ConverterBuilder::new().build()?;
//!
//!     let rows = vec![RawRow::new()
//!         .with("id", 1001.0)
//!         .with("type", "Person")
//!         .with("name", "Jane Doe")
//!         .with("dob", "1985-03-02T00:00:00Z")
//!         .with("country", "Russian Federation")
//!         .with("list_reference_details", "Sanctions List|OFAC [US]")];
//!
//!     let jsonl = converter.convert_rows_to_jsonl(&rows)?;
//!     assert!(jsonl.starts_with(r#"{"profileId":"TRAE-1001","type":"person""#));
//!     Ok(())
//! }
//! ```
//!
//! # Converting a Workbook
//!
//! ```rust,no_run
//! use std::fs::File;
//! use trae_feed::{jsonl_file_name, ConverterBuilder, SheetSelector};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = ConverterBuilder::new()
//!         .with_sheet_selector(SheetSelector::Name("Clients".to_string()))
//!         .parallel(true)
//!         .build()?;
//!
//!     let input = File::open("clients.xlsx")?;
//!     let output = File::create(jsonl_file_name(1_700_000_000_000))?;
//!     converter.convert(input, output)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Rows from JSON
//!
//! Browser-side sheet readers usually hand over an array of `{header: value}`
//! objects. Those can be converted directly:
//!
//! ```rust
//! use trae_feed::{ConverterBuilder, RawRow};
//!
//! # fn main() -> Result<(), trae_feed::TraeFeedError> {
//! let rows = RawRow::parse_json_rows(
//!     r#"[{"\"id\"": 7, "type": "entity", "country": "UAE", "Also Known As[1]": "Acme FZE"}]"#,
//! )?;
//! let converter = ConverterBuilder::new().build()?;
//! let records = converter.convert_rows(&rows);
//! assert_eq!(records[0].country_of_registration_code, Some(vec!["AE".to_string()]));
//! assert_eq!(records[0].aliases[0].name, "Acme FZE");
//! # Ok(())
//! # }
//! ```
//!
//! # Single Components
//!
//! ```rust
//! use trae_feed::{normalize_date, resolve_country, CellValue};
//!
//! assert_eq!(resolve_country("South Korea"), Some("KR".to_string()));
//! assert_eq!(
//!     normalize_date(&CellValue::from("March 2, 1985")),
//!     Some("1985-03-02".to_string())
//! );
//! ```

mod api;
mod builder;
mod country;
mod date;
mod error;
mod output;
mod record;
mod sheet;
mod transform;
mod types;

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub mod wasm;

// 公開API
pub use api::{
    AliasColumnRule, ColumnMapping, OutputFormat, ParentList, SheetSelector,
    DEFAULT_ALIAS_PREFIX, DEFAULT_ALIAS_SUFFIX, DEFAULT_PARENT_LIST_ID,
    DEFAULT_PARENT_LIST_NAME, DEFAULT_PROFILE_ID_PREFIX,
};
pub use builder::{Converter, ConverterBuilder, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_INPUT_SIZE};
pub use country::{resolve_country, CountryResolver};
pub use date::{normalize_date, parse_date};
pub use error::TraeFeedError;
pub use output::{jsonl_file_name, to_jsonl, write_jsonl};
pub use record::{
    Address, Alias, HierarchyNode, ListEntry, NormalizedRecord, RecordType, ACTIVE_STATUS,
};
pub use sheet::{cell_value, read_sheet_rows, rows_from_range};
pub use transform::{detect_alias_columns, list_id_from_token, transform_row, RecordTransformer};
pub use types::{normalize_header, CellValue, RawRow};
