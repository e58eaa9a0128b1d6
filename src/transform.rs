//! Transform Module
//!
//! 入力行1件を正規化済みレコード1件に変換するモジュール。
//!
//! 変換は全域関数で、欠損値・解析できない日付・未知の国名・ヘッダーの表記ゆれは
//! いずれもエラーにならず、該当フィールドの省略として扱われます。

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::api::{AliasColumnRule, ColumnMapping, ParentList, DEFAULT_PROFILE_ID_PREFIX};
use crate::country::CountryResolver;
use crate::date::normalize_date;
use crate::record::{Address, Alias, HierarchyNode, ListEntry, NormalizedRecord, RecordType};
use crate::types::{normalize_header, CellValue, RawRow};

/// リスト参照列の区切り文字
const LIST_SEPARATOR: char = '|';

/// リスト参照列で「値なし」を表す文字列（大文字小文字を区別しない）
const MISSING_MARKER: &str = "nan";

/// 正規化済みヘッダーで参照する行ビュー
///
/// 同じヘッダーが複数ある場合は後の列が優先されます。
struct CleanRow<'a> {
    cells: HashMap<&'a str, &'a CellValue>,
}

impl<'a> CleanRow<'a> {
    fn new(row: &'a RawRow) -> Self {
        let cells = row
            .cells()
            .map(|(header, value)| (normalize_header(header), value))
            .collect();
        Self { cells }
    }

    fn get(&self, header: &str) -> Option<&'a CellValue> {
        self.cells
            .get(normalize_header(header))
            .copied()
            .filter(|value| !value.is_empty())
    }

    /// 候補ヘッダーのうち値が空でない最初のセルを返す
    fn first(&self, candidates: &[String]) -> Option<&'a CellValue> {
        candidates.iter().find_map(|header| self.get(header))
    }

    fn text(&self, candidates: &[String]) -> Option<String> {
        self.first(candidates).and_then(CellValue::as_text)
    }
}

/// 入力行を正規化済みレコードに変換するトランスフォーマー
///
/// # 使用例
///
/// ```rust
/// use trae_feed::{RawRow, RecordTransformer};
///
/// let transformer = RecordTransformer::default();
/// let row = RawRow::new()
///     .with("id", 42.0)
///     .with("type", "Entity")
///     .with("name", "Acme Holdings")
///     .with("country", "Russia");
///
/// let record = transformer.transform(&row, &[]);
/// assert_eq!(record.profile_id.as_deref(), Some("TRAE-42"));
/// assert!(record.is_company());
/// assert_eq!(record.country_of_registration_code, Some(vec!["RU".to_string()]));
/// assert!(record.citizenship_code.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct RecordTransformer {
    columns: ColumnMapping,
    profile_id_prefix: String,
    parent_list: ParentList,
    resolver: CountryResolver,
}

impl Default for RecordTransformer {
    fn default() -> Self {
        Self::new(
            ColumnMapping::default(),
            DEFAULT_PROFILE_ID_PREFIX.to_string(),
            ParentList::default(),
        )
    }
}

impl RecordTransformer {
    /// トランスフォーマーを生成
    ///
    /// # 引数
    ///
    /// * `columns` - 出力フィールドと入力列の対応
    /// * `profile_id_prefix` - `profileId`の接頭辞
    /// * `parent_list` - 全レコードが所属する親リスト
    pub fn new(columns: ColumnMapping, profile_id_prefix: String, parent_list: ParentList) -> Self {
        Self {
            columns,
            profile_id_prefix,
            parent_list,
            resolver: CountryResolver::new(),
        }
    }

    /// 国名解決に使うリゾルバーを差し替える
    pub fn with_resolver(mut self, resolver: CountryResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// 入力行1件を変換する
    ///
    /// # 引数
    ///
    /// * `row` - 入力行
    /// * `alias_columns` - 別名列のヘッダー（[`detect_alias_columns`]で検出したもの）
    pub fn transform(&self, row: &RawRow, alias_columns: &[String]) -> NormalizedRecord {
        let clean = CleanRow::new(row);
        let columns = &self.columns;

        let mut record = NormalizedRecord::new(self.parent_entry());

        record.profile_id = self.profile_id(&clean);
        record.record_type = clean
            .text(&columns.record_type)
            .and_then(|value| RecordType::classify(&value));

        record.name = clean.text(&columns.name);
        record.action = clean.text(&columns.action);
        record.gender = clean.text(&columns.gender);
        record.deceased = clean.text(&columns.deceased);
        record.profile_notes = clean.text(&columns.profile_notes);

        record.date_of_birth_array = clean
            .first(&columns.date_of_birth)
            .and_then(normalize_date)
            .into_iter()
            .collect();

        self.apply_country(&clean, &mut record);

        if let Some(reference) = clean
            .text(&columns.list_reference_details)
            .filter(|value| !value.trim().eq_ignore_ascii_case(MISSING_MARKER))
        {
            let children = reference
                .split(LIST_SEPARATOR)
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(|token| self.child_entry(token));
            record.lists.extend(children);
        }

        record.aliases = alias_columns
            .iter()
            .filter_map(|column| clean.get(column))
            .filter_map(CellValue::as_trimmed_text)
            .map(|name| Alias { name })
            .collect();

        record.apply_type_rules();
        record
    }

    fn profile_id(&self, clean: &CleanRow<'_>) -> Option<String> {
        clean
            .first(&self.columns.id)
            .and_then(CellValue::as_trimmed_text)
            .map(|id| format!("{}{}", self.profile_id_prefix, id))
    }

    /// 国コード列（なければ国名列）から住所と国コード配列を設定する
    ///
    /// 国が解決できない場合も3つの国コード配列は空配列として残ります。
    fn apply_country(&self, clean: &CleanRow<'_>, record: &mut NormalizedRecord) {
        let columns = &self.columns;
        let code = clean
            .first(&columns.country_code)
            .or_else(|| clean.first(&columns.country_name))
            .and_then(|value| self.resolver.resolve_value(value));

        let codes = match code {
            Some(code) => {
                record.addresses.push(Address {
                    country_code: code.clone(),
                    line: clean.text(&columns.address_line),
                    city: clean.text(&columns.city),
                    province: clean.text(&columns.province),
                });
                vec![code]
            }
            None => Vec::new(),
        };

        record.citizenship_code = Some(codes.clone());
        record.resident_of_code = Some(codes.clone());
        record.country_of_registration_code = Some(codes);
    }

    fn parent_entry(&self) -> ListEntry {
        ListEntry {
            id: self.parent_list.id.clone(),
            name: self.parent_list.name.clone(),
            active: true,
            list_active: true,
            hierarchy: vec![self.parent_node()],
            parent: None,
        }
    }

    fn parent_node(&self) -> HierarchyNode {
        HierarchyNode {
            id: self.parent_list.id.clone(),
            name: self.parent_list.name.clone(),
            parent: None,
        }
    }

    fn child_entry(&self, token: &str) -> ListEntry {
        let id = list_id_from_token(token);
        ListEntry {
            id: id.clone(),
            name: token.to_string(),
            active: true,
            list_active: true,
            hierarchy: vec![
                self.parent_node(),
                HierarchyNode {
                    id,
                    name: token.to_string(),
                    parent: Some(self.parent_list.id.clone()),
                },
            ],
            parent: Some(self.parent_list.id.clone()),
        }
    }
}

/// リスト参照トークンからリストIDを生成する
///
/// 大文字化した上で、空白・`[`・`]`・`/`・`\`・`:`の連続を1つの`-`に置換します。
///
/// ```rust
/// use trae_feed::list_id_from_token;
///
/// assert_eq!(list_id_from_token("Sanctions List"), "SANCTIONS-LIST");
/// assert_eq!(list_id_from_token("OFAC [US]"), "OFAC-US-");
/// ```
pub fn list_id_from_token(token: &str) -> String {
    let mut id = String::with_capacity(token.len());
    let mut in_separator = false;

    for c in token.chars() {
        if is_list_id_separator(c) {
            if !in_separator {
                id.push('-');
                in_separator = true;
            }
        } else {
            id.extend(c.to_uppercase());
            in_separator = false;
        }
    }

    id
}

fn is_list_id_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '[' | ']' | '/' | '\\' | ':')
}

/// 別名列をヘッダーから検出する
///
/// 正規化済みヘッダーが規則に一致する列を入力順に返します。重複は除外されます。
///
/// # 引数
///
/// * `headers` - 列ヘッダー（通常はバッチ先頭行のヘッダー）
/// * `rule` - 別名列の命名規則
pub fn detect_alias_columns<'a, I>(headers: I, rule: &AliasColumnRule) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut columns: Vec<String> = Vec::new();
    for header in headers {
        let header = normalize_header(header);
        if rule.matches(header) && !columns.iter().any(|c| c == header) {
            columns.push(header.to_string());
        }
    }
    columns
}

/// 既定の設定で入力行1件を変換する
pub fn transform_row(row: &RawRow, alias_columns: &[String]) -> NormalizedRecord {
    static DEFAULT: OnceLock<RecordTransformer> = OnceLock::new();
    DEFAULT
        .get_or_init(RecordTransformer::default)
        .transform(row, alias_columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn aliases(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_person_record() {
        let row = RawRow::new()
            .with("id", 123.0)
            .with("type", "person")
            .with("name", "Jane Doe")
            .with("gender", "female")
            .with("dob", "1985-03-02T00:00:00Z")
            .with("country", "France")
            .with("city", "Paris")
            .with("address", "1 Rue de Rivoli");

        let record = transform_row(&row, &[]);
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(
            value,
            json!({
                "profileId": "TRAE-123",
                "type": "person",
                "name": "Jane Doe",
                "gender": "female",
                "dateOfBirthArray": ["1985-03-02"],
                "addresses": [{"countryCode": "FR", "line": "1 Rue de Rivoli", "city": "Paris"}],
                "citizenshipCode": ["FR"],
                "residentOfCode": ["FR"],
                "lists": [{
                    "id": "TRAE-Import-File",
                    "name": "TRAE Import File",
                    "active": true,
                    "listActive": true,
                    "hierarchy": [{"id": "TRAE-Import-File", "name": "TRAE Import File"}]
                }],
                "activeStatus": "Active"
            })
        );
    }

    #[test]
    fn test_company_record() {
        let row = RawRow::new()
            .with("id", " C-9 ")
            .with("type", "  Entity ")
            .with("name", "Acme Holdings")
            .with("dob", "1985-03-02")
            .with("countryCode", "ru");

        let record = transform_row(&row, &[]);
        assert_eq!(record.profile_id.as_deref(), Some("TRAE-C-9"));
        assert_eq!(record.record_type, Some(RecordType::Company));
        assert!(record.date_of_birth_array.is_empty());
        assert!(record.citizenship_code.is_none());
        assert!(record.resident_of_code.is_none());
        assert_eq!(record.country_of_registration_code, Some(vec!["RU".to_string()]));
        assert_eq!(record.addresses[0].country_code, "RU");
    }

    #[test]
    fn test_unknown_type_passes_through() {
        let row = RawRow::new().with("type", "Vessel").with("country", "Panama");
        let record = transform_row(&row, &[]);

        assert_eq!(record.record_type, Some(RecordType::Other("vessel".to_string())));
        assert_eq!(record.citizenship_code, Some(vec!["PA".to_string()]));
        assert_eq!(record.country_of_registration_code, Some(vec!["PA".to_string()]));
    }

    #[test]
    fn test_missing_type() {
        let row = RawRow::new().with("type", "   ").with("name", "No Type");
        let record = transform_row(&row, &[]);
        assert!(record.record_type.is_none());
        let line = record.to_json_line().unwrap();
        assert!(!line.contains("\"type\""));
    }

    #[test]
    fn test_country_code_column_preferred() {
        let row = RawRow::new()
            .with("country", "Germany")
            .with("countryCode", "AT");
        let record = transform_row(&row, &[]);
        assert_eq!(record.addresses[0].country_code, "AT");
    }

    #[test]
    fn test_incorporation_country_column() {
        let row = RawRow::new()
            .with("clientId", "C1")
            .with("name", "Acme")
            .with("incorporationCountryCode", "Germany");
        let record = transform_row(&row, &[]);

        assert_eq!(record.profile_id.as_deref(), Some("TRAE-C1"));
        assert_eq!(record.country_of_registration_code, Some(vec!["DE".to_string()]));
        assert_eq!(record.addresses[0].country_code, "DE");

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["countryOfRegistrationCode"], json!(["DE"]));
    }

    #[test]
    fn test_missing_country_keeps_empty_code_arrays() {
        let row = RawRow::new()
            .with("type", "person")
            .with("country", "   ")
            .with("city", "Nowhere");
        let record = transform_row(&row, &[]);

        assert!(record.addresses.is_empty());
        assert_eq!(record.citizenship_code, Some(Vec::new()));
        assert_eq!(record.resident_of_code, Some(Vec::new()));
        assert!(record.country_of_registration_code.is_none());

        let line = record.to_json_line().unwrap();
        assert!(line.contains("\"citizenshipCode\":[]"));
        assert!(!line.contains("addresses"));
    }

    #[test]
    fn test_list_reference_details() {
        let row = RawRow::new().with("list_reference_details", "Sanctions List|OFAC [US]| |");
        let record = transform_row(&row, &[]);

        assert_eq!(record.lists.len(), 3);
        assert_eq!(record.lists[1].id, "SANCTIONS-LIST");
        assert_eq!(record.lists[1].name, "Sanctions List");
        assert_eq!(record.lists[2].id, "OFAC-US-");
        assert_eq!(record.lists[2].name, "OFAC [US]");

        let child = &record.lists[2];
        assert_eq!(child.parent.as_deref(), Some("TRAE-Import-File"));
        assert_eq!(child.hierarchy.len(), 2);
        assert_eq!(child.hierarchy[0].id, "TRAE-Import-File");
        assert!(child.hierarchy[0].parent.is_none());
        assert_eq!(child.hierarchy[1].id, "OFAC-US-");
        assert_eq!(child.hierarchy[1].parent.as_deref(), Some("TRAE-Import-File"));
    }

    #[test]
    fn test_nan_list_reference_is_ignored() {
        for marker in ["nan", "NaN", " NAN "] {
            let row = RawRow::new().with("list_reference_details", marker);
            assert_eq!(transform_row(&row, &[]).lists.len(), 1, "marker: {:?}", marker);
        }
        let row = RawRow::new().with("list_reference_details", f64::NAN);
        assert_eq!(transform_row(&row, &[]).lists.len(), 1);
    }

    #[test]
    fn test_list_id_from_token() {
        assert_eq!(list_id_from_token("Sanctions List"), "SANCTIONS-LIST");
        assert_eq!(list_id_from_token("OFAC [US]"), "OFAC-US-");
        assert_eq!(list_id_from_token("EU / UK: Consolidated"), "EU-UK-CONSOLIDATED");
        assert_eq!(list_id_from_token("a\\b"), "A-B");
        assert_eq!(list_id_from_token("pep"), "PEP");
    }

    #[test]
    fn test_aliases() {
        let row = RawRow::new()
            .with("name", "Acme")
            .with("Also Known As[1]", "  Acme Ltd ")
            .with("Also Known As[2]", "")
            .with("\"Also Known As[3]\"", "ACME Corp");

        let alias_columns = detect_alias_columns(row.headers(), &AliasColumnRule::default());
        assert_eq!(
            alias_columns,
            aliases(&["Also Known As[1]", "Also Known As[2]", "Also Known As[3]"])
        );

        let record = transform_row(&row, &alias_columns);
        let names: Vec<&str> = record.aliases.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Acme Ltd", "ACME Corp"]);
    }

    #[test]
    fn test_no_alias_values_omits_field() {
        let row = RawRow::new().with("Also Known As[1]", CellValue::Empty);
        let record = transform_row(&row, &aliases(&["Also Known As[1]"]));
        assert!(record.aliases.is_empty());
        assert!(!record.to_json_line().unwrap().contains("aliases"));
    }

    #[test]
    fn test_detect_alias_columns_deduplicates() {
        let headers = ["Also Known As[1]", " Also Known As[1] ", "Known As[2]", "Also Known As"];
        let detected = detect_alias_columns(headers, &AliasColumnRule::default());
        assert_eq!(detected, aliases(&["Also Known As[1]"]));
    }

    #[test]
    fn test_quoted_headers() {
        let row = RawRow::new()
            .with("\"id\"", "7")
            .with(" \"name\" ", "Quoted")
            .with("'country'", "Japan");
        let record = transform_row(&row, &[]);
        assert_eq!(record.profile_id.as_deref(), Some("TRAE-7"));
        assert_eq!(record.name.as_deref(), Some("Quoted"));
        assert_eq!(record.addresses[0].country_code, "JP");
    }

    #[test]
    fn test_later_duplicate_header_wins() {
        let row = RawRow::new().with("name", "First").with("\"name\"", "Second");
        assert_eq!(transform_row(&row, &[]).name.as_deref(), Some("Second"));
    }

    #[test]
    fn test_first_non_empty_candidate_wins() {
        let row = RawRow::new()
            .with("name", "")
            .with("fullName", "Fallback Name")
            .with("full_name", "Ignored");
        assert_eq!(transform_row(&row, &[]).name.as_deref(), Some("Fallback Name"));
    }

    #[test]
    fn test_unparseable_date_of_birth() {
        let row = RawRow::new().with("type", "person").with("dob", "not a date");
        assert!(transform_row(&row, &[]).date_of_birth_array.is_empty());
    }

    #[test]
    fn test_serial_date_of_birth() {
        let row = RawRow::new().with("dob", 31108.0);
        assert_eq!(
            transform_row(&row, &[]).date_of_birth_array,
            vec!["1985-03-02".to_string()]
        );
    }

    #[test]
    fn test_custom_configuration() {
        let columns = ColumnMapping {
            id: vec!["Customer No".to_string()],
            ..ColumnMapping::default()
        };
        let transformer = RecordTransformer::new(
            columns,
            "ACME-".to_string(),
            ParentList {
                id: "BATCH-1".to_string(),
                name: "Batch 1".to_string(),
            },
        )
        .with_resolver(CountryResolver::new().with_alias("Neverland", "NL"));

        let row = RawRow::new()
            .with("Customer No", 55.0)
            .with("id", "ignored")
            .with("country", "Neverland")
            .with("list_reference_details", "PEP");
        let record = transformer.transform(&row, &[]);

        assert_eq!(record.profile_id.as_deref(), Some("ACME-55"));
        assert_eq!(record.addresses[0].country_code, "NL");
        assert_eq!(record.lists[0].id, "BATCH-1");
        assert_eq!(record.lists[1].parent.as_deref(), Some("BATCH-1"));
        assert_eq!(record.lists[1].hierarchy[1].parent.as_deref(), Some("BATCH-1"));
    }

    #[test]
    fn test_empty_row() {
        let record = transform_row(&RawRow::new(), &[]);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["activeStatus"], json!("Active"));
        assert_eq!(value["lists"].as_array().map(Vec::len), Some(1));
        assert!(value.get("profileId").is_none());
        assert!(value.get("addresses").is_none());
    }

    // プロパティベーステスト
    #[allow(unused_doc_comments)]
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn type_value() -> impl Strategy<Value = String> {
            prop_oneof![
                Just("entity".to_string()),
                Just(" Entity ".to_string()),
                Just("Company".to_string()),
                Just("person".to_string()),
                Just("PERSON".to_string()),
                "[a-zA-Z]{0,8}",
            ]
        }

        fn country_value() -> impl Strategy<Value = String> {
            prop_oneof![
                Just(String::new()),
                Just("Russia".to_string()),
                Just("United States".to_string()),
                "[a-zA-Z ]{1,12}",
            ]
        }

        #[allow(unused_doc_comments)]
        /// 種別ごとの除外規則がどの入力でも守られることを確認
        proptest! {
            #[test]
            fn test_type_pruning(
                record_type in type_value(),
                country in country_value(),
                dob in prop_oneof![Just("1985-03-02".to_string()), "[0-9/ -]{0,10}"]
            ) {
                let row = RawRow::new()
                    .with("type", record_type)
                    .with("country", country)
                    .with("dob", dob);
                let record = transform_row(&row, &[]);

                if record.is_company() {
                    prop_assert!(record.citizenship_code.is_none());
                    prop_assert!(record.resident_of_code.is_none());
                    prop_assert!(record.date_of_birth_array.is_empty());
                    prop_assert!(record.country_of_registration_code.is_some());
                } else if record.is_person() {
                    prop_assert!(record.country_of_registration_code.is_none());
                    prop_assert!(record.citizenship_code.is_some());
                    prop_assert!(record.resident_of_code.is_some());
                } else {
                    prop_assert!(record.citizenship_code.is_some());
                    prop_assert!(record.resident_of_code.is_some());
                    prop_assert!(record.country_of_registration_code.is_some());
                }

                prop_assert_eq!(record.lists.len(), 1);
                prop_assert_eq!(record.active_status.as_str(), "Active");
            }

            #[test]
            fn test_list_children_match_tokens(
                tokens in prop::collection::vec("[A-Za-z][A-Za-z0-9 \\[\\]:/]{0,12}", 0..5)
            ) {
                let reference = tokens.join("|");
                let row = RawRow::new().with("list_reference_details", reference);
                let record = transform_row(&row, &[]);

                let expected: Vec<&str> = tokens.iter().map(|t| t.trim()).collect();
                // 列全体が"nan"の場合のみ欠損扱いになる
                if tokens.len() == 1 && tokens[0].trim().eq_ignore_ascii_case("nan") {
                    prop_assert_eq!(record.lists.len(), 1);
                } else {
                    prop_assert_eq!(record.lists.len(), 1 + expected.len());
                    for (entry, token) in record.lists[1..].iter().zip(expected.iter()) {
                        prop_assert_eq!(entry.name.as_str(), *token);
                        prop_assert_eq!(&entry.id, &list_id_from_token(token));
                        prop_assert!(!entry.id.chars().any(char::is_lowercase));
                    }
                }
            }
        }
    }
}
