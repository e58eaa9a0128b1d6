//! Public API Types
//!
//! 公開APIで使用する設定用の型を定義するモジュール。

/// 既定のプロファイルID接頭辞
pub const DEFAULT_PROFILE_ID_PREFIX: &str = "TRAE-";

/// 既定の親リストID（取り込みバッチを表す）
pub const DEFAULT_PARENT_LIST_ID: &str = "TRAE-Import-File";

/// 既定の親リスト名
pub const DEFAULT_PARENT_LIST_NAME: &str = "TRAE Import File";

/// 別名列ヘッダーの既定の接頭辞
pub const DEFAULT_ALIAS_PREFIX: &str = "Also Known As";

/// 別名列ヘッダーの既定の接尾辞
pub const DEFAULT_ALIAS_SUFFIX: &str = "]";

/// シート選択方式
///
/// ワークブックから変換対象のシートを1つ選択する方法を指定します。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum SheetSelector {
    /// 先頭のシート（デフォルト）
    #[default]
    First,

    /// インデックス指定（0始まり）
    Index(usize),

    /// シート名指定
    Name(String),
}

/// 出力フォーマット
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum OutputFormat {
    /// JSON Lines形式（デフォルト）
    ///
    /// 1行に1レコードのJSONオブジェクトを出力し、改行で連結します。
    /// 末尾に改行は付けません。
    ///
    /// ```text
    /// {"profileId":"TRAE-1","type":"person",...}
    /// {"profileId":"TRAE-2","type":"company",...}
    /// ```
    #[default]
    Jsonl,

    /// 整形済みJSON配列（確認用）
    Json,
}

/// 親リスト（取り込みバッチ）の識別子
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentList {
    pub id: String,
    pub name: String,
}

impl Default for ParentList {
    fn default() -> Self {
        Self {
            id: DEFAULT_PARENT_LIST_ID.to_string(),
            name: DEFAULT_PARENT_LIST_NAME.to_string(),
        }
    }
}

/// 別名列を識別するヘッダーの命名規則
///
/// 正規化済みヘッダーが`prefix`で始まり`suffix`で終わる列を別名列とみなします。
/// 例: `Also Known As[1]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasColumnRule {
    pub prefix: String,
    pub suffix: String,
}

impl Default for AliasColumnRule {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_ALIAS_PREFIX.to_string(),
            suffix: DEFAULT_ALIAS_SUFFIX.to_string(),
        }
    }
}

impl AliasColumnRule {
    /// 正規化済みヘッダーが規則に一致するかを判定
    pub fn matches(&self, header: &str) -> bool {
        header.len() >= self.prefix.len() + self.suffix.len()
            && header.starts_with(&self.prefix)
            && header.ends_with(&self.suffix)
    }
}

/// 出力フィールドと入力列ヘッダーの対応
///
/// 各フィールドは候補ヘッダーのリストを持ち、値が空でない最初の候補を採用します。
/// ヘッダーは正規化（前後の引用符・空白の除去）した上で比較されます。
///
/// # 使用例
///
/// ```rust
/// use trae_feed::ColumnMapping;
///
/// let columns = ColumnMapping {
///     id: vec!["Customer No".to_string()],
///     ..ColumnMapping::default()
/// };
/// assert_eq!(columns.name, vec!["name", "Name", "fullName", "full_name"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub id: Vec<String>,
    pub record_type: Vec<String>,
    pub action: Vec<String>,
    pub gender: Vec<String>,
    pub deceased: Vec<String>,
    pub name: Vec<String>,
    pub profile_notes: Vec<String>,
    pub date_of_birth: Vec<String>,
    /// 国コード列（国名列より優先）
    pub country_code: Vec<String>,
    pub country_name: Vec<String>,
    pub address_line: Vec<String>,
    pub city: Vec<String>,
    pub province: Vec<String>,
    /// パイプ区切りのリスト参照列
    pub list_reference_details: Vec<String>,
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            id: headers(&["id", "ID", "profileId", "profile_id", "clientId"]),
            record_type: headers(&["type", "recordType", "record_type", "Type"]),
            action: headers(&["action"]),
            gender: headers(&["gender"]),
            deceased: headers(&["deceased"]),
            name: headers(&["name", "Name", "fullName", "full_name"]),
            profile_notes: headers(&["profileNotes", "profile_notes", "notes"]),
            date_of_birth: headers(&["dateOfBirth", "date_of_birth", "dob", "DOB"]),
            country_code: headers(&["countryCode", "country_code", "incorporationCountryCode"]),
            country_name: headers(&["country", "Country", "country_name"]),
            address_line: headers(&["address", "addressLine", "line"]),
            city: headers(&["city"]),
            province: headers(&["province", "state"]),
            list_reference_details: headers(&["list_reference_details", "listReferenceDetails"]),
        }
    }
}

impl ColumnMapping {
    /// 候補ヘッダーがすべて空のフィールド名を返す
    pub(crate) fn empty_fields(&self) -> Vec<&'static str> {
        let fields: [(&'static str, &Vec<String>); 14] = [
            ("id", &self.id),
            ("record_type", &self.record_type),
            ("action", &self.action),
            ("gender", &self.gender),
            ("deceased", &self.deceased),
            ("name", &self.name),
            ("profile_notes", &self.profile_notes),
            ("date_of_birth", &self.date_of_birth),
            ("country_code", &self.country_code),
            ("country_name", &self.country_name),
            ("address_line", &self.address_line),
            ("city", &self.city),
            ("province", &self.province),
            ("list_reference_details", &self.list_reference_details),
        ];

        fields
            .into_iter()
            .filter(|(_, candidates)| candidates.iter().all(|h| h.trim().is_empty()))
            .map(|(field, _)| field)
            .collect()
    }
}
