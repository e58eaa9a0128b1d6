//! Record Module
//!
//! 出力スキーマ（正規化済みレコード）を定義するモジュール。
//! フィールドの出力順は構造体の宣言順に従います。

use serde::{Deserialize, Serialize};

/// `activeStatus`に常に設定される値
pub const ACTIVE_STATUS: &str = "Active";

/// レコード種別
///
/// 出力時は文字列として直列化されます（`"company"`、`"person"`、またはその他の値）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordType {
    Company,
    Person,
    /// 未知の種別（正規化した値をそのまま出力）
    Other(String),
}

impl RecordType {
    /// 入力列の値から種別を判定する
    ///
    /// 前後の空白を除去して小文字化し、`entity`は`company`、`person`は`person`に
    /// 対応付けます。その他の値は正規化後の値のまま`Other`となります。
    /// 空の値は`None`を返します。
    pub fn classify(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "" => None,
            "entity" => Some(RecordType::Company),
            other => Some(RecordType::from(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RecordType::Company => "company",
            RecordType::Person => "person",
            RecordType::Other(s) => s,
        }
    }
}

impl From<String> for RecordType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "company" => RecordType::Company,
            "person" => RecordType::Person,
            _ => RecordType::Other(value),
        }
    }
}

impl From<RecordType> for String {
    fn from(value: RecordType) -> Self {
        match value {
            RecordType::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

/// 住所
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub country_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
}

/// リスト階層の1要素
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyNode {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// リスト所属情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEntry {
    pub id: String,
    pub name: String,
    pub active: bool,
    pub list_active: bool,
    pub hierarchy: Vec<HierarchyNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// 別名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub name: String,
}

/// 正規化済みレコード（出力フィードの1行）
///
/// 空の値を持つフィールドは出力されません。ただし国コード配列
/// （`citizenshipCode`、`residentOfCode`、`countryOfRegistrationCode`）は
/// 種別による除外規則でのみ取り除かれ、空配列のまま出力されることがあります。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub record_type: Option<RecordType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deceased: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_notes: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub date_of_birth_array: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<Address>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citizenship_code: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resident_of_code: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_of_registration_code: Option<Vec<String>>,

    pub lists: Vec<ListEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<Alias>,

    pub active_status: String,
}

impl NormalizedRecord {
    /// 親リストのみを持つ空のレコードを生成
    pub(crate) fn new(parent: ListEntry) -> Self {
        Self {
            profile_id: None,
            record_type: None,
            name: None,
            action: None,
            gender: None,
            deceased: None,
            profile_notes: None,
            date_of_birth_array: Vec::new(),
            addresses: Vec::new(),
            citizenship_code: None,
            resident_of_code: None,
            country_of_registration_code: None,
            lists: vec![parent],
            aliases: Vec::new(),
            active_status: ACTIVE_STATUS.to_string(),
        }
    }

    pub fn is_company(&self) -> bool {
        self.record_type == Some(RecordType::Company)
    }

    pub fn is_person(&self) -> bool {
        self.record_type == Some(RecordType::Person)
    }

    /// 種別による除外規則を適用する
    ///
    /// - `company`: `citizenshipCode`、`residentOfCode`、`dateOfBirthArray`を除外
    /// - `person`: `countryOfRegistrationCode`を除外
    /// - その他: 除外なし
    pub(crate) fn apply_type_rules(&mut self) {
        match self.record_type {
            Some(RecordType::Company) => {
                self.citizenship_code = None;
                self.resident_of_code = None;
                self.date_of_birth_array.clear();
            }
            Some(RecordType::Person) => {
                self.country_of_registration_code = None;
            }
            Some(RecordType::Other(_)) | None => {}
        }
    }

    /// JSONオブジェクト1行に直列化する
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
