//! Country Module
//!
//! 自由記述の国名・国コードをISO 3166-1 alpha-2コードに変換するモジュール。
//!
//! 解決順序:
//!
//! 1. 2文字の入力はコードとみなし、大文字化してそのまま返す
//! 2. 通称・表記揺れの補正表（正式名称より優先）
//! 3. 正式名称との完全一致（大文字小文字・記号を無視）
//! 4. 部分一致、Jaro-Winkler類似度による曖昧一致
//! 5. いずれにも該当しない場合は入力の先頭2文字を大文字化して返す

mod names;

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::types::CellValue;

/// 曖昧一致を採用する類似度の下限
const FUZZY_THRESHOLD: f64 = 0.92;

/// 部分一致の対象とする名前の最小文字数
const MIN_PARTIAL_LEN: usize = 4;

/// 国名に付随する政体・形容の語（"Kingdom of ..."、"... Federal Republic"等）
const STATE_WORDS: &[&str] = &[
    "and", "arab", "bolivarian", "commonwealth", "democratic", "duchy", "emirate", "federal",
    "federation", "grand", "independent", "islamic", "kingdom", "of", "people", "peoples",
    "plurinational", "principality", "republic", "socialist", "state", "states", "sultanate",
    "the", "union", "united",
];

/// 国名リゾルバー
///
/// 補正表と正式名称の索引を保持します。構築後は不変で、スレッド間で共有できます。
///
/// # 使用例
///
/// ```rust
/// use trae_feed::CountryResolver;
///
/// let resolver = CountryResolver::new();
/// assert_eq!(resolver.resolve("Russia"), Some("RU".to_string()));
/// assert_eq!(resolver.resolve("gb"), Some("GB".to_string()));
/// assert_eq!(resolver.resolve("   "), None);
/// ```
#[derive(Debug, Clone)]
pub struct CountryResolver {
    /// 補正表（正規化済み名称 → コード）
    aliases: HashMap<String, String>,

    /// 正式名称の索引（正規化済み名称 → コード）
    canonical: HashMap<String, String>,

    /// 部分一致・曖昧一致の候補（正規化済み名称, コード）
    candidates: Vec<(String, String)>,
}

impl Default for CountryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CountryResolver {
    /// 組み込みの補正表と正式名称表でリゾルバーを生成
    pub fn new() -> Self {
        let mut resolver = Self {
            aliases: HashMap::new(),
            canonical: HashMap::new(),
            candidates: Vec::new(),
        };

        for (code, name) in names::CANONICAL_NAMES {
            let folded = fold_name(name);
            resolver.push_candidate(&folded, code);
            resolver.canonical.insert(folded, code.to_string());

            // "Korea, Republic of" → "Republic of Korea"
            if let Some((head, tail)) = name.split_once(", ") {
                let inverted = fold_name(&format!("{} {}", tail, head));
                resolver.push_candidate(&inverted, code);
                resolver.canonical.entry(inverted).or_insert_with(|| code.to_string());
            }
        }

        for (name, code) in names::ALIASES {
            resolver = resolver.with_alias(name, code);
        }

        resolver
    }

    /// 補正表に項目を追加したリゾルバーを返す
    ///
    /// 既存の項目と同じ名前の場合は上書きします。
    pub fn with_alias(mut self, name: &str, code: &str) -> Self {
        let folded = fold_name(name);
        if folded.is_empty() {
            return self;
        }
        let code = code.trim().to_uppercase();
        self.push_candidate(&folded, &code);
        self.aliases.insert(folded, code);
        self
    }

    fn push_candidate(&mut self, folded: &str, code: &str) {
        if !self.candidates.iter().any(|(name, _)| name == folded) {
            self.candidates.push((folded.to_string(), code.to_string()));
        }
    }

    /// 国名・国コードをalpha-2コードに変換する
    ///
    /// # 戻り値
    ///
    /// * `Some(String)` - 入力が空でない場合は必ず値を返す（最悪でも先頭2文字）
    /// * `None` - 入力が空、または空白のみの場合
    pub fn resolve(&self, input: &str) -> Option<String> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        if input.chars().count() == 2 {
            return Some(input.to_uppercase());
        }

        let folded = fold_name(input);
        if let Some(code) = self.lookup(&folded) {
            return Some(code.to_string());
        }

        let fallback: String = input.chars().take(2).collect::<String>().to_uppercase();
        tracing::debug!(input, code = %fallback, "country not recognised, using truncated fallback");
        Some(fallback)
    }

    /// セル値をalpha-2コードに変換する
    ///
    /// 数値や日付も文字列化してから解決します。空の値は`None`を返します。
    pub fn resolve_value(&self, value: &CellValue) -> Option<String> {
        value.as_text().and_then(|text| self.resolve(&text))
    }

    fn lookup(&self, folded: &str) -> Option<&str> {
        if folded.is_empty() {
            return None;
        }

        self.aliases
            .get(folded)
            .or_else(|| self.canonical.get(folded))
            .map(String::as_str)
            .or_else(|| self.partial_match(folded))
            .or_else(|| self.fuzzy_match(folded))
    }

    /// 単語境界での部分一致
    ///
    /// 入力に含まれる名前のうち最長のものを優先し、次に入力を含む名前が
    /// 1つの国に限られる場合のみ採用します。入力に含まれる名前は、残りの語が
    /// 政体を表す語だけか、名前が入力の末尾にある場合に限ります
    /// （"Jersey City"は`JE`にしない）。
    fn partial_match(&self, folded: &str) -> Option<&str> {
        let padded_input = format!(" {} ", folded);

        let contained = self
            .candidates
            .iter()
            .filter(|(name, _)| name.len() >= MIN_PARTIAL_LEN)
            .filter(|(name, _)| dominates(&padded_input, name))
            .max_by_key(|(name, _)| name.len());
        if let Some((_, code)) = contained {
            return Some(code.as_str());
        }

        if folded.len() < MIN_PARTIAL_LEN {
            return None;
        }

        let mut codes = self
            .candidates
            .iter()
            .filter(|(name, _)| format!(" {} ", name).contains(&padded_input))
            .map(|(_, code)| code.as_str());
        let first = codes.next()?;
        if codes.all(|code| code == first) {
            Some(first)
        } else {
            None
        }
    }

    fn fuzzy_match(&self, folded: &str) -> Option<&str> {
        let (name, code, score) = self
            .candidates
            .iter()
            .map(|(name, code)| (name, code, strsim::jaro_winkler(folded, name)))
            .fold(None, |best: Option<(&String, &String, f64)>, candidate| match best {
                Some(b) if b.2 >= candidate.2 => Some(b),
                _ => Some(candidate),
            })?;

        if score >= FUZZY_THRESHOLD {
            tracing::trace!(input = folded, matched = %name, score, "fuzzy country match");
            Some(code.as_str())
        } else {
            None
        }
    }
}

/// 既定のリゾルバーで国名・国コードを変換する
///
/// ```rust
/// use trae_feed::resolve_country;
///
/// assert_eq!(resolve_country("North Korea"), Some("KP".to_string()));
/// assert_eq!(resolve_country("Atlantis"), Some("AT".to_string()));
/// ```
pub fn resolve_country(input: &str) -> Option<String> {
    static DEFAULT: OnceLock<CountryResolver> = OnceLock::new();
    DEFAULT.get_or_init(CountryResolver::new).resolve(input)
}

/// `name`が単語境界で入力に含まれ、入力の主要部分を成すかどうか
///
/// `padded_input`は前後に空白を1つずつ付けた正規化済みの入力です。
fn dominates(padded_input: &str, name: &str) -> bool {
    let needle = format!(" {} ", name);
    let Some(position) = padded_input.find(&needle) else {
        return false;
    };

    if position + needle.len() == padded_input.len() {
        return true;
    }

    padded_input[..position]
        .split_whitespace()
        .chain(padded_input[position + needle.len()..].split_whitespace())
        .all(|word| STATE_WORDS.contains(&word))
}

/// 比較用に名前を正規化する
///
/// 小文字化、アクセント除去、`&`の`and`への置換、アポストロフィの除去を行い、
/// その他の記号は空白として扱います。単語`st`は`saint`に展開します。
fn fold_name(name: &str) -> String {
    let mut buffer = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        match c {
            '&' => buffer.push_str(" and "),
            '\'' | '\u{2019}' | '`' => {}
            c if c.is_alphanumeric() => buffer.push(strip_accent(c)),
            _ => buffer.push(' '),
        }
    }

    buffer
        .split_whitespace()
        .map(|word| if word == "st" { "saint" } else { word })
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => c,
    }
}
