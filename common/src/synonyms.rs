//! 同義語テーブル
//!
//! 地名の旧称・表記ゆれ（Bombay→Mumbai 等）を単語単位で畳み込む。
//! テーブルは起動時に一度だけ構築し、以後は読み取り専用で照合器に渡す。

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

lazy_static::lazy_static! {
    static ref NON_WORD_RE: Regex = Regex::new(r"[^a-z0-9\s]").unwrap();
}

/// 組み込みの同義語
const BUILTIN_SYNONYMS: &[(&str, &str)] = &[
    ("bombay", "mumbai"),
    ("calcutta", "kolkata"),
    ("benaras", "varanasi"),
    ("benares", "varanasi"),
    ("banaras", "varanasi"),
    ("poona", "pune"),
    ("madras", "chennai"),
    ("baroda", "vadodara"),
    ("cawnpore", "kanpur"),
    ("trivandrum", "thiruvananthapuram"),
    ("travancore", "kerala"),
    ("mysore", "mysuru"),
    // 一般語
    ("hindu", "indian"),
    ("hindustan", "india"),
];

/// 同義語テーブル（読み取り専用）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SynonymTable {
    map: BTreeMap<String, String>,
}

impl SynonymTable {
    /// 組み込みテーブル
    pub fn builtin() -> Self {
        let pairs = BUILTIN_SYNONYMS
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()));
        // 組み込みの値はすべて1語なので失敗しない
        Self::from_pairs(pairs).unwrap_or_default()
    }

    /// JSON（`{"旧称": "現名称", ...}`）から読み込み
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, String> = serde_json::from_str(json)?;
        Self::from_pairs(raw)
    }

    /// キー・値を正規化して連鎖を解決したテーブルを作る
    ///
    /// 値は1語でなければならない。`a→b`, `b→c` は `a→c` に畳み込まれるため、
    /// 変換は一度適用すれば安定する。
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut map = BTreeMap::new();
        for (from, to) in pairs {
            let key = single_word(&from)
                .ok_or_else(|| Error::Config(format!("synonym key must be a single word: {:?}", from)))?;
            let value = single_word(&to)
                .ok_or_else(|| Error::Config(format!("synonym value must be a single word: {:?}", to)))?;
            map.insert(key, value);
        }
        Ok(Self { map: resolve_chains(map) })
    }

    /// 設定をマージ（後から追加した設定が優先）
    pub fn merge(&mut self, other: &SynonymTable) {
        let mut combined = std::mem::take(&mut self.map);
        combined.extend(other.map.clone());
        self.map = resolve_chains(combined);
    }

    /// 単語単位で同義語を適用する
    ///
    /// 小文字化し、英数字以外を区切りとして分割、置換後に半角スペースで連結する。
    pub fn apply(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        NON_WORD_RE
            .replace_all(&lowered, " ")
            .split_whitespace()
            .map(|token| self.map.get(token).map(String::as_str).unwrap_or(token))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.map.get(token).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// 英数字1語に正規化（複数語・空なら None）
fn single_word(text: &str) -> Option<String> {
    let lowered = text.to_lowercase();
    let cleaned = NON_WORD_RE.replace_all(&lowered, " ");
    let mut words = cleaned.split_whitespace();
    let word = words.next()?;
    if words.next().is_some() {
        return None;
    }
    Some(word.to_string())
}

/// `a→b→c` を `a→c` に畳み込む
///
/// 循環（`a→b→a`）は循環内の語のうち辞書順最小の語に寄せる。
/// 循環に入る手前の語（`x→a→b→a` の `x`）も同じ語に寄せる。
fn resolve_chains(map: BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut resolved = BTreeMap::new();

    for key in map.keys() {
        let mut path: Vec<&str> = vec![key.as_str()];
        let mut current = key.as_str();

        while let Some(next) = map.get(current) {
            if let Some(start) = path.iter().position(|w| *w == next.as_str()) {
                current = path[start..].iter().copied().min().unwrap_or(current);
                break;
            }
            path.push(next.as_str());
            current = next.as_str();
        }

        if current != key {
            resolved.insert(key.clone(), current.to_string());
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_places() {
        let table = SynonymTable::builtin();
        assert_eq!(table.apply("Bombay Harbour"), "mumbai harbour");
        assert_eq!(table.apply("Old Calcutta, 1890"), "old kolkata 1890");
        assert_eq!(table.apply("Benares-Ghats"), "varanasi ghats");
    }

    #[test]
    fn test_apply_is_idempotent() {
        let table = SynonymTable::builtin();
        for text in ["Poona & Bombay", "Hindustan Hindu", "  madras  mysore ", "", "Ghats"] {
            let once = table.apply(text);
            assert_eq!(table.apply(&once), once);
        }
    }

    #[test]
    fn test_chains_are_resolved() {
        let table = SynonymTable::from_pairs(vec![
            ("a1".to_string(), "b1".to_string()),
            ("b1".to_string(), "c1".to_string()),
        ])
        .unwrap();
        assert_eq!(table.get("a1"), Some("c1"));
        assert_eq!(table.apply(&table.apply("a1 b1")), "c1 c1");
    }

    #[test]
    fn test_cycles_are_stable() {
        let table = SynonymTable::from_pairs(vec![
            ("dacca".to_string(), "dhaka".to_string()),
            ("dhaka".to_string(), "dacca".to_string()),
        ])
        .unwrap();
        let once = table.apply("dhaka dacca");
        assert_eq!(once, "dacca dacca");
        assert_eq!(table.apply(&once), once);
    }

    #[test]
    fn test_chain_into_cycle_keeps_alias() {
        let table = SynonymTable::from_json(r#"{"aa": "dhaka", "dhaka": "dacca", "dacca": "dhaka"}"#)
            .unwrap();
        assert_eq!(table.get("aa"), Some("dacca"));
        assert_eq!(table.get("dhaka"), Some("dacca"));
        assert_eq!(table.get("dacca"), None);
        let once = table.apply("aa dhaka dacca");
        assert_eq!(once, "dacca dacca dacca");
        assert_eq!(table.apply(&once), once);
    }

    #[test]
    fn test_multi_word_value_rejected() {
        let result = SynonymTable::from_json(r#"{"delhi": "new delhi"}"#);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_merge_overrides_builtin() {
        let mut table = SynonymTable::builtin();
        let custom = SynonymTable::from_json(r#"{"Bombay": "Bambai", "simla": "shimla"}"#).unwrap();
        table.merge(&custom);
        assert_eq!(table.apply("bombay simla"), "bambai shimla");
        assert_eq!(table.apply("calcutta"), "kolkata");
    }
}
