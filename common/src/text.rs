//! テキスト正規化
//!
//! スラッグ化・トークン化・類似度・日付や「Part」番号の抽出を行う純粋関数群。

use crate::synonyms::SynonymTable;
use regex::Regex;
use std::collections::BTreeSet;

lazy_static::lazy_static! {
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
    static ref LEADING_DATE_RE: Regex = Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}\s+").unwrap();
    static ref NON_SLUG_RE: Regex = Regex::new(r"[^a-z0-9\s]+").unwrap();
    static ref NON_WORD_RE: Regex = Regex::new(r"[^a-z0-9\s]").unwrap();
    static ref PART_ARABIC_RE: Regex = Regex::new(r"\bpart\b\s*[-:]?\s*([0-9]{1,2})\b").unwrap();
    static ref PART_ROMAN_RE: Regex =
        Regex::new(r"\bpart\b\s*[-:]?\s*(i|ii|iii|iv|v|vi|vii|viii|ix|x)\b").unwrap();
    static ref INDEX_DATE_RE: Regex = Regex::new(r"^([0-9]{4})-([0-9]{2})-[0-9]{2}").unwrap();
    static ref POST_URL_DATE_RE: Regex = Regex::new(r"/([0-9]{4})/([0-9]{2})/").unwrap();
    static ref YEAR_RE: Regex = Regex::new(r"^[0-9]{4}$").unwrap();
    static ref ORIG_NUMBER_RE: Regex =
        Regex::new(r"([0-9]{1,3})\.(?:jpg|jpeg|png|webp|gif)$").unwrap();
    static ref IMAGE_EXT_RE: Regex = Regex::new(r"(?i)\.(jpg|jpeg|png|webp|gif)$").unwrap();
}

/// ローマ数字（i〜x）
const ROMAN_NUMERALS: &[(&str, u32)] = &[
    ("i", 1),
    ("ii", 2),
    ("iii", 3),
    ("iv", 4),
    ("v", 5),
    ("vi", 6),
    ("vii", 7),
    ("viii", 8),
    ("ix", 9),
    ("x", 10),
];

/// 連続空白を1つにまとめ、前後を除去
pub fn normalize(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

/// `normalize` の Option 版（None は空文字）
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}

/// 照合用スラッグ
///
/// 小文字化 → 先頭の `YYYY-MM-DD ` を除去 → 英数字以外を空白に → 同義語適用
pub fn slugify(text: &str, synonyms: &SynonymTable) -> String {
    let lowered = normalize(text).to_lowercase();
    let without_date = LEADING_DATE_RE.replace(&lowered, "");
    let cleaned = NON_SLUG_RE.replace_all(&without_date, " ");
    let collapsed = normalize(&cleaned);
    synonyms.apply(&collapsed)
}

/// 単語トークン（2文字以下は除外）
pub fn tokens(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    NON_WORD_RE
        .replace_all(&lowered, " ")
        .split_whitespace()
        .filter(|t| t.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

/// トークン集合
pub fn token_set(text: &str) -> BTreeSet<String> {
    tokens(text).into_iter().collect()
}

/// Jaccard係数（どちらかが空なら 0.0）
pub fn jaccard(a: &str, b: &str) -> f64 {
    jaccard_sets(&token_set(a), &token_set(b))
}

/// トークン集合同士の Jaccard係数
pub fn jaccard_sets(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

/// 文字単位の類似度（0.0〜1.0）
///
/// 正規化・小文字化した文字列の最長共通部分列から `2*LCS / (|a|+|b|)` を求める。
pub fn fuzzy(a: &str, b: &str) -> f64 {
    let a_chars = fuzzy_key(a);
    let b_chars = fuzzy_key(b);
    fuzzy_chars(&a_chars, &b_chars)
}

/// `fuzzy` 用に正規化済みの文字列
pub fn fuzzy_key(text: &str) -> Vec<char> {
    normalize(text).to_lowercase().chars().collect()
}

/// 文字配列同士の類似度
pub fn fuzzy_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * lcs_length(a, b) as f64 / total as f64
}

/// 最長共通部分列の長さ
fn lcs_length(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// 「Part 3」「Part - III」「(Part II)」から番号を取り出す
///
/// アラビア数字を優先し、なければローマ数字（i〜x）を探す。
pub fn extract_part_number(text: &str) -> Option<u32> {
    let lowered = text.to_lowercase();

    if let Some(caps) = PART_ARABIC_RE.captures(&lowered) {
        if let Ok(n) = caps[1].parse::<u32>() {
            return Some(n);
        }
    }

    let caps = PART_ROMAN_RE.captures(&lowered)?;
    ROMAN_NUMERALS
        .iter()
        .find(|(roman, _)| *roman == &caps[1])
        .map(|(_, n)| *n)
}

/// 4桁の年から年代タグ（1911 → "1910s"）
pub fn decade_tag(year: &str) -> Option<String> {
    if !YEAR_RE.is_match(year) {
        return None;
    }
    Some(format!("{}0s", &year[..3]))
}

/// `YYYY-MM-DD` から (年, 月)
pub fn year_month_from_index_date(date: &str) -> (Option<String>, Option<String>) {
    match INDEX_DATE_RE.captures(date) {
        Some(caps) => (Some(caps[1].to_string()), Some(caps[2].to_string())),
        None => (None, None),
    }
}

/// 投稿URLの `/YYYY/MM/` から (年, 月)
pub fn year_month_from_post_url(url: &str) -> (Option<String>, Option<String>) {
    match POST_URL_DATE_RE.captures(url) {
        Some(caps) => (Some(caps[1].to_string()), Some(caps[2].to_string())),
        None => (None, None),
    }
}

/// 元ファイル名末尾の番号（`... 07.jpg` → 7）
pub fn number_from_orig_filename(name: &str) -> Option<u32> {
    let lowered = name.to_lowercase();
    let caps = ORIG_NUMBER_RE.captures(&lowered)?;
    caps[1].parse().ok()
}

/// パスのファイル名部分から拡張子を除いたトークン
pub fn filename_tokens(path: &str) -> BTreeSet<String> {
    let base = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let stem = IMAGE_EXT_RE.replace(base, "");
    token_set(&stem)
}
