//! 統合後の整形（正規化）モジュール
//!
//! 統合済みレコードのタイトル・タグ・投稿説明を整える。
//!
//! ## 処理内容
//! 1. タイトルをフォルダ名から再生成（日付・Part表記を除去）
//! 2. タグからストップワードと重複を除去
//! 3. 意味のない投稿説明を空にする

pub mod title;
pub mod tags;
pub mod description;

use photo_merge_common::MergedRecord;
use std::fmt;

/// 整形結果
#[derive(Debug, Clone)]
pub struct NormalizationResult {
    /// 修正内容のリスト
    pub corrections: Vec<NormalizationCorrection>,
    /// 統計情報
    pub stats: NormalizationStats,
}

/// 修正後の値
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrectedValue {
    Text(String),
    List(Vec<String>),
    Cleared,
}

impl fmt::Display for CorrectedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrectedValue::Text(s) => write!(f, "{}", s),
            CorrectedValue::List(items) => write!(f, "[{}]", items.join(", ")),
            CorrectedValue::Cleared => write!(f, "（空）"),
        }
    }
}

/// 個別の修正内容
#[derive(Debug, Clone)]
pub struct NormalizationCorrection {
    /// 入力内の位置
    pub index: usize,
    /// レコードID
    pub id: String,
    /// 修正対象フィールド
    pub field: CorrectionField,
    /// 修正前の値（表示用）
    pub original: String,
    /// 修正後の値
    pub corrected: CorrectedValue,
    /// 修正理由
    pub reason: String,
}

/// 修正対象フィールド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionField {
    Title,
    Tags,
    Description,
}

impl fmt::Display for CorrectionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrectionField::Title => write!(f, "タイトル"),
            CorrectionField::Tags => write!(f, "タグ"),
            CorrectionField::Description => write!(f, "投稿説明"),
        }
    }
}

/// 整形の統計情報
#[derive(Debug, Clone, Default)]
pub struct NormalizationStats {
    /// 処理したレコード数
    pub total_records: usize,
    /// 修正したレコード数
    pub corrected_records: usize,
    pub title_corrections: usize,
    pub tag_corrections: usize,
    pub description_corrections: usize,
}

/// 整形オプション
#[derive(Debug, Clone)]
pub struct NormalizationOptions {
    pub clean_title: bool,
    pub clean_tags: bool,
    pub clean_description: bool,
}

impl Default for NormalizationOptions {
    fn default() -> Self {
        Self {
            clean_title: true,
            clean_tags: true,
            clean_description: true,
        }
    }
}

/// 統合済みレコードの修正案を作る
pub fn normalize_records(
    records: &[MergedRecord],
    options: &NormalizationOptions,
) -> NormalizationResult {
    let mut corrections = Vec::new();
    let mut stats = NormalizationStats {
        total_records: records.len(),
        ..Default::default()
    };

    if options.clean_title {
        let found = title::normalize_titles(records);
        stats.title_corrections = found.len();
        corrections.extend(found);
    }

    if options.clean_tags {
        let found = tags::normalize_tags(records);
        stats.tag_corrections = found.len();
        corrections.extend(found);
    }

    if options.clean_description {
        let found = description::normalize_descriptions(records);
        stats.description_corrections = found.len();
        corrections.extend(found);
    }

    let corrected: std::collections::HashSet<usize> =
        corrections.iter().map(|c| c.index).collect();
    stats.corrected_records = corrected.len();

    NormalizationResult { corrections, stats }
}

/// 修正を適用する
pub fn apply_corrections(records: &mut [MergedRecord], corrections: &[NormalizationCorrection]) {
    for correction in corrections {
        let Some(record) = records.get_mut(correction.index) else {
            continue;
        };
        match (&correction.field, &correction.corrected) {
            (CorrectionField::Title, CorrectedValue::Text(title)) => {
                record.local.title = title.clone();
            }
            (CorrectionField::Tags, CorrectedValue::List(tags)) => {
                record.local.tags = tags.clone();
            }
            (CorrectionField::Description, CorrectedValue::Cleared) => {
                record.post_description = None;
            }
            _ => {
                log::warn!(
                    "skipping inconsistent correction for {}: {} -> {}",
                    correction.id,
                    correction.field,
                    correction.corrected
                );
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use photo_merge_common::{LocalRecord, MatchStatus, MergedRecord, RecordId};

    pub fn merged(id: i64, folder: &str, title: &str, tags: &[&str], description: Option<&str>) -> MergedRecord {
        MergedRecord {
            local: LocalRecord {
                id: RecordId::Number(id),
                folder: folder.to_string(),
                title: title.to_string(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                ..Default::default()
            },
            match_status: MatchStatus::Matched,
            image_url: None,
            post_url: None,
            post_title: None,
            post_labels: None,
            post_source: None,
            post_description: description.map(str::to_string),
            match_confidence: 1.0,
        }
    }
}
