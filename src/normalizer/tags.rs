//! タグの整形
//!
//! - ストップワードを除去
//! - 大文字小文字を無視して重複を除去（最初の表記を残す）

use super::{CorrectedValue, CorrectionField, NormalizationCorrection};
use photo_merge_common::MergedRecord;
use std::collections::HashSet;

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "in", "on", "at", "of", "to", "for", "with", "from", "by", "view", "during",
    "been", "were", "was", "are", "is", "and", "or", "but", "this", "that", "these", "those",
];

pub fn is_stop_word(tag: &str) -> bool {
    let lowered = tag.to_lowercase();
    STOP_WORDS.contains(&lowered.as_str())
}

/// ストップワード・空・重複を除いたタグ
pub fn clean_tags(tags: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.iter()
        .filter(|t| !t.trim().is_empty() && !is_stop_word(t))
        .filter(|t| seen.insert(t.to_lowercase()))
        .cloned()
        .collect()
}

pub fn normalize_tags(records: &[MergedRecord]) -> Vec<NormalizationCorrection> {
    let mut corrections = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let cleaned = clean_tags(&record.local.tags);
        if cleaned == record.local.tags {
            continue;
        }

        let removed = record.local.tags.len() - cleaned.len();
        corrections.push(NormalizationCorrection {
            index,
            id: record.local.id.to_string(),
            field: CorrectionField::Tags,
            original: format!("[{}]", record.local.tags.join(", ")),
            reason: format!("ストップワード・重複を{}件除去", removed),
            corrected: CorrectedValue::List(cleaned),
        });
    }

    corrections
}
