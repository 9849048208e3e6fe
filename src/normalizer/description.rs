//! 投稿説明の検証
//!
//! 20語未満、大文字を含まない、文末記号（. ! ?）を含まない説明は空にする。

use super::{CorrectedValue, CorrectionField, NormalizationCorrection};
use photo_merge_common::MergedRecord;

const MIN_WORDS: usize = 20;

pub fn is_valid_description(description: &str) -> bool {
    if description.split_whitespace().count() < MIN_WORDS {
        return false;
    }
    let has_capital = description.chars().any(char::is_uppercase);
    let has_punctuation = description.chars().any(|c| matches!(c, '.' | '!' | '?'));
    has_capital && has_punctuation
}

pub fn normalize_descriptions(records: &[MergedRecord]) -> Vec<NormalizationCorrection> {
    let mut corrections = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let Some(description) = record.post_description.as_deref() else {
            continue;
        };
        if description.is_empty() || is_valid_description(description) {
            continue;
        }

        corrections.push(NormalizationCorrection {
            index,
            id: record.local.id.to_string(),
            field: CorrectionField::Description,
            original: description.to_string(),
            corrected: CorrectedValue::Cleared,
            reason: "説明として不十分（語数・大文字・文末記号）".to_string(),
        });
    }

    corrections
}
