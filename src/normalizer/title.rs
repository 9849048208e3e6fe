//! タイトルの整形
//!
//! - フォルダ名先頭の日付（`YYYY-MM-DD `）を除去
//! - Part表記（`Part II`, `- Part 3`）を除去
//! - 連続空白を統一

use super::{CorrectedValue, CorrectionField, NormalizationCorrection};
use photo_merge_common::text::normalize;
use photo_merge_common::MergedRecord;
use regex::Regex;

lazy_static::lazy_static! {
    static ref LEADING_DATE_RE: Regex = Regex::new(r"^\s*[0-9]{4}-[0-9]{2}-[0-9]{2}\s+").unwrap();
    static ref PART_RE: Regex = Regex::new(r"(?i)\s*[-–—]?\s*\bpart\b\s*[-–—]?\s*[ivx0-9]+\b").unwrap();
}

/// フォルダ名から表示用タイトルを作る
pub fn clean_title_from_folder(folder: &str) -> String {
    let without_date = LEADING_DATE_RE.replace(folder, "");
    let without_part = PART_RE.replace_all(&without_date, " ");
    normalize(&without_part)
}

pub fn normalize_titles(records: &[MergedRecord]) -> Vec<NormalizationCorrection> {
    let mut corrections = Vec::new();

    for (index, record) in records.iter().enumerate() {
        if record.local.folder.is_empty() {
            continue;
        }

        let cleaned = clean_title_from_folder(&record.local.folder);
        if cleaned.is_empty() || cleaned == record.local.title {
            continue;
        }

        corrections.push(NormalizationCorrection {
            index,
            id: record.local.id.to_string(),
            field: CorrectionField::Title,
            original: record.local.title.clone(),
            reason: format!("フォルダ名「{}」から再生成", record.local.folder),
            corrected: CorrectedValue::Text(cleaned),
        });
    }

    corrections
}
