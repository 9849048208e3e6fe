//! レビューCSV出力

use super::ensure_parent;
use crate::error::Result;
use photo_merge_common::ReviewRow;
use serde::Serialize;
use std::path::Path;

/// CSVの1行（スコアは小数第3位、なければ空欄）
#[derive(Debug, Serialize)]
struct ReviewCsvRow<'a> {
    id: &'a str,
    folder: &'a str,
    title: &'a str,
    date: &'a str,
    reason: &'static str,
    post_score: String,
    img_score: String,
    post_title_suggested: &'a str,
    post_url_suggested: &'a str,
}

impl<'a> From<&'a ReviewRow> for ReviewCsvRow<'a> {
    fn from(row: &'a ReviewRow) -> Self {
        Self {
            id: &row.id,
            folder: &row.folder,
            title: &row.title,
            date: &row.date,
            reason: row.reason.as_str(),
            post_score: format_score(row.post_score),
            img_score: format_score(row.img_score),
            post_title_suggested: row.post_title_suggested.as_deref().unwrap_or(""),
            post_url_suggested: row.post_url_suggested.as_deref().unwrap_or(""),
        }
    }
}

fn format_score(score: Option<f64>) -> String {
    score.map(|s| format!("{:.3}", s)).unwrap_or_default()
}

/// ヘッダ付きで書き出す（0件でもヘッダは出力する）
pub fn write_review_csv(rows: &[ReviewRow], path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    writer.write_record([
        "id",
        "folder",
        "title",
        "date",
        "reason",
        "post_score",
        "img_score",
        "post_title_suggested",
        "post_url_suggested",
    ])?;

    for row in rows {
        writer.serialize(ReviewCsvRow::from(row))?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use photo_merge_common::MatchStatus;

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(Some(0.12345)), "0.123");
        assert_eq!(format_score(None), "");
    }

    #[test]
    fn test_csv_row_from_review() {
        let row = ReviewRow {
            id: "12".to_string(),
            folder: "Folder A".to_string(),
            title: "Title A".to_string(),
            date: String::new(),
            reason: MatchStatus::ImageLowConfidence,
            post_score: Some(0.61),
            img_score: Some(0.2),
            post_title_suggested: Some("Post".to_string()),
            post_url_suggested: None,
        };
        let csv_row = ReviewCsvRow::from(&row);
        assert_eq!(csv_row.reason, "image_low_confidence");
        assert_eq!(csv_row.post_score, "0.610");
        assert_eq!(csv_row.img_score, "0.200");
        assert_eq!(csv_row.post_url_suggested, "");
    }
}
