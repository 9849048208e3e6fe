use super::ensure_parent;
use crate::error::Result;
use photo_merge_common::{MatchStatus, MergeSummary};
use std::path::Path;

/// 集計レポート本文
pub fn render_report(summary: &MergeSummary) -> String {
    let mut lines = vec![
        format!("Index rows: {}", summary.index_rows),
        format!("Posts discovered in meta: {}", summary.posts_discovered),
        format!("Images kept: {}", summary.images_kept),
        format!("Images dropped as noise: {}", summary.images_dropped),
        format!("Matched: {}", summary.matched),
        format!("Needs review: {}", summary.needs_review),
        format!("Post threshold: {}", summary.post_threshold),
        format!("Image threshold: {}", summary.image_threshold),
        String::new(),
        "By status:".to_string(),
    ];

    for status in MatchStatus::ALL {
        let count = summary.by_status.get(&status).copied().unwrap_or(0);
        lines.push(format!("  {}: {}", status, count));
    }

    lines.join("\n") + "\n"
}

pub fn write_report(summary: &MergeSummary, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    std::fs::write(path, render_report(summary))?;
    Ok(())
}
