pub mod merged;
pub mod review;
pub mod report;

use crate::error::Result;
use photo_merge_common::MergeOutput;
use std::path::{Path, PathBuf};

/// 出力先
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub merged: PathBuf,
    pub review: PathBuf,
    pub report: PathBuf,
}

/// 親ディレクトリがなければ作る
pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn export_outputs(output: &MergeOutput, paths: &OutputPaths) -> Result<()> {
    merged::write_merged_json(&output.merged, &paths.merged)?;
    println!("✔ 統合結果: {}", paths.merged.display());

    review::write_review_csv(&output.review, &paths.review)?;
    println!("✔ レビューCSV: {} ({}件)", paths.review.display(), output.review.len());

    report::write_report(&output.summary, &paths.report)?;
    println!("✔ レポート: {}", paths.report.display());

    Ok(())
}
