//! 照合の実行（並列・進捗表示）

use crate::error::Result;
use crate::loader;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressIterator, ProgressStyle};
use photo_merge_common::{
    aggregate_posts, LocalRecord, MatchEngine, MergeOutput, OverrideTable, Resolution,
    ScoringWeights, SynonymTable, Thresholds,
};
use rayon::prelude::*;
use std::path::Path;

/// メタデータ・オーバーライドから照合エンジンを組み立てる
///
/// 入力ファイルがない場合はここでエラーになり、照合は始まらない。
pub fn build_engine(
    meta_path: &Path,
    overrides_path: Option<&Path>,
    synonyms: SynonymTable,
    thresholds: Thresholds,
) -> Result<MatchEngine> {
    let meta = loader::load_meta(meta_path)?;
    let overrides = match overrides_path {
        Some(path) => loader::load_overrides(path)?,
        None => OverrideTable::new(),
    };
    let aggregation = aggregate_posts(&meta, &synonyms);
    log::debug!(
        "{} image rows -> {} posts ({} dropped), {} overrides",
        meta.len(),
        aggregation.posts.len(),
        aggregation.images_dropped,
        overrides.len()
    );

    Ok(MatchEngine::new(
        aggregation,
        overrides,
        synonyms,
        ScoringWeights::default(),
        thresholds,
    ))
}

/// 実行オプション
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// ワーカー数（None: rayon既定、1: 逐次実行）
    pub jobs: Option<usize>,
    /// 進捗バーを表示する
    pub progress: bool,
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::with_template("  {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}")
    {
        bar.set_style(style.progress_chars("=>-"));
    }
    bar
}

/// 全レコードを照合する
///
/// 並列実行でも結果は入力順に並ぶ。
pub fn run_merge(
    engine: &MatchEngine,
    records: &[LocalRecord],
    options: RunOptions,
) -> Result<MergeOutput> {
    let bar = progress_bar(records.len(), options.progress);

    let resolutions: Vec<Resolution> = match options.jobs {
        Some(1) => records
            .iter()
            .progress_with(bar.clone())
            .map(|r| engine.resolve(r))
            .collect(),
        Some(jobs) => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
            pool.install(|| resolve_parallel(engine, records, &bar))
        }
        None => resolve_parallel(engine, records, &bar),
    };

    bar.finish_and_clear();
    Ok(engine.collect(records, resolutions))
}

fn resolve_parallel(
    engine: &MatchEngine,
    records: &[LocalRecord],
    bar: &ProgressBar,
) -> Vec<Resolution> {
    records
        .par_iter()
        .progress_with(bar.clone())
        .map(|r| engine.resolve(r))
        .collect()
}
