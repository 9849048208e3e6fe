//! 統合処理
//!
//! 1レコードごとに オーバーライド確認 → 投稿照合 → 画像照合 → 結果分類 を行う。
//! レコード同士は独立しているので、呼び出し側で並列化してもよい（結果は入力順に戻すこと）。

use crate::aggregate::Aggregation;
use crate::image_matcher::{guess_position, ImageMatcher};
use crate::overrides::OverrideTable;
use crate::post_matcher::{PostFeatures, PostMatcher, PostScore, RecordFeatures};
use crate::synonyms::SynonymTable;
use crate::types::{
    round4, CandidatePost, LocalRecord, MatchOutcome, MatchStatus, MatchedPost, MergedRecord,
    OverrideEntry, ReviewRow,
};
use crate::weights::{ScoringWeights, Thresholds};
use std::collections::BTreeMap;

/// 1レコード分の処理結果
#[derive(Debug, Clone)]
pub struct Resolution {
    pub outcome: MatchOutcome,
    /// 投稿照合の内訳（オーバーライド経由なら None）
    pub post_score: Option<PostScore>,
}

/// 実行全体の集計
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeSummary {
    pub index_rows: usize,
    pub posts_discovered: usize,
    pub images_kept: usize,
    pub images_dropped: usize,
    pub matched: usize,
    pub needs_review: usize,
    pub post_threshold: f64,
    pub image_threshold: f64,
    pub by_status: BTreeMap<MatchStatus, usize>,
}

/// 統合結果
#[derive(Debug, Clone, Default)]
pub struct MergeOutput {
    pub merged: Vec<MergedRecord>,
    pub review: Vec<ReviewRow>,
    pub summary: MergeSummary,
}

/// 照合エンジン（構築後は読み取り専用）
#[derive(Debug, Clone)]
pub struct MatchEngine {
    posts: Vec<CandidatePost>,
    post_features: Vec<PostFeatures>,
    overrides: OverrideTable,
    synonyms: SynonymTable,
    weights: ScoringWeights,
    thresholds: Thresholds,
    images_kept: usize,
    images_dropped: usize,
}

impl MatchEngine {
    pub fn new(
        aggregation: Aggregation,
        overrides: OverrideTable,
        synonyms: SynonymTable,
        weights: ScoringWeights,
        thresholds: Thresholds,
    ) -> Self {
        let post_features = aggregation.posts.iter().map(PostFeatures::new).collect();
        Self {
            posts: aggregation.posts,
            post_features,
            overrides,
            synonyms,
            weights,
            thresholds,
            images_kept: aggregation.images_kept,
            images_dropped: aggregation.images_dropped,
        }
    }

    pub fn posts(&self) -> &[CandidatePost] {
        &self.posts
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn synonyms(&self) -> &SynonymTable {
        &self.synonyms
    }

    pub fn post_matcher(&self) -> PostMatcher<'_> {
        PostMatcher::new(&self.weights)
    }

    pub fn image_matcher(&self) -> ImageMatcher<'_> {
        ImageMatcher::new(&self.weights)
    }

    pub fn post_features(&self) -> &[PostFeatures] {
        &self.post_features
    }

    /// 1レコードを照合する
    pub fn resolve(&self, record: &LocalRecord) -> Resolution {
        if let Some(entry) = self.overrides.lookup(&record.folder, &record.title) {
            return Resolution {
                outcome: self.resolve_override(record, entry),
                post_score: None,
            };
        }

        let features = RecordFeatures::new(record, &self.synonyms);
        let best = self
            .post_matcher()
            .best(&features, &self.posts, &self.post_features);

        let (post, score) = match best {
            Some((post, score)) if score.total >= self.thresholds.post => (post, score),
            Some((post, score)) => {
                log::debug!(
                    "{}: best post {:?} below threshold ({:.3})",
                    record.id,
                    post.post_url,
                    score.total
                );
                return Resolution {
                    outcome: MatchOutcome::PostLowConfidence {
                        post_score: score.total,
                        suggestion: Some(MatchedPost::from(post)),
                    },
                    post_score: Some(score),
                };
            }
            None => {
                return Resolution {
                    outcome: MatchOutcome::PostLowConfidence {
                        post_score: 0.0,
                        suggestion: None,
                    },
                    post_score: None,
                };
            }
        };

        let guessed = guess_position(record, None);
        let best_image = self.image_matcher().best(record, &post.images, guessed);

        let outcome = match best_image {
            Some((image, image_score)) if image_score >= self.thresholds.image => {
                let confidence = (score.total * self.weights.confidence_post
                    + image_score * self.weights.confidence_image)
                    .min(1.0);
                MatchOutcome::Matched {
                    post: MatchedPost::from(post),
                    image_url: image.url.clone(),
                    post_score: score.total,
                    image_score,
                    confidence: round4(confidence),
                }
            }
            other => MatchOutcome::ImageLowConfidence {
                post: MatchedPost::from(post),
                post_score: score.total,
                image_score: other.map(|(_, s)| s),
            },
        };

        log::debug!(
            "{}: {} post={:.3} (jac={:.2} fuz={:.2} date={:.2} dec={:.2} lab={:.2} part={:.2})",
            record.id,
            outcome.status(),
            score.total,
            score.jaccard,
            score.fuzzy,
            score.date_boost,
            score.decade_boost,
            score.label_boost,
            score.part_bonus
        );

        Resolution {
            outcome,
            post_score: Some(score),
        }
    }

    /// オーバーライド経由（スコアによる投稿照合は行わない）
    fn resolve_override(&self, record: &LocalRecord, entry: &OverrideEntry) -> MatchOutcome {
        let Some(post) = self.posts.iter().find(|p| p.post_url == entry.post_url) else {
            log::warn!(
                "{}: override target not found: {}",
                record.id,
                entry.post_url
            );
            return MatchOutcome::OverridePostNotFound {
                post_url: entry.post_url.clone(),
            };
        };

        // 画像は閾値なしで最良のものを採用する
        let guessed = guess_position(record, entry.image_pos);
        match self.image_matcher().best(record, &post.images, guessed) {
            Some((image, _)) => MatchOutcome::OverrideForced {
                post: MatchedPost::from(post),
                image_url: image.url.clone(),
            },
            None => MatchOutcome::OverrideImageMissing {
                post: MatchedPost::from(post),
            },
        }
    }

    /// 全レコードを順に照合する
    pub fn merge_all(&self, records: &[LocalRecord]) -> MergeOutput {
        let resolutions: Vec<Resolution> = records.iter().map(|r| self.resolve(r)).collect();
        self.collect(records, resolutions)
    }

    /// 照合結果（入力順）から統合結果・レビュー行・集計を作る
    pub fn collect(&self, records: &[LocalRecord], resolutions: Vec<Resolution>) -> MergeOutput {
        let mut summary = MergeSummary {
            index_rows: records.len(),
            posts_discovered: self.posts.len(),
            images_kept: self.images_kept,
            images_dropped: self.images_dropped,
            post_threshold: self.thresholds.post,
            image_threshold: self.thresholds.image,
            ..Default::default()
        };
        let mut merged = Vec::with_capacity(records.len());
        let mut review = Vec::new();

        for (record, resolution) in records.iter().zip(resolutions) {
            let outcome = resolution.outcome;
            *summary.by_status.entry(outcome.status()).or_insert(0) += 1;

            if outcome.is_resolved() {
                summary.matched += 1;
            } else {
                summary.needs_review += 1;
            }
            if let Some(row) = outcome.review_row(record) {
                review.push(row);
            }
            merged.push(MergedRecord::new(record.clone(), &outcome));
        }

        log::info!(
            "merged {} records: {} matched, {} need review",
            summary.index_rows,
            summary.matched,
            summary.needs_review
        );

        MergeOutput {
            merged,
            review,
            summary,
        }
    }
}
