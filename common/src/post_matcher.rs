//! 投稿照合
//!
//! ローカルレコードと各候補投稿のスコアを計算し、最良の投稿を選ぶ。
//!
//! ## スコア構成
//! - タイトル類似度: Jaccard × 0.45 + 文字類似度 × 0.35（フォルダ名・タイトルの良い方）
//! - 日付: 年一致 +0.10、さらに月一致 +0.05
//! - 年代: 年代タグがラベルに含まれるか投稿の年代と一致 +0.06
//! - ラベル重複: min(0.10 + 0.03 × 重複数, 0.20)
//! - Part番号一致: +0.10

use crate::synonyms::SynonymTable;
use crate::text;
use crate::types::{CandidatePost, LocalRecord};
use crate::weights::ScoringWeights;
use std::collections::{BTreeSet, HashSet};

/// スコアの内訳
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PostScore {
    pub jaccard: f64,
    pub fuzzy: f64,
    pub date_boost: f64,
    pub decade_boost: f64,
    pub label_boost: f64,
    pub part_bonus: f64,
    pub total: f64,
}

/// 照合用に前処理したローカルレコードの特徴量
#[derive(Debug, Clone)]
pub struct RecordFeatures {
    pub folder_slug: String,
    pub title_slug: String,
    folder_tokens: BTreeSet<String>,
    title_tokens: BTreeSet<String>,
    folder_chars: Vec<char>,
    title_chars: Vec<char>,
    pub year: Option<String>,
    pub month: Option<String>,
    pub decade: Option<String>,
    pub tags: HashSet<String>,
    pub part: Option<u32>,
}

impl RecordFeatures {
    pub fn new(record: &LocalRecord, synonyms: &SynonymTable) -> Self {
        let folder_slug = text::slugify(&record.folder, synonyms);
        let title_slug = text::slugify(&record.title, synonyms);
        let (year, month) = record
            .date
            .as_deref()
            .map(text::year_month_from_index_date)
            .unwrap_or((None, None));
        let decade = year.as_deref().and_then(text::decade_tag);
        let part = text::extract_part_number(&format!("{} {}", record.folder, record.title))
            .filter(|&p| p > 0);

        Self {
            folder_tokens: text::token_set(&folder_slug),
            title_tokens: text::token_set(&title_slug),
            folder_chars: text::fuzzy_key(&folder_slug),
            title_chars: text::fuzzy_key(&title_slug),
            tags: record.tags.iter().map(|t| synonyms.apply(t)).collect(),
            folder_slug,
            title_slug,
            year,
            month,
            decade,
            part,
        }
    }
}

/// 投稿タイトルの前処理（投稿ごとに一度だけ）
#[derive(Debug, Clone)]
pub struct PostFeatures {
    title_tokens: BTreeSet<String>,
    title_chars: Vec<char>,
    labels_joined: String,
    labels: HashSet<String>,
}

impl PostFeatures {
    pub fn new(post: &CandidatePost) -> Self {
        Self {
            title_tokens: text::token_set(&post.post_title),
            title_chars: text::fuzzy_key(&post.post_title),
            labels_joined: post.labels.join(" ").to_lowercase(),
            labels: post.labels.iter().cloned().collect(),
        }
    }
}

/// 投稿照合器
#[derive(Debug, Clone, Copy)]
pub struct PostMatcher<'a> {
    weights: &'a ScoringWeights,
}

impl<'a> PostMatcher<'a> {
    pub fn new(weights: &'a ScoringWeights) -> Self {
        Self { weights }
    }

    /// 1件の候補投稿に対するスコア
    pub fn score(
        &self,
        record: &RecordFeatures,
        post: &CandidatePost,
        features: &PostFeatures,
    ) -> PostScore {
        let w = self.weights;

        // フォルダ名・タイトルの強い方
        let jaccard = text::jaccard_sets(&record.folder_tokens, &features.title_tokens)
            .max(text::jaccard_sets(&record.title_tokens, &features.title_tokens));
        let fuzzy = text::fuzzy_chars(&record.folder_chars, &features.title_chars)
            .max(text::fuzzy_chars(&record.title_chars, &features.title_chars));

        // 年が一致したときだけ月を見る
        let mut date_boost = 0.0;
        if let (Some(year), Some(post_year)) = (&record.year, &post.post_year) {
            if year == post_year {
                date_boost += w.year_match;
                if let (Some(month), Some(post_month)) = (&record.month, &post.post_month) {
                    if month == post_month {
                        date_boost += w.month_match;
                    }
                }
            }
        }

        let decade_boost = match &record.decade {
            Some(decade)
                if features.labels_joined.contains(decade.as_str())
                    || post.post_decade.as_deref() == Some(decade.as_str()) =>
            {
                w.decade_match
            }
            _ => 0.0,
        };

        let hits = record.tags.intersection(&features.labels).count();
        let label_boost = if hits > 0 {
            (w.label_base + w.label_per_hit * hits as f64).min(w.label_cap)
        } else {
            0.0
        };

        let part_bonus = match (record.part, post.part) {
            (Some(a), Some(b)) if a == b => w.part_match,
            _ => 0.0,
        };

        let total = w.title_jaccard * jaccard
            + w.title_fuzzy * fuzzy
            + date_boost
            + decade_boost
            + label_boost
            + part_bonus;

        PostScore {
            jaccard,
            fuzzy,
            date_boost,
            decade_boost,
            label_boost,
            part_bonus,
            total,
        }
    }

    /// 全候補を評価して最高スコアの投稿を返す（同点は先勝ち）
    pub fn best<'p>(
        &self,
        record: &RecordFeatures,
        posts: &'p [CandidatePost],
        features: &[PostFeatures],
    ) -> Option<(&'p CandidatePost, PostScore)> {
        let mut best: Option<(&CandidatePost, PostScore)> = None;

        for (post, post_features) in posts.iter().zip(features) {
            let score = self.score(record, post, post_features);
            if best.map_or(true, |(_, b)| score.total > b.total) {
                best = Some((post, score));
            }
        }

        best
    }

    /// 上位N件（スコア降順、同点は候補順）
    pub fn ranked<'p>(
        &self,
        record: &RecordFeatures,
        posts: &'p [CandidatePost],
        features: &[PostFeatures],
        limit: usize,
    ) -> Vec<(&'p CandidatePost, PostScore)> {
        let mut scored: Vec<(&CandidatePost, PostScore)> = posts
            .iter()
            .zip(features)
            .map(|(post, f)| (post, self.score(record, post, f)))
            .collect();
        // 安定ソートなので同点は候補順のまま
        scored.sort_by(|a, b| b.1.total.total_cmp(&a.1.total));
        scored.truncate(limit);
        scored
    }
}
