//! 投稿内の画像照合
//!
//! 確定した投稿の中から、ローカルレコードに対応する画像を1枚選ぶ。

use crate::text;
use crate::types::{CandidateImage, LocalRecord};
use crate::weights::ScoringWeights;
use std::collections::BTreeSet;
use url::Url;

/// 画像照合器
#[derive(Debug, Clone, Copy)]
pub struct ImageMatcher<'a> {
    weights: &'a ScoringWeights,
}

/// 推定位置（オーバーライド指定 → 元ファイル名の番号の順）
pub fn guess_position(record: &LocalRecord, forced: Option<u32>) -> Option<u32> {
    forced
        .filter(|&p| p > 0)
        .or_else(|| {
            record
                .orig_filename
                .as_deref()
                .and_then(text::number_from_orig_filename)
        })
        .filter(|&p| p > 0)
}

/// 画像URLのパス部分から得たトークン
fn image_url_tokens(url: &str) -> BTreeSet<String> {
    match Url::parse(url) {
        Ok(parsed) => text::filename_tokens(parsed.path()),
        Err(_) => text::filename_tokens(url),
    }
}

impl<'a> ImageMatcher<'a> {
    pub fn new(weights: &'a ScoringWeights) -> Self {
        Self { weights }
    }

    /// 1枚の画像に対するスコア
    pub fn score(&self, record: &LocalRecord, image: &CandidateImage, guessed: Option<u32>) -> f64 {
        let w = self.weights;
        let mut score = 0.0;

        // 位置
        if let (Some(pos), Some(guess)) = (image.position, guessed) {
            if pos == guess {
                score += w.position_exact;
            } else {
                let distance = (i64::from(pos) - i64::from(guess)).abs() as f64;
                score += (w.position_near - w.position_decay * distance).max(0.0);
            }
        }

        // ファイル名トークンの重複
        let local_tokens = text::filename_tokens(&record.file);
        let image_tokens = image_url_tokens(&image.url);
        let hits = local_tokens.intersection(&image_tokens).count();
        if hits > 0 {
            score += (w.filename_base + w.filename_per_hit * hits as f64).min(w.filename_cap);
        }

        // 原寸画像を優先
        if image.url.contains("/s0/") {
            score += w.original_size;
        }
        if image.url.contains("imgmax=0") {
            score += w.max_size_query;
        }

        score
    }

    /// 最高スコアの画像（同点は投稿内の並び順で先勝ち）
    pub fn best<'p>(
        &self,
        record: &LocalRecord,
        images: &'p [CandidateImage],
        guessed: Option<u32>,
    ) -> Option<(&'p CandidateImage, f64)> {
        let mut best: Option<(&CandidateImage, f64)> = None;

        for image in images {
            let score = self.score(record, image, guessed);
            if best.map_or(true, |(_, b)| score > b) {
                best = Some((image, score));
            }
        }

        best
    }
}
