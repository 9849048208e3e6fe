//! スコアリングの重みと採用閾値
//!
//! 重みは手調整の固定値。学習はしない。

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// 投稿・画像スコアの重み
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringWeights {
    // 投稿スコア
    pub title_jaccard: f64,
    pub title_fuzzy: f64,
    pub year_match: f64,
    pub month_match: f64,
    pub decade_match: f64,
    pub label_base: f64,
    pub label_per_hit: f64,
    pub label_cap: f64,
    pub part_match: f64,

    // 画像スコア
    pub position_exact: f64,
    pub position_near: f64,
    pub position_decay: f64,
    pub filename_base: f64,
    pub filename_per_hit: f64,
    pub filename_cap: f64,
    pub original_size: f64,
    pub max_size_query: f64,

    // 最終信頼度
    pub confidence_post: f64,
    pub confidence_image: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            title_jaccard: 0.45,
            title_fuzzy: 0.35,
            year_match: 0.10,
            month_match: 0.05,
            decade_match: 0.06,
            label_base: 0.10,
            label_per_hit: 0.03,
            label_cap: 0.20,
            part_match: 0.10,

            position_exact: 0.58,
            position_near: 0.46,
            position_decay: 0.09,
            filename_base: 0.18,
            filename_per_hit: 0.10,
            filename_cap: 0.36,
            original_size: 0.2,
            max_size_query: 0.2,

            confidence_post: 0.65,
            confidence_image: 0.35,
        }
    }
}

/// 採用閾値
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub post: f64,
    pub image: f64,
}

impl Thresholds {
    pub const DEFAULT_POST: f64 = 0.50;
    pub const DEFAULT_IMAGE: f64 = 0.32;

    /// 上限（投稿スコアは理論上 1.3 前後まで）
    const MAX: f64 = 2.0;

    pub fn new(post: f64, image: f64) -> Result<Self> {
        let thresholds = Self { post, image };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("post", self.post), ("image", self.image)] {
            if !value.is_finite() || !(0.0..=Self::MAX).contains(&value) {
                return Err(Error::Config(format!(
                    "{} threshold must be within 0.0..={}: {}",
                    name,
                    Self::MAX,
                    value
                )));
            }
        }
        Ok(())
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            post: Self::DEFAULT_POST,
            image: Self::DEFAULT_IMAGE,
        }
    }
}
