//! 照合の入出力型定義
//!
//! - LocalRecord: ローカル写真インデックスの1行
//! - RemoteImageRecord: Web投稿から収集した画像メタデータの1行
//! - CandidatePost / CandidateImage: 投稿単位に集約した照合候補
//! - MergedRecord / ReviewRow: 統合結果とレビュー行

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// `null` をデフォルト値として読む
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// レコードID（数値・文字列のどちらも受け付ける）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl Default for RecordId {
    fn default() -> Self {
        RecordId::Text(String::new())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// ローカル写真インデックスのレコード
///
/// 未知のフィールド（`thumb` 等）は `extra` に保持し、統合結果へそのまま書き戻す。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalRecord {
    #[serde(default)]
    pub id: RecordId,

    #[serde(default, deserialize_with = "null_as_default")]
    pub folder: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    /// 元ファイル名（例: `Benaras Ghats 07.jpg`）
    #[serde(default)]
    pub orig_filename: Option<String>,

    /// サイト内の相対パス
    #[serde(default, deserialize_with = "null_as_default")]
    pub file: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,

    /// `YYYY-MM-DD`
    #[serde(default)]
    pub date: Option<String>,

    #[serde(default)]
    pub year: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Web投稿から収集した画像1枚分のメタデータ
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteImageRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub post_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub post_title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub post_date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub labels: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub image_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub alt: String,
    #[serde(deserialize_with = "null_as_default")]
    pub caption: String,
    /// 投稿内の位置（0・欠損は不明扱い）
    pub position_in_post: Option<i64>,
}

/// 投稿内の画像
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateImage {
    pub url: String,
    pub alt: String,
    pub caption: String,
    /// 1始まりの位置。不明なら None
    pub position: Option<u32>,
}

/// 照合候補となる投稿（post_url 単位に集約済み）
#[derive(Debug, Clone)]
pub struct CandidatePost {
    pub post_url: String,
    pub post_title: String,
    pub post_slug: String,
    pub post_date: String,
    pub post_year: Option<String>,
    pub post_month: Option<String>,
    pub post_decade: Option<String>,
    /// 同義語変換済みラベル
    pub labels: Vec<String>,
    pub source: String,
    pub description: String,
    /// (位置昇順, 位置不明は末尾, URL) でソート済み
    pub images: Vec<CandidateImage>,
    pub part: Option<u32>,
}

/// オーバーライド（強制対応付け）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideEntry {
    pub post_url: String,
    pub image_pos: Option<u32>,
}

/// 照合結果の分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Matched,
    OverrideForced,
    PostLowConfidence,
    ImageLowConfidence,
    OverridePostNotFound,
    OverrideImageMissing,
}

impl MatchStatus {
    pub const ALL: [MatchStatus; 6] = [
        MatchStatus::Matched,
        MatchStatus::OverrideForced,
        MatchStatus::PostLowConfidence,
        MatchStatus::ImageLowConfidence,
        MatchStatus::OverridePostNotFound,
        MatchStatus::OverrideImageMissing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Matched => "matched",
            MatchStatus::OverrideForced => "override_forced",
            MatchStatus::PostLowConfidence => "post_low_confidence",
            MatchStatus::ImageLowConfidence => "image_low_confidence",
            MatchStatus::OverridePostNotFound => "override_post_not_found",
            MatchStatus::OverrideImageMissing => "override_image_missing",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 照合先の投稿メタデータ
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPost {
    pub post_url: String,
    pub post_title: String,
    pub labels: Vec<String>,
    pub source: String,
    pub description: String,
}

impl From<&CandidatePost> for MatchedPost {
    fn from(post: &CandidatePost) -> Self {
        Self {
            post_url: post.post_url.clone(),
            post_title: post.post_title.clone(),
            labels: post.labels.clone(),
            source: post.source.clone(),
            description: post.description.clone(),
        }
    }
}

/// 1レコード分の照合結果
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// 投稿・画像とも閾値を超えた
    Matched {
        post: MatchedPost,
        image_url: String,
        post_score: f64,
        image_score: f64,
        confidence: f64,
    },
    /// オーバーライドで投稿と画像を確定
    OverrideForced { post: MatchedPost, image_url: String },
    /// オーバーライド先の投稿はあるが画像を選べない
    OverrideImageMissing { post: MatchedPost },
    /// オーバーライド先の投稿が候補に存在しない
    OverridePostNotFound { post_url: String },
    /// 最良投稿のスコアが閾値未満
    PostLowConfidence {
        post_score: f64,
        suggestion: Option<MatchedPost>,
    },
    /// 投稿は確定したが画像スコアが閾値未満
    ImageLowConfidence {
        post: MatchedPost,
        post_score: f64,
        image_score: Option<f64>,
    },
}

impl MatchOutcome {
    pub fn status(&self) -> MatchStatus {
        match self {
            MatchOutcome::Matched { .. } => MatchStatus::Matched,
            MatchOutcome::OverrideForced { .. } => MatchStatus::OverrideForced,
            MatchOutcome::OverrideImageMissing { .. } => MatchStatus::OverrideImageMissing,
            MatchOutcome::OverridePostNotFound { .. } => MatchStatus::OverridePostNotFound,
            MatchOutcome::PostLowConfidence { .. } => MatchStatus::PostLowConfidence,
            MatchOutcome::ImageLowConfidence { .. } => MatchStatus::ImageLowConfidence,
        }
    }

    /// 画像まで解決できたか（matched カウンタの対象）
    pub fn is_resolved(&self) -> bool {
        matches!(
            self,
            MatchOutcome::Matched { .. } | MatchOutcome::OverrideForced { .. }
        )
    }

    /// 信頼度
    ///
    /// 投稿段階で棄却された場合は生の投稿スコアをそのまま返す（[0,1] にクランプしない）。
    pub fn confidence(&self) -> f64 {
        match self {
            MatchOutcome::Matched { confidence, .. } => *confidence,
            MatchOutcome::OverrideForced { .. } => 1.0,
            MatchOutcome::OverrideImageMissing { .. } => 0.8,
            MatchOutcome::OverridePostNotFound { .. } => 0.0,
            MatchOutcome::PostLowConfidence { post_score, .. } => round4(*post_score),
            MatchOutcome::ImageLowConfidence { post_score, .. } => round4(*post_score),
        }
    }

    /// 統合結果に書き出す投稿（提案のみの場合は None）
    pub fn post(&self) -> Option<&MatchedPost> {
        match self {
            MatchOutcome::Matched { post, .. }
            | MatchOutcome::OverrideForced { post, .. }
            | MatchOutcome::OverrideImageMissing { post }
            | MatchOutcome::ImageLowConfidence { post, .. } => Some(post),
            MatchOutcome::OverridePostNotFound { .. } | MatchOutcome::PostLowConfidence { .. } => {
                None
            }
        }
    }

    pub fn image_url(&self) -> Option<&str> {
        match self {
            MatchOutcome::Matched { image_url, .. }
            | MatchOutcome::OverrideForced { image_url, .. } => Some(image_url),
            _ => None,
        }
    }

    /// レビュー行を作る。完全に解決したレコードは None
    pub fn review_row(&self, record: &LocalRecord) -> Option<ReviewRow> {
        let mut row = ReviewRow {
            id: record.id.to_string(),
            folder: record.folder.clone(),
            title: record.title.clone(),
            date: record.date.clone().unwrap_or_default(),
            reason: self.status(),
            post_score: None,
            img_score: None,
            post_title_suggested: None,
            post_url_suggested: None,
        };

        match self {
            MatchOutcome::Matched { .. } | MatchOutcome::OverrideForced { .. } => return None,
            MatchOutcome::OverrideImageMissing { post } => {
                row.post_url_suggested = Some(post.post_url.clone());
            }
            MatchOutcome::OverridePostNotFound { post_url } => {
                row.post_url_suggested = Some(post_url.clone());
            }
            MatchOutcome::PostLowConfidence { post_score, suggestion } => {
                row.post_score = Some(*post_score);
                row.post_title_suggested =
                    Some(suggestion.as_ref().map(|p| p.post_title.clone()).unwrap_or_default());
                row.post_url_suggested =
                    Some(suggestion.as_ref().map(|p| p.post_url.clone()).unwrap_or_default());
            }
            MatchOutcome::ImageLowConfidence { post, post_score, image_score } => {
                row.post_score = Some(*post_score);
                row.img_score = *image_score;
                row.post_title_suggested = Some(post.post_title.clone());
                row.post_url_suggested = Some(post.post_url.clone());
            }
        }

        Some(row)
    }
}

/// 統合結果が書き込むフィールド名（入力側の同名フィールドは捨てる）
const OUTPUT_FIELDS: &[&str] = &[
    "match_status",
    "image_url",
    "post_url",
    "post_title",
    "post_labels",
    "post_source",
    "post_description",
    "match_confidence",
];

/// 統合済みレコード（LocalRecord + 照合結果）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedRecord {
    #[serde(flatten)]
    pub local: LocalRecord,
    pub match_status: MatchStatus,
    pub image_url: Option<String>,
    pub post_url: Option<String>,
    pub post_title: Option<String>,
    pub post_labels: Option<Vec<String>>,
    pub post_source: Option<String>,
    pub post_description: Option<String>,
    pub match_confidence: f64,
}

impl MergedRecord {
    pub fn new(mut local: LocalRecord, outcome: &MatchOutcome) -> Self {
        // 前回の統合結果を入力にした場合も各キーは1回だけ出力する
        for field in OUTPUT_FIELDS {
            local.extra.remove(*field);
        }

        let post = outcome.post();
        // 見つからなかったオーバーライド先もURLだけは残す
        let post_url = match outcome {
            MatchOutcome::OverridePostNotFound { post_url } => Some(post_url.clone()),
            _ => post.map(|p| p.post_url.clone()),
        };

        Self {
            local,
            match_status: outcome.status(),
            image_url: outcome.image_url().map(str::to_string),
            post_url,
            post_title: post.map(|p| p.post_title.clone()),
            post_labels: post.map(|p| p.labels.clone()),
            post_source: post.map(|p| p.source.clone()),
            post_description: post.map(|p| p.description.clone()),
            match_confidence: outcome.confidence(),
        }
    }
}

/// 手動レビュー用の行
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRow {
    pub id: String,
    pub folder: String,
    pub title: String,
    pub date: String,
    pub reason: MatchStatus,
    pub post_score: Option<f64>,
    pub img_score: Option<f64>,
    pub post_title_suggested: Option<String>,
    pub post_url_suggested: Option<String>,
}

/// 小数第4位で丸める
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post() -> MatchedPost {
        MatchedPost {
            post_url: "https://example.com/1911/03/ghats.html".to_string(),
            post_title: "Varanasi Ghats 1911".to_string(),
            labels: vec!["1910s".to_string()],
            source: String::new(),
            description: String::new(),
        }
    }

    #[test]
    fn test_local_record_null_fields() {
        let json = r#"{"id": 7, "folder": "A", "title": null, "tags": null, "thumb": "thumbs/a.jpg"}"#;
        let record: LocalRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, RecordId::Number(7));
        assert_eq!(record.title, "");
        assert!(record.tags.is_empty());
        assert_eq!(record.extra.get("thumb").and_then(|v| v.as_str()), Some("thumbs/a.jpg"));
    }

    #[test]
    fn test_remote_record_missing_position() {
        let json = r#"{"post_url": "u", "image_url": "i", "labels": null, "position_in_post": null}"#;
        let record: RemoteImageRecord = serde_json::from_str(json).unwrap();
        assert!(record.labels.is_empty());
        assert_eq!(record.position_in_post, None);
    }

    #[test]
    fn test_post_low_confidence_is_not_clamped() {
        let outcome = MatchOutcome::PostLowConfidence {
            post_score: 0.123456,
            suggestion: None,
        };
        assert_eq!(outcome.confidence(), 0.1235);
        assert!(!outcome.is_resolved());
    }

    #[test]
    fn test_review_row_absent_for_matched() {
        let outcome = MatchOutcome::OverrideForced {
            post: sample_post(),
            image_url: "https://example.com/a.jpg".to_string(),
        };
        assert!(outcome.review_row(&LocalRecord::default()).is_none());
        assert_eq!(outcome.confidence(), 1.0);
    }

    #[test]
    fn test_merged_record_keeps_extra_fields() {
        let json = r#"{"id": "x1", "folder": "F", "title": "T", "thumb": "thumbs/x.jpg"}"#;
        let local: LocalRecord = serde_json::from_str(json).unwrap();
        let outcome = MatchOutcome::OverridePostNotFound {
            post_url: "https://example.com/missing.html".to_string(),
        };
        let merged = MergedRecord::new(local, &outcome);
        let value = serde_json::to_value(&merged).unwrap();

        assert_eq!(value["thumb"], "thumbs/x.jpg");
        assert_eq!(value["match_status"], "override_post_not_found");
        assert_eq!(value["post_url"], "https://example.com/missing.html");
        assert!(value["image_url"].is_null());
        assert_eq!(value["match_confidence"], 0.0);
    }

    #[test]
    fn test_previous_merge_fields_are_replaced() {
        let json = r#"{"id": 3, "folder": "F", "title": "T", "thumb": "thumbs/3.jpg",
            "post_url": "https://old.example/p.html", "match_confidence": 0.9,
            "image_url": "https://old.example/p.jpg", "match_status": "matched"}"#;
        let local: LocalRecord = serde_json::from_str(json).unwrap();
        let outcome = MatchOutcome::PostLowConfidence {
            post_score: 0.1037,
            suggestion: None,
        };
        let merged = MergedRecord::new(local, &outcome);
        assert_eq!(merged.local.extra.len(), 1);

        let text = serde_json::to_string(&merged).unwrap();
        for key in ["\"post_url\"", "\"match_confidence\"", "\"image_url\"", "\"match_status\""] {
            assert_eq!(text.matches(key).count(), 1, "{} emitted more than once", key);
        }

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(value["post_url"].is_null());
        assert_eq!(value["match_confidence"], 0.1037);
        assert_eq!(value["match_status"], "post_low_confidence");
        assert_eq!(value["thumb"], "thumbs/3.jpg");
    }
}
