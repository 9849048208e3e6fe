//! Photo Merge Common Library
//!
//! ローカル写真インデックスとWeb投稿メタデータを照合する共通エンジン

pub mod types;
pub mod error;
pub mod text;
pub mod synonyms;
pub mod weights;
pub mod aggregate;
pub mod overrides;
pub mod post_matcher;
pub mod image_matcher;
pub mod merge;

pub use types::{
    CandidateImage, CandidatePost, LocalRecord, MatchOutcome, MatchStatus, MatchedPost,
    MergedRecord, OverrideEntry, RecordId, RemoteImageRecord, ReviewRow,
};
pub use error::{Error, Result};
pub use synonyms::SynonymTable;
pub use weights::{ScoringWeights, Thresholds};
pub use aggregate::{aggregate_posts, Aggregation};
pub use overrides::{OverrideRow, OverrideTable};
pub use post_matcher::{PostMatcher, PostScore, RecordFeatures};
pub use image_matcher::{guess_position, ImageMatcher};
pub use merge::{MatchEngine, MergeOutput, MergeSummary, Resolution};
