//! 照合・統合の結合テスト
//!
//! 一時ディレクトリに入力ファイルを作り、読み込みから出力までを通して検証

use photo_merge::export::{self, OutputPaths};
use photo_merge::{loader, runner};
use photo_merge_common::{MatchStatus, MergeOutput, SynonymTable, Thresholds};
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const GHATS_URL: &str = "https://www.oldindianphotos.in/1911/03/varanasi-ghats-1911.html";
const DURBAR_URL: &str = "https://www.oldindianphotos.in/2012/05/delhi-durbar-1903.html";
const GHAT_POS3: &str = "https://1.bp.blogspot.com/-a/ghat-view-3.jpg";
const GHAT_POS7: &str = "https://1.bp.blogspot.com/-b/benaras-ghats.jpg";
const DURBAR_IMG: &str = "https://2.bp.blogspot.com/-c/durbar.jpg";

const META_JSON: &str = r#"[
  {"post_url": "https://www.oldindianphotos.in/1911/03/varanasi-ghats-1911.html?m=1",
   "post_title": "Varanasi Ghats 1911", "post_date": "1911-03-05",
   "labels": ["1910s", "Varanasi"], "source": "Library", "description": "",
   "image_url": "https://1.bp.blogspot.com/-b/benaras-ghats.jpg", "position_in_post": 7},
  {"post_url": "https://www.oldindianphotos.in/1911/03/varanasi-ghats-1911.html",
   "post_title": null, "labels": null,
   "image_url": "https://1.bp.blogspot.com/-a/ghat-view-3.jpg", "position_in_post": 3},
  {"post_url": "https://www.oldindianphotos.in/2012/05/delhi-durbar-1903.html",
   "post_title": "Delhi Durbar 1903", "labels": ["1900s"],
   "image_url": "https://2.bp.blogspot.com/-c/durbar.jpg", "position_in_post": 1},
  {"post_url": "https://www.oldindianphotos.in/2012/05/delhi-durbar-1903.html",
   "image_url": "https://www.oldindianphotos.in/feeds/posts/default", "position_in_post": 2}
]"#;

const INDEX_JSON: &str = r#"[
  {"id": 1, "folder": "1911-03-01 Benaras Ghats", "title": "Benaras Ghats",
   "orig_filename": "Benaras Ghats 03.jpg", "file": "images/benaras-ghats-03.jpg",
   "tags": ["benaras"], "date": "1911-03-01", "thumb": "thumbs/1.jpg"},
  {"id": 2, "folder": "Kodaikanal Lake", "title": "Kodaikanal Lake",
   "file": "images/kodaikanal-lake.jpg", "tags": []},
  {"id": 3, "folder": "Folder A", "title": "Title A", "file": "images/a.jpg"},
  {"id": "m-4", "folder": "Madras Harbour", "title": "Madras Harbour", "file": "images/harbour.jpg"},
  {"id": 5, "folder": "1911-03-01 Benaras Ghats", "title": "Benaras Ghats",
   "orig_filename": "Benaras Ghats 03.jpg", "file": "images/benaras-ghats-03b.jpg",
   "date": "1911-03-01"}
]"#;

const OVERRIDES_CSV: &str = "folder,title,post_url,image_pos
Folder A,Title A,https://www.oldindianphotos.in/2000/01/missing.html,
Madras Harbour,Madras Harbour,https://www.oldindianphotos.in/2012/05/delhi-durbar-1903.html#c1,1
";

struct Fixture {
    dir: TempDir,
    index: PathBuf,
    meta: PathBuf,
    overrides: PathBuf,
}

fn fixture() -> Fixture {
    let dir = tempdir().expect("Failed to create temp dir");
    let index = dir.path().join("index.json");
    let meta = dir.path().join("meta.json");
    let overrides = dir.path().join("overrides.csv");
    std::fs::write(&index, INDEX_JSON).unwrap();
    std::fs::write(&meta, META_JSON).unwrap();
    std::fs::write(&overrides, OVERRIDES_CSV).unwrap();
    Fixture { dir, index, meta, overrides }
}

fn run(fx: &Fixture, thresholds: Thresholds, jobs: Option<usize>) -> MergeOutput {
    let records = loader::load_index(&fx.index).unwrap();
    let engine = runner::build_engine(
        &fx.meta,
        Some(&fx.overrides),
        SynonymTable::builtin(),
        thresholds,
    )
    .unwrap();
    let options = runner::RunOptions { jobs, progress: false };
    runner::run_merge(&engine, &records, options).unwrap()
}

fn output_paths(dir: &Path) -> OutputPaths {
    OutputPaths {
        merged: dir.join("site/index/index.merged.json"),
        review: dir.join("merge_review.csv"),
        report: dir.join("merge_report.txt"),
    }
}

/// 同義語・日付・年代で投稿が決まり、位置一致の画像が選ばれる
#[test]
fn test_synonym_and_date_match() {
    let fx = fixture();
    let output = run(&fx, Thresholds::default(), Some(1));

    let record = &output.merged[0];
    assert_eq!(record.match_status, MatchStatus::Matched);
    assert_eq!(record.post_url.as_deref(), Some(GHATS_URL));
    assert_eq!(record.post_title.as_deref(), Some("Varanasi Ghats 1911"));
    assert_eq!(record.image_url.as_deref(), Some(GHAT_POS3));
    assert_eq!(record.post_source.as_deref(), Some("Library"));
    assert!(record.match_confidence > 0.5 && record.match_confidence <= 1.0);
    // 未知のフィールドは保持される
    assert_eq!(
        record.local.extra.get("thumb").and_then(|v| v.as_str()),
        Some("thumbs/1.jpg")
    );
}

/// 候補がないレコードは投稿未確定としてレビューに回る
#[test]
fn test_post_low_confidence() {
    let fx = fixture();
    let output = run(&fx, Thresholds::default(), Some(1));

    let record = &output.merged[1];
    assert_eq!(record.match_status, MatchStatus::PostLowConfidence);
    assert_eq!(record.image_url, None);
    assert_eq!(record.post_url, None);
    assert!(record.match_confidence < 0.5);

    let row = output.review.iter().find(|r| r.id == "2").expect("レビュー行がない");
    assert_eq!(row.reason, MatchStatus::PostLowConfidence);
    assert!(row.post_score.is_some());
}

/// オーバーライド先の投稿がない場合
#[test]
fn test_override_post_not_found() {
    let fx = fixture();
    let output = run(&fx, Thresholds::default(), Some(1));

    let record = &output.merged[2];
    assert_eq!(record.match_status, MatchStatus::OverridePostNotFound);
    assert_eq!(record.match_confidence, 0.0);
    assert_eq!(
        record.post_url.as_deref(),
        Some("https://www.oldindianphotos.in/2000/01/missing.html")
    );
    assert_eq!(record.image_url, None);
    assert!(output.review.iter().any(|r| r.id == "3"));
}

/// オーバーライドはスコア照合より優先される
#[test]
fn test_override_forced() {
    let fx = fixture();
    let output = run(&fx, Thresholds::default(), Some(1));

    let record = &output.merged[3];
    assert_eq!(record.match_status, MatchStatus::OverrideForced);
    assert_eq!(record.post_url.as_deref(), Some(DURBAR_URL));
    assert_eq!(record.image_url.as_deref(), Some(DURBAR_IMG));
    assert_eq!(record.match_confidence, 1.0);
    assert!(!output.review.iter().any(|r| r.id == "m-4"));
}

/// 位置一致はファイル名の重複より強い
#[test]
fn test_position_beats_filename_overlap() {
    let fx = fixture();
    let output = run(&fx, Thresholds::default(), Some(1));

    assert_eq!(output.merged[0].image_url.as_deref(), Some(GHAT_POS3));
    assert_ne!(output.merged[0].image_url.as_deref(), Some(GHAT_POS7));
}

/// 既知の制約: 同じ画像が複数レコードに割り当たることがある
#[test]
fn test_same_image_for_two_records() {
    let fx = fixture();
    let output = run(&fx, Thresholds::default(), Some(1));

    assert_eq!(output.merged[0].image_url, output.merged[4].image_url);
    assert_eq!(output.merged[4].match_status, MatchStatus::Matched);
}

/// 集計とノイズ除外
#[test]
fn test_summary() {
    let fx = fixture();
    let output = run(&fx, Thresholds::default(), Some(1));
    let summary = &output.summary;

    assert_eq!(summary.index_rows, 5);
    assert_eq!(summary.posts_discovered, 2);
    assert_eq!(summary.images_kept, 3);
    assert_eq!(summary.images_dropped, 1);
    assert_eq!(summary.matched, 3);
    assert_eq!(summary.needs_review, 2);
    assert_eq!(summary.matched + summary.needs_review, summary.index_rows);
    assert_eq!(output.review.len(), summary.needs_review);
}

/// 全レコードが入力順のまま出力される
#[test]
fn test_every_record_is_emitted() {
    let fx = fixture();
    for (post, image) in [(0.0, 0.0), (0.5, 0.32), (0.9, 0.5), (1.5, 1.5)] {
        let output = run(&fx, Thresholds::new(post, image).unwrap(), Some(1));
        assert_eq!(output.merged.len(), 5);
        let ids: Vec<String> = output.merged.iter().map(|r| r.local.id.to_string()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "m-4", "5"]);
    }
}

/// 閾値を上げても一致数は増えない
#[test]
fn test_threshold_monotonic() {
    let fx = fixture();
    let mut previous = usize::MAX;
    for post in [0.0, 0.3, 0.5, 0.7, 0.9, 1.2, 2.0] {
        let output = run(&fx, Thresholds::new(post, 0.32).unwrap(), Some(1));
        assert!(output.summary.matched <= previous, "threshold {}", post);
        previous = output.summary.matched;
    }
    // オーバーライドだけは閾値に関係なく残る
    assert_eq!(previous, 1);
}

/// 並列実行でも逐次と同じ結果
#[test]
fn test_parallel_matches_sequential() {
    let fx = fixture();
    let sequential = run(&fx, Thresholds::default(), Some(1));
    let parallel = run(&fx, Thresholds::default(), Some(4));
    let pooled = run(&fx, Thresholds::default(), None);

    let json = |o: &MergeOutput| serde_json::to_string(&o.merged).unwrap();
    assert_eq!(json(&sequential), json(&parallel));
    assert_eq!(json(&sequential), json(&pooled));
    assert_eq!(sequential.review, parallel.review);
}

/// 同じ入力からは同じファイルが出力される
#[test]
fn test_outputs_are_deterministic() {
    let fx = fixture();
    let first = output_paths(&fx.dir.path().join("run1"));
    let second = output_paths(&fx.dir.path().join("run2"));

    export::export_outputs(&run(&fx, Thresholds::default(), None), &first).unwrap();
    export::export_outputs(&run(&fx, Thresholds::default(), Some(2)), &second).unwrap();

    for (a, b) in [
        (&first.merged, &second.merged),
        (&first.review, &second.review),
        (&first.report, &second.report),
    ] {
        assert_eq!(std::fs::read(a).unwrap(), std::fs::read(b).unwrap());
    }
}

/// 統合結果を読み戻せる
#[test]
fn test_merged_json_round_trip() {
    let fx = fixture();
    let paths = output_paths(fx.dir.path());
    export::export_outputs(&run(&fx, Thresholds::default(), Some(1)), &paths).unwrap();

    let merged = loader::load_merged(&paths.merged).unwrap();
    assert_eq!(merged.len(), 5);
    assert_eq!(merged[3].match_status, MatchStatus::OverrideForced);

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&paths.merged).unwrap()).unwrap();
    let first = &raw[0];
    assert_eq!(first["match_status"], "matched");
    assert_eq!(first["thumb"], "thumbs/1.jpg");
    assert!(raw[1]["image_url"].is_null());
}

/// 前回の統合結果を入力にしても各キーは1回だけ出力され、値は新しい結果になる
#[test]
fn test_remerge_previous_output() {
    let fx = fixture();
    let first = output_paths(&fx.dir.path().join("run1"));
    export::export_outputs(&run(&fx, Thresholds::default(), Some(1)), &first).unwrap();

    // 前回の出力をインデックスとして読み直す
    let records = loader::load_index(&first.merged).unwrap();
    let engine = runner::build_engine(
        &fx.meta,
        None,
        SynonymTable::builtin(),
        Thresholds::default(),
    )
    .unwrap();
    let options = runner::RunOptions { jobs: Some(1), progress: false };
    let output = runner::run_merge(&engine, &records, options).unwrap();

    let second = output_paths(&fx.dir.path().join("run2"));
    export::export_outputs(&output, &second).unwrap();
    let text = std::fs::read_to_string(&second.merged).unwrap();

    for key in ["\"post_url\"", "\"match_confidence\"", "\"match_status\"", "\"image_url\""] {
        assert_eq!(text.matches(key).count(), 5, "{}", key);
    }

    // オーバーライドなしなので Folder A は投稿未確定になる
    let raw: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(raw[2]["match_status"], "post_low_confidence");
    assert!(raw[2]["post_url"].is_null());
    assert_eq!(raw[0]["thumb"], "thumbs/1.jpg");
}
