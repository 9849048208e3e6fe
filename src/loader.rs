//! 入力ファイルの読み込み
//!
//! - ローカルインデックス（JSON配列）
//! - Web投稿の画像メタデータ（JSON配列）
//! - オーバーライド表（CSV: folder,title,post_url,image_pos）
//! - 追加の同義語（JSONオブジェクト）

use crate::error::{PhotoMergeError, Result};
use photo_merge_common::{
    LocalRecord, MergedRecord, OverrideRow, OverrideTable, RemoteImageRecord, SynonymTable,
};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// オーバーライドCSVの必須列
const OVERRIDE_COLUMNS: &[&str] = &["folder", "title", "post_url"];

fn ensure_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(PhotoMergeError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn read_json_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    ensure_exists(path)?;
    let reader = BufReader::new(File::open(path)?);
    let records: Vec<T> = serde_json::from_reader(reader)?;
    Ok(records)
}

/// ローカルインデックスを読み込む
pub fn load_index(path: &Path) -> Result<Vec<LocalRecord>> {
    read_json_array(path)
}

/// 画像メタデータを読み込む
pub fn load_meta(path: &Path) -> Result<Vec<RemoteImageRecord>> {
    read_json_array(path)
}

/// 統合済みJSONを読み込む
pub fn load_merged(path: &Path) -> Result<Vec<MergedRecord>> {
    read_json_array(path)
}

/// オーバーライドCSVを読み込む
///
/// image_pos が不正な行や末尾の列が欠けた行は位置なしとして取り込む（不正値は警告のみ）。
pub fn load_overrides(path: &Path) -> Result<OverrideTable> {
    ensure_exists(path)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    for column in OVERRIDE_COLUMNS {
        if !headers.iter().any(|h| h == *column) {
            return Err(PhotoMergeError::InvalidInput(format!(
                "{}: 列 '{}' がありません",
                path.display(),
                column
            )));
        }
    }

    let rows = reader
        .deserialize::<OverrideRow>()
        .collect::<std::result::Result<Vec<_>, csv::Error>>()?;

    Ok(OverrideTable::from_rows(rows))
}

/// 同義語テーブルを構築（組み込み + 追加ファイル）
pub fn load_synonyms(path: Option<&Path>) -> Result<SynonymTable> {
    let mut table = SynonymTable::builtin();

    if let Some(path) = path {
        ensure_exists(path)?;
        let content = std::fs::read_to_string(path)?;
        let custom = SynonymTable::from_json(&content)?;
        log::info!("loaded {} custom synonyms from {}", custom.len(), path.display());
        table.merge(&custom);
    }

    Ok(table)
}
