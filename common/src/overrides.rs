//! オーバーライド表
//!
//! (フォルダ, タイトル) → (投稿URL, 画像位置) の手書き対応表。
//! キーは空白正規化のみで完全一致させる（あいまい一致はしない）。

use crate::aggregate::normalize_post_url;
use crate::text;
use crate::types::OverrideEntry;
use serde::Deserialize;
use std::collections::HashMap;

/// CSVの1行（`folder,title,post_url,image_pos`）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OverrideRow {
    pub folder: String,
    pub title: String,
    pub post_url: String,
    pub image_pos: Option<String>,
}

/// オーバーライド表（読み取り専用）
#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
    entries: HashMap<(String, String), OverrideEntry>,
}

impl OverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 行から表を作る（同じキーは後の行が優先）
    ///
    /// post_url が空の行は無視し、解釈できない image_pos は未指定として扱う。
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = OverrideRow>,
    {
        let mut table = Self::new();
        for row in rows {
            let post_url = text::normalize(&row.post_url);
            if post_url.is_empty() {
                continue;
            }
            let image_pos = row.image_pos.as_deref().and_then(|raw| parse_position(raw, &row));
            table.insert(&row.folder, &row.title, OverrideEntry {
                post_url: normalize_post_url(&post_url),
                image_pos,
            });
        }
        table
    }

    pub fn insert(&mut self, folder: &str, title: &str, entry: OverrideEntry) {
        self.entries.insert(key(folder, title), entry);
    }

    pub fn lookup(&self, folder: &str, title: &str) -> Option<&OverrideEntry> {
        self.entries.get(&key(folder, title))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn key(folder: &str, title: &str) -> (String, String) {
    (text::normalize(folder), text::normalize(title))
}

/// 画像位置を解釈（空・0・不正値は None）
fn parse_position(raw: &str, row: &OverrideRow) -> Option<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<u32>() {
        Ok(0) => None,
        Ok(pos) => Some(pos),
        Err(_) => {
            log::warn!(
                "ignoring malformed image_pos {:?} in override for ({:?}, {:?})",
                raw,
                row.folder,
                row.title
            );
            None
        }
    }
}
