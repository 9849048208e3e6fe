//! 投稿単位への集約
//!
//! 画像単位のメタデータを post_url ごとにまとめ、照合候補（CandidatePost）を作る。
//! 画像ホスト・拡張子の許可リストに合わない行はノイズとして黙って除外する。

use crate::synonyms::SynonymTable;
use crate::text;
use crate::types::{CandidateImage, CandidatePost, RemoteImageRecord};
use regex::Regex;
use std::collections::HashMap;
use url::Url;

lazy_static::lazy_static! {
    static ref IMAGE_URL_EXT_RE: Regex = Regex::new(r"(?i)\.(jpg|jpeg|png|webp|gif)(?:\?|$)").unwrap();
}

/// 既知の画像ホスト
const ALLOWED_HOSTS: &[&str] = &[
    "bp.blogspot.com",
    "1.bp.blogspot.com",
    "2.bp.blogspot.com",
    "3.bp.blogspot.com",
    "4.bp.blogspot.com",
    "blogger.googleusercontent.com",
    "lh3.googleusercontent.com",
    "lh4.googleusercontent.com",
    "lh5.googleusercontent.com",
    "lh6.googleusercontent.com",
    "live.staticflickr.com",
];

/// 集約結果
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// 最初に現れた順の投稿
    pub posts: Vec<CandidatePost>,
    /// 採用した画像行数
    pub images_kept: usize,
    /// ノイズとして除外した行数
    pub images_dropped: usize,
}

/// 許可ホスト上にあるか、画像拡張子で終わるURLか
pub fn is_allowed_image_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }
    if let Ok(parsed) = Url::parse(url) {
        if let Some(host) = parsed.host_str() {
            if ALLOWED_HOSTS.contains(&host) {
                return true;
            }
        }
    }
    IMAGE_URL_EXT_RE.is_match(url)
}

/// 投稿URLを scheme + host + path に正規化（クエリ・フラグメントを除去）
pub fn normalize_post_url(url: &str) -> String {
    let trimmed = text::normalize(url);
    match Url::parse(&trimmed) {
        Ok(mut parsed) if parsed.has_host() => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        }
        _ => trimmed,
    }
}

/// 投稿ごとの途中集計
#[derive(Default)]
struct PostGroup {
    post_url: String,
    post_title: String,
    post_date: String,
    labels: Vec<String>,
    source: String,
    description: String,
    images: Vec<CandidateImage>,
}

impl PostGroup {
    /// 空のフィールドだけを埋める（最初の非空値を採用）
    fn absorb(&mut self, record: &RemoteImageRecord) {
        fill_if_empty(&mut self.post_title, &record.post_title);
        fill_if_empty(&mut self.post_date, &record.post_date);
        fill_if_empty(&mut self.source, &record.source);
        fill_if_empty(&mut self.description, &record.description);
        if self.labels.is_empty() {
            self.labels = record.labels.clone();
        }

        let position = record
            .position_in_post
            .filter(|&p| p > 0)
            .and_then(|p| u32::try_from(p).ok());

        self.images.push(CandidateImage {
            url: record.image_url.clone(),
            alt: record.alt.clone(),
            caption: record.caption.clone(),
            position,
        });
    }

    fn into_candidate(mut self, synonyms: &SynonymTable) -> CandidatePost {
        sort_images(&mut self.images);

        let (mut post_year, mut post_month) = text::year_month_from_post_url(&self.post_url);
        if post_year.is_none() {
            // URLに日付がない投稿は post_date（ISO形式のみ）で補う
            (post_year, post_month) = text::year_month_from_index_date(&self.post_date);
        }
        let post_decade = post_year.as_deref().and_then(text::decade_tag);

        CandidatePost {
            post_slug: text::slugify(&self.post_title, synonyms),
            part: text::extract_part_number(&self.post_title),
            labels: self.labels.iter().map(|l| synonyms.apply(l)).collect(),
            post_url: self.post_url,
            post_title: self.post_title,
            post_date: self.post_date,
            post_year,
            post_month,
            post_decade,
            source: self.source,
            description: self.description,
            images: self.images,
        }
    }
}

fn fill_if_empty(slot: &mut String, value: &str) {
    if slot.is_empty() {
        *slot = text::normalize(value);
    }
}

/// (位置昇順, 位置不明は末尾, URL) で並べる
pub fn sort_images(images: &mut [CandidateImage]) {
    images.sort_by(|a, b| {
        let key_a = a.position.unwrap_or(u32::MAX);
        let key_b = b.position.unwrap_or(u32::MAX);
        key_a.cmp(&key_b).then_with(|| a.url.cmp(&b.url))
    });
}

/// 画像単位のレコードを投稿単位に集約する
pub fn aggregate_posts(records: &[RemoteImageRecord], synonyms: &SynonymTable) -> Aggregation {
    let mut order: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<PostGroup> = Vec::new();
    let mut images_dropped = 0;

    for record in records {
        if !is_allowed_image_url(&record.image_url) {
            images_dropped += 1;
            continue;
        }

        let post_url = normalize_post_url(&record.post_url);
        let idx = *order.entry(post_url.clone()).or_insert_with(|| {
            groups.push(PostGroup {
                post_url,
                ..Default::default()
            });
            groups.len() - 1
        });
        groups[idx].absorb(record);
    }

    let images_kept = records.len() - images_dropped;
    if images_dropped > 0 {
        log::debug!("noise filter dropped {} image rows", images_dropped);
    }

    Aggregation {
        posts: groups
            .into_iter()
            .map(|g| g.into_candidate(synonyms))
            .collect(),
        images_kept,
        images_dropped,
    }
}
