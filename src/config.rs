use crate::error::{PhotoMergeError, Result};
use photo_merge_common::Thresholds;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub post_threshold: f64,
    pub image_threshold: f64,
    /// 追加の同義語JSON（組み込みテーブルにマージ）
    pub synonyms_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            post_threshold: Thresholds::DEFAULT_POST,
            image_threshold: Thresholds::DEFAULT_IMAGE,
            synonyms_path: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| PhotoMergeError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("photo-merge").join("config.json"))
    }

    /// CLI指定を優先して閾値を決める
    pub fn thresholds(&self, post: Option<f64>, image: Option<f64>) -> Result<Thresholds> {
        let thresholds = Thresholds::new(
            post.unwrap_or(self.post_threshold),
            image.unwrap_or(self.image_threshold),
        )?;
        Ok(thresholds)
    }

    pub fn set_post_threshold(&mut self, value: f64) -> Result<()> {
        Thresholds::new(value, self.image_threshold)?;
        self.post_threshold = value;
        self.save()
    }

    pub fn set_image_threshold(&mut self, value: f64) -> Result<()> {
        Thresholds::new(self.post_threshold, value)?;
        self.image_threshold = value;
        self.save()
    }

    pub fn set_synonyms_path(&mut self, path: PathBuf) -> Result<()> {
        if !path.exists() {
            return Err(PhotoMergeError::FileNotFound(path.display().to_string()));
        }
        self.synonyms_path = Some(path);
        self.save()
    }
}
