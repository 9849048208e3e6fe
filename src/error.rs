use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhotoMergeError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("入力データが不正: {0}")]
    InvalidInput(String),

    #[error("レコードが見つかりません: {0}")]
    RecordNotFound(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("CSVエラー: {0}")]
    Csv(#[from] csv::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("スレッドプール作成エラー: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Common(#[from] photo_merge_common::Error),
}

pub type Result<T> = std::result::Result<T, PhotoMergeError>;
