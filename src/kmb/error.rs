use reqwest::StatusCode;

#[derive(thiserror::Error, Debug)]
pub enum KmbError {
    #[error("Init error: {0}")]
    Init(String),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Deserialize error: {0}")]
    Deserialize(#[from] serde_json::Error),

    /// The upstream answered with a non-success status.
    #[error("Upstream responded {0}")]
    Status(StatusCode),
}

pub type KmbResult<T> = Result<T, KmbError>;
