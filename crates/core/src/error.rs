use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkipError {
    #[error("Skip-times request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Skip-times service returned {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("Skip-times payload could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid skip-times URL: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, SkipError>;
