// src/error.rs

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong between a request going out and a record coming back.
#[derive(Debug, Error)]
pub enum Error {
    /// Upstream answered with an empty body.
    #[error("blank server response")]
    BlankResponse,

    /// Upstream answered, but not in a shape we can normalize.
    #[error("invalid server response: {0}")]
    InvalidResponse(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    /// Transport failures and non-success statuses.
    #[error("http error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("`{operation}` is not available on {platform}")]
    Unsupported {
        platform: &'static str,
        operation: &'static str,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            let url = err
                .url()
                .map(|u| u.to_string())
                .unwrap_or_else(|| "<unknown url>".into());
            Error::Timeout(url)
        } else {
            Error::Http(err)
        }
    }
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidResponse(msg.into())
    }
}
