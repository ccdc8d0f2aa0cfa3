use crate::registry::FailureKind;
use thiserror::Error;

/// Errors that abort a whole crawl before any instance is visited.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP client setup failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;

/// Errors raised while fetching one relation collection of one instance.
///
/// These never leave the task that hit them; the engine turns them into a
/// `Dead` registry entry for the instance.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid instance identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("bad redirect from {url}: {reason}")]
    Redirect { url: String, reason: String },

    #[error("undecodable collection from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Configuration(_) => FailureKind::Configuration,
            FetchError::Timeout { .. } | FetchError::Transport(_) => FailureKind::Transport,
            FetchError::InvalidIdentifier(_)
            | FetchError::Status { .. }
            | FetchError::Redirect { .. }
            | FetchError::Decode { .. } => FailureKind::Protocol,
        }
    }

    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Transport(err)
        }
    }
}
