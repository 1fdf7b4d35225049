use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a one-shot call against the backend HTTP surface.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned status={status} body={body}")]
    Status {
        endpoint: String,
        status: StatusCode,
        body: String,
    },

    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

impl ApiError {
    pub fn transport(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            source,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
