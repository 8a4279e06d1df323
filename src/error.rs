use std::path::PathBuf;

use reqwest::StatusCode;

/// Every failure the digest pipeline can hit. None of them are recovered
/// from: the first one aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to read events file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse events JSON in {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("request to {service} failed")]
    Network {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned {status}: {body}")]
    UnexpectedStatus {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("{service} rejected the credentials ({status}): {body}")]
    Auth {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("failed to write events to {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode events as JSON")]
    Encode(#[from] serde_json::Error),

    #[error("summarization API returned neither choices nor an error: {0}")]
    EmptyResponse(String),
}

pub type DigestResult<T> = Result<T, DigestError>;

impl DigestError {
    pub(crate) fn network(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| DigestError::Network { service, source }
    }

    /// Maps a non-success HTTP status to `Auth` for 401/403 and
    /// `UnexpectedStatus` otherwise.
    pub(crate) fn from_status(service: &'static str, status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DigestError::Auth {
                service,
                status,
                body,
            },
            _ => DigestError::UnexpectedStatus {
                service,
                status,
                body,
            },
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, DigestError::Config(_))
    }
}
