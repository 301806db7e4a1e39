use thiserror::Error;

/// Failure of any remote call: index CSV, tree listing, document, or draft note.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The request never produced a response, or its body could not be read.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status; `body` is the response text.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// CSV or JSON payload could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}
