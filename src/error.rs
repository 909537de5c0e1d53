use std::fmt;
use thiserror::Error;

/// Failure of a single translation run.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// The endpoint could not be reached or the request did not complete.
    #[error("endpoint unreachable: {0}")]
    Transport(String),

    /// The endpoint answered with something other than HTTP 200.
    #[error("endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The body did not have the `{choices:[{message:{content}}]}` shape.
    #[error("malformed response: {0}")]
    Protocol(String),

    #[error("empty response from language model")]
    EmptyResponse,

    #[error("invalid configuration: {0}")]
    Configuration(String),
}

/// Coarse failure category carried to the presentation side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Protocol,
    EmptyResponse,
    Configuration,
}

impl TranslateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TranslateError::Transport(_) | TranslateError::Status { .. } => ErrorKind::Transport,
            TranslateError::Protocol(_) => ErrorKind::Protocol,
            TranslateError::EmptyResponse => ErrorKind::EmptyResponse,
            TranslateError::Configuration(_) => ErrorKind::Configuration,
        }
    }
}

impl From<reqwest::Error> for TranslateError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TranslateError::Transport(format!("request timed out: {}", e))
        } else if e.is_connect() {
            TranslateError::Transport(format!("connection failed: {}", e))
        } else {
            TranslateError::Transport(e.to_string())
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Transport => write!(f, "Transport error"),
            ErrorKind::Protocol => write!(f, "Protocol error"),
            ErrorKind::EmptyResponse => write!(f, "Empty response"),
            ErrorKind::Configuration => write!(f, "Configuration error"),
        }
    }
}
