//! Error types for vidmux

use thiserror::Error;

/// Main error type for vidmux operations
#[derive(Debug, Error)]
pub enum VidmuxError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Video unavailable")]
    VideoUnavailable,

    #[error("Private video")]
    Private,

    #[error("Age restricted")]
    AgeRestricted,

    #[error("Sign-in required")]
    LoginRequired,

    #[error("Format not found: {0}")]
    FormatNotFound(String),

    #[error("Upstream stream failed: {0}")]
    Upstream(String),

    #[error("Muxer failed: {0}")]
    Muxer(String),

    #[error("Transfer timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("API key not found")]
    ApiKeyNotFound,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Coarse classification used to pick a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed input (400)
    InvalidInput,
    /// Video or rendition can no longer be resolved (404)
    NotFound,
    /// Age restriction or sign-in requirement (403)
    Forbidden,
    /// Provider or muxer failed while transferring
    UpstreamFailure,
    /// Anything unanticipated (500)
    Internal,
}

impl VidmuxError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            VidmuxError::InvalidUrl(_)
            | VidmuxError::InvalidRequest(_)
            | VidmuxError::UrlError(_) => ErrorKind::InvalidInput,
            VidmuxError::VideoUnavailable
            | VidmuxError::Private
            | VidmuxError::FormatNotFound(_) => ErrorKind::NotFound,
            VidmuxError::AgeRestricted | VidmuxError::LoginRequired => ErrorKind::Forbidden,
            VidmuxError::Upstream(_)
            | VidmuxError::Muxer(_)
            | VidmuxError::Timeout(_)
            | VidmuxError::Http(_) => ErrorKind::UpstreamFailure,
            VidmuxError::ApiKeyNotFound
            | VidmuxError::Io(_)
            | VidmuxError::Json(_)
            | VidmuxError::RegexError(_)
            | VidmuxError::Generic(_) => ErrorKind::Internal,
        }
    }

    /// Check if error is retryable when talking to the provider API
    pub fn is_retryable(&self) -> bool {
        match self {
            VidmuxError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().map_or(false, |s| s.is_server_error() || s.as_u16() == 429)
            }
            VidmuxError::Timeout(_) => true,
            _ => false,
        }
    }

    /// Message safe to show to the client
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::InvalidInput | ErrorKind::NotFound => self.to_string(),
            ErrorKind::Forbidden => match self {
                VidmuxError::AgeRestricted => {
                    "This video is age-restricted and cannot be downloaded".to_string()
                }
                _ => "This video requires signing in and cannot be downloaded".to_string(),
            },
            ErrorKind::UpstreamFailure | ErrorKind::Internal => {
                "Failed to process the video".to_string()
            }
        }
    }
}
