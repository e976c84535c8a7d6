use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Network request failed
    #[error("Network error: {0}")]
    NetworkError(String),
    /// Failed to parse JSON content or a response envelope
    #[error("Parse error: {0}")]
    ParseError(String),
    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    UrlError(String),
    /// Regex compilation failed
    #[error("Regex error: {0}")]
    RegexError(String),
    /// Invalid input format, rejected before any request is sent
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Every API key failed on every pass
    #[error("Request '{label}' failed after {passes} pass(es) over {keys} API key(s)")]
    FetchExhausted {
        label: String,
        passes: u32,
        keys: usize,
    },
    /// The metadata envelope decoded but reported a non-200 `estado`
    #[error("AEMET error: {description} (estado: {status})")]
    Upstream { status: i64, description: String },
    /// The metadata envelope reported success without a `datos` URL
    #[error("AEMET response did not include a data URL")]
    MissingDataUrl,
    /// IO operation failed
    #[error("IO error: {0}")]
    IoError(String),
}

// Conversion implementations for common errors
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::NetworkError(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::UrlError(err.to_string())
    }
}

impl From<regex::Error> for AppError {
    fn from(err: regex::Error) -> Self {
        AppError::RegexError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

// Custom type alias for Results in this application
pub type AppResult<T> = Result<T, AppError>;
