use thiserror::Error;

/// Why a page could not be downloaded. Callers treat every variant the same
/// way: the price is unknown for this cycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),
}

impl FetchError {
    /// Failures worth another attempt when retries are enabled.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout | FetchError::Transport(_) => true,
            FetchError::Status(code) => *code == 429 || *code >= 500,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no element matched the price locator")]
    NoPriceElement,

    #[error("price element text contains no number: {text:?}")]
    NoNumericToken { text: String },

    #[error("invalid CSS selector: {selector}")]
    InvalidLocator { selector: String },
}

/// Failure to observe a price for one product during a pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("a product with url {url} is already tracked")]
    DuplicateProduct { url: String },

    #[error("product index {index} is out of range (1..={len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("failed to read product store {path}: {message}")]
    PersistenceRead { path: String, message: String },

    #[error("failed to write product store {path}: {message}")]
    PersistenceWrite { path: String, message: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Price check error: {0}")]
    Check(#[from] CheckError),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("{}", err))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
