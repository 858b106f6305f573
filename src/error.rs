//! Error types shared by the engine, the pipeline and the data sources.

use thiserror::Error;

/// Failures raised by a data source while gathering raw series.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Request timeout")]
    Timeout,

    #[error("Decoding error: {0}")]
    Decode(String),

    #[error("Missing data: {0}")]
    MissingData(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Credentials: {0}")]
    Credentials(String),
}

impl FetchError {
    /// Transport failures, 429 and 5xx are worth another attempt; everything else is final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => *status >= 500,
            Self::RateLimited | Self::Timeout => true,
            _ => false,
        }
    }
}

/// Errors surfaced by report generation.
#[derive(Debug, Error)]
pub enum TrendError {
    /// A collaborator could not deliver one of the raw inputs.
    #[error("fetching {what} failed: {source}")]
    Fetch {
        what: String,
        #[source]
        source: FetchError,
    },

    /// A denominator would be zero or negative. Points at empty upstream data.
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    #[error("invalid input: {0}")]
    Validation(String),
}

impl TrendError {
    pub fn fetch(what: impl Into<String>, source: FetchError) -> Self {
        Self::Fetch {
            what: what.into(),
            source,
        }
    }

    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}

pub type TrendResult<T> = Result<T, TrendError>;
