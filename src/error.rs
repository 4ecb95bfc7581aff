use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParityError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP {status} from {url}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to launch Chrome: {0}")]
    LaunchFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Timed out after {ms}ms waiting for {what}")]
    Timeout { what: String, ms: u64 },

    #[error("No page available")]
    NoPage,

    #[error("CDP error: {0}")]
    CdpError(#[from] chromiumoxide::error::CdpError),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl ParityError {
    /// True for HTTP client errors the discover endpoint returns for filters it rejects
    pub fn is_rejected_query(&self) -> bool {
        matches!(self, ParityError::Http { status, .. } if (400..500).contains(status) && *status != 401)
    }
}

pub type Result<T> = std::result::Result<T, ParityError>;
