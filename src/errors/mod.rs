use thiserror::Error;

#[derive(Error, Debug)]
pub enum NewsboyError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Source errors
    #[error("Invalid source URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),

    #[error("Invalid source definition: {0}")]
    InvalidSource(String),

    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response code ({status}) from: {url}")]
    UnexpectedStatus { status: u16, url: String },

    // Snapshot errors
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // User input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type NewsboyResult<T> = Result<T, NewsboyError>;
