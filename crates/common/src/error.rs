use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Exchange API error: {0}")]
    Exchange(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Narrative generator error: {0}")]
    Narrative(String),

    #[error("Alert delivery error: {0}")]
    Alert(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
