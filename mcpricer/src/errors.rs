use mcatlas::utils::errors::McError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Pricing failed: {0}")]
    Engine(#[from] McError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, CliError>;
