use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum McError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Numerical error: {0}")]
    NumericalError(String),
    #[error("Simulation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, McError>;

impl From<McError> for String {
    fn from(e: McError) -> Self {
        e.to_string()
    }
}
