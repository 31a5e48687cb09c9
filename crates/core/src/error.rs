//! Core error types for the EO client

#[derive(thiserror::Error, Debug)]
pub enum EoClientError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid usage: {0}")]
    InvalidUsage(String),
}

pub type Result<T> = std::result::Result<T, EoClientError>;
