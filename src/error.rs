use std::io;

use crate::session::SessionConfigBuilderError;

#[derive(thiserror::Error, Debug)]
pub enum PetriError {
    #[error("Filesystem error: {0}")]
    IOError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    ConfigError(#[from] SessionConfigBuilderError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Illegal state: {0}")]
    IllegalState(String),
}

pub type Result<T> = std::result::Result<T, PetriError>;
