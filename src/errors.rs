//! Error types for the pgtypecast crate
//!
//! This module contains all error types that can be returned by encode and
//! decode operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Malformed literal at byte {position}: {message}")]
    Decode { message: String, position: usize },

    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    #[error("Invalid type descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Materialization error: {0}")]
    Materialize(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Column already registered: {0}")]
    ColumnAlreadyRegistered(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl CodecError {
    pub(crate) fn decode(message: impl Into<String>, position: usize) -> Self {
        CodecError::Decode {
            message: message.into(),
            position,
        }
    }
}
