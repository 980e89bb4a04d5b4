/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for the result container

use std::io;
use thiserror::Error;

/// Errors that can occur while building or reading a data array
#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Column length mismatch: {0}")]
    LengthMismatch(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type for data array operations
pub type Result<T> = std::result::Result<T, DataError>;
