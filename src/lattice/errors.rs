/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for lattice construction and manipulation

use thiserror::Error;

/// Errors that can occur while building or transforming a lattice
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LatticeError {
    #[error("Degenerate lattice: {0}")]
    DegenerateLattice(String),

    #[error("Invalid rotation: {0}")]
    InvalidRotation(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown element: {0}")]
    UnknownElement(String),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),
}

/// Result type for lattice operations
pub type Result<T> = std::result::Result<T, LatticeError>;
