/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for the numerical helpers

use thiserror::Error;

/// Failures of interpolation, quadrature, fitting and root finding
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UtilsError {
    /// Mismatched or empty input tables
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Domain errors of a numerical routine
    #[error("Math error: {0}")]
    Math(String),

    /// Pivot vanished during elimination
    #[error("Singular linear system of size {0}")]
    Singular(usize),

    /// Iterative method did not converge
    #[error("No convergence: {0}")]
    NoConvergence(String),
}

/// A specialized Result type for utils operations
pub type Result<T> = std::result::Result<T, UtilsError>;
