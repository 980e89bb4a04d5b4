/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for the structure factor solvers

use crate::data::DataError;
use crate::lattice::LatticeError;
use crate::utils::UtilsError;
use thiserror::Error;

/// Result type for structure factor calculations
pub type Result<T> = std::result::Result<T, StructureFactorError>;

/// Structure factor specific errors
#[derive(Error, Debug)]
pub enum StructureFactorError {
    /// Negative radius, non finite wavevector, volume fraction above one or
    /// inconsistent concentrations
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// No root of the quartic gives a vanishing g(r) inside the hard core
    #[error("No physical root: {0}")]
    NoPhysicalRoot(String),

    /// The rescaled volume fraction could not be found
    #[error("Rescaling failed: {0}")]
    NoRescaling(String),

    /// Overflow outside the asymptotic branch of the MSA solution
    #[error("Numeric overflow: {0}")]
    NumericOverflow(String),

    /// Error from the lattice module
    #[error("Lattice error: {0}")]
    Lattice(#[from] LatticeError),

    /// Error from the result container
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Error from the numeric utilities
    #[error("Math error: {0}")]
    Utils(#[from] UtilsError),
}
