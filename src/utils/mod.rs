/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Utility functions shared by the lattice and structure factor code
//!
//! This module provides vectors and rotations, numerical integration and
//! interpolation, special functions, quadrature rules and a bounded cache.

pub mod cache;
pub mod constants;
pub mod errors;
pub mod math;
pub mod quadrature;
pub mod special;
pub mod vector;

pub use cache::LimitedCache;
pub use errors::{Result, UtilsError};
pub use math::{interp, interpolate_table, linspace, polynomial_roots, trapezoid};
pub use vector::{Matrix3, Vector3D};

/// Convert from Angstrom to nanometer
pub fn angstrom_to_nm(angstrom: f64) -> f64 {
    angstrom * 0.1
}

/// Convert a temperature in Celsius to Kelvin
pub fn celsius_to_kelvin(celsius: f64) -> f64 {
    celsius + constants::ZERO_CELSIUS
}
