/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Bjerrum length and dielectric constant of aqueous solvents

use crate::utils::constants::{BOLTZMANN, ELEMENTARY_CHARGE, VACUUM_PERMITTIVITY, ZERO_CELSIUS};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Bjerrum length `e²/(4π ε0 ε kB T)` in nm
///
/// # Arguments
///
/// * `temperature` - Temperature in K
/// * `epsilon` - Relative dielectric constant of the solvent
pub fn bjerrum_length(temperature: f64, epsilon: f64) -> f64 {
    ELEMENTARY_CHARGE.powi(2) / (4.0 * PI * epsilon * VACUUM_PERMITTIVITY * temperature * BOLTZMANN)
        * 1e9
}

/// Aqueous solvent for the dielectric constant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Solvent {
    /// Light water
    H2O,
    /// Heavy water
    #[default]
    D2O,
}

/// Dielectric constant of H2O or D2O with added salt
///
/// Polynomial in the Celsius temperature plus the salt term `2 delta conc`, valid below 2 mol/l.
///
/// # Arguments
///
/// * `solvent` - H2O or D2O
/// * `temperature` - Temperature in K
/// * `conc` - Salt concentration in mol/l
/// * `delta` - Total excess polarisation of the salt, 5.5 for NaCl
pub fn dielectric_constant(solvent: Solvent, temperature: f64, conc: f64, delta: f64) -> f64 {
    let t = temperature - ZERO_CELSIUS;
    let pure = match solvent {
        Solvent::H2O => 87.740 - 0.4008 * t + 9.398e-4 * t * t - 1.410e-6 * t.powi(3),
        Solvent::D2O => 87.48 - 0.40509 * t + 9.638e-4 * t * t - 1.333e-6 * t.powi(3),
    };
    pure + 2.0 * delta * conc
}
