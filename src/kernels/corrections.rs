/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Debye-Waller damping, scattering angles and geometric intensity corrections

use crate::utils::errors::UtilsError;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::str::FromStr;

/// Debye-Waller factor `exp(-q² rmsd²)`
///
/// # Arguments
///
/// * `q` - Wavevector in 1/nm
/// * `rmsd` - Root mean square displacement of lattice points in nm
pub fn debye_waller(q: f64, rmsd: f64) -> f64 {
    (-q * q * rmsd * rmsd).exp()
}

/// Scattering angle `2 asin(q λ / 4π)` in radians
///
/// Returns NaN if `q λ / 4π` exceeds one.
pub fn scattering_angle(q: f64, wavelength: f64) -> f64 {
    2.0 * (q * wavelength / 4.0 / PI).asin()
}

/// Geometric intensity corrections of diffraction measurements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Correction {
    /// Thompson polarisation `(1+cos²θ)/2`
    #[serde(rename = "TP")]
    ThompsonPolarisation,
    /// Lorentz correction `1/sin θ`
    #[serde(rename = "LC")]
    Lorentz,
    /// Detection on a narrow strip of the Debye-Scherrer cone, `1/sin θ`
    #[serde(rename = "area")]
    Area,
    /// Likelihood of a crystallite to be in diffraction position, `cos(θ/2)`
    #[serde(rename = "lh")]
    Likelihood,
}

impl Correction {
    /// All corrections
    pub fn all() -> Vec<Correction> {
        vec![
            Correction::ThompsonPolarisation,
            Correction::Likelihood,
            Correction::Lorentz,
            Correction::Area,
        ]
    }

    /// Factor of this correction at scattering angle `theta`
    ///
    /// The likelihood correction is inverted for oriented crystals.
    pub fn factor(&self, theta: f64, oriented: bool) -> f64 {
        match self {
            Correction::ThompsonPolarisation => (1.0 + theta.cos().powi(2)) / 2.0,
            Correction::Lorentz | Correction::Area => 1.0 / theta.sin(),
            Correction::Likelihood if oriented => 1.0 / (theta / 2.0).cos(),
            Correction::Likelihood => (theta / 2.0).cos(),
        }
    }
}

impl FromStr for Correction {
    type Err = UtilsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TP" => Ok(Correction::ThompsonPolarisation),
            "LC" => Ok(Correction::Lorentz),
            "area" => Ok(Correction::Area),
            "lh" => Ok(Correction::Likelihood),
            _ => Err(UtilsError::InvalidInput(format!("unknown correction '{s}'"))),
        }
    }
}

/// Product of the selected corrections at wavevector `q`
pub fn correction_factor(q: f64, wavelength: f64, corrections: &[Correction], oriented: bool) -> f64 {
    let theta = scattering_angle(q, wavelength);
    corrections
        .iter()
        .map(|c| c.factor(theta, oriented))
        .product()
}
