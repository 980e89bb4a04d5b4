/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Shared parameter handling of the structure factor solvers

use super::errors::{Result, StructureFactorError};
use crate::data::DataArray;
use crate::utils::constants::MOLAR_TO_NUMBER_DENSITY;
use log::debug;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Substitute for q = 0 where an analytic form has a removable singularity
pub const Q_ZERO: f64 = 1e-8;

/// Particle concentration, either as volume fraction or as molarity in mol/l
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Concentration {
    VolumeFraction(f64),
    Molarity(f64),
}

impl Concentration {
    /// Pick the concentration from optional inputs, molarity wins if both are given
    pub fn from_options(molarity: Option<f64>, volume_fraction: Option<f64>) -> Result<Self> {
        match (molarity, volume_fraction) {
            (Some(m), _) => Ok(Concentration::Molarity(m)),
            (None, Some(eta)) => Ok(Concentration::VolumeFraction(eta)),
            (None, None) => Err(StructureFactorError::InvalidParameter(
                "one of molarity or volume fraction needs to be given".to_string(),
            )),
        }
    }

    /// Volume fraction and molarity of spheres with the given radius in nm
    ///
    /// Negative or non finite radii and concentrations are rejected.
    pub fn resolve(&self, radius: f64) -> Result<(f64, f64)> {
        validate_length("radius", radius)?;
        let sphere = 4.0 / 3.0 * PI * radius.powi(3);
        match *self {
            Concentration::Molarity(m) => {
                validate_length("molarity", m)?;
                Ok((sphere * m * MOLAR_TO_NUMBER_DENSITY, m))
            }
            Concentration::VolumeFraction(eta) => {
                validate_length("volume fraction", eta)?;
                let molarity = if sphere > 0.0 {
                    eta / sphere / MOLAR_TO_NUMBER_DENSITY
                } else {
                    0.0
                };
                Ok((eta, molarity))
            }
        }
    }

    /// Volume fraction of spheres with the given radius
    pub fn volume_fraction(&self, radius: f64) -> Result<f64> {
        Ok(self.resolve(radius)?.0)
    }

    /// Molarity in mol/l of spheres with the given radius
    pub fn molarity(&self, radius: f64) -> Result<f64> {
        Ok(self.resolve(radius)?.1)
    }
}

impl From<f64> for Concentration {
    fn from(eta: f64) -> Self {
        Concentration::VolumeFraction(eta)
    }
}

/// Check that all wavevectors are finite
pub fn validate_q(q: &[f64]) -> Result<()> {
    match q.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(StructureFactorError::InvalidParameter(format!(
            "wavevector {} at index {i} is not finite",
            q[i]
        ))),
        None => Ok(()),
    }
}

/// Check that a length parameter is finite and not negative
pub fn validate_length(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(StructureFactorError::InvalidParameter(format!(
            "{name} must be finite and not negative, got {value}"
        )))
    }
}

/// Check that a volume fraction lies in [0, 1]
pub fn validate_volume_fraction(eta: f64) -> Result<()> {
    if (0.0..=1.0).contains(&eta) {
        Ok(())
    } else {
        Err(StructureFactorError::InvalidParameter(format!(
            "volume fraction must be in [0, 1], got {eta}"
        )))
    }
}

/// Replace q = 0 by a small positive value
pub fn nonzero(q: f64) -> f64 {
    if q == 0.0 {
        Q_ZERO
    } else {
        q
    }
}

/// Fail if a computed column holds NaN or infinite values
pub fn ensure_finite(name: &str, values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(StructureFactorError::InvalidParameter(format!(
            "{name} is not finite at index {i}"
        ))),
        None => Ok(()),
    }
}

/// Result container with columns `q` and `Sq`
pub fn sq_result(q: &[f64], sq: Vec<f64>) -> Result<DataArray> {
    ensure_finite("Sq", &sq)?;
    let mut result = DataArray::new();
    result.push_column("q", q.to_vec())?;
    result.push_column("Sq", sq)?;
    Ok(result)
}

/// Run `f` on the global rayon pool or on a pool with `workers` threads
pub fn with_workers<F, R>(workers: Option<usize>, f: F) -> Result<R>
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    match workers {
        None | Some(0) => Ok(f()),
        Some(n) => {
            debug!("building a pool with {n} workers");
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| StructureFactorError::InvalidParameter(e.to_string()))?;
            Ok(pool.install(f))
        }
    }
}
