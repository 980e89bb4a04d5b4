/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Random phase approximation for weakly charged polyelectrolytes (Borue-Erukhimovich)

use super::common::{sq_result, validate_q};
use super::errors::{Result, StructureFactorError};
use crate::data::DataArray;
use crate::kernels::{bjerrum_length, dielectric_constant, Solvent};
use crate::utils::celsius_to_kelvin;
use crate::utils::constants::MOLAR_TO_NUMBER_DENSITY;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Solvent and contrast options of the polyelectrolyte model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolyelectrolyteOptions {
    /// Additional inverse compressibility, `v + w² c` from the virial coefficients
    pub ioc: f64,
    /// Dielectric constant of the solvent, water at `temperature` if not given
    pub epsilon: Option<f64>,
    /// Temperature in K
    pub temperature: f64,
    /// Scattering length density difference of a monomer in 1/nm²
    pub contrast: Option<f64>,
    /// Monomer volume in nm³
    pub molar_volume: Option<f64>,
}

impl Default for PolyelectrolyteOptions {
    fn default() -> Self {
        Self {
            ioc: 0.0,
            epsilon: None,
            temperature: celsius_to_kelvin(20.0),
            contrast: None,
            molar_volume: None,
        }
    }
}

impl PolyelectrolyteOptions {
    /// Parse options from JSON, missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| StructureFactorError::InvalidParameter(e.to_string()))
    }
}

/// Structure factor of a weakly charged polyelectrolyte in salt solution
///
/// `S(q) = c²/(4π lB f²) (q²+κ²)/(1 + r0⁴(q²+κ²)(q² − 12 ioc cp/l²))` with the
/// Debye-Hückel constant `κ² = 4π lB (2cs + f cp)` and the salt free screening
/// scale `r0² = l/(f √(48π cp lB))`. The monomer scattering length `c` is
/// `molar_volume · contrast` when both are given and 1 otherwise.
///
/// # Arguments
///
/// * `q` - Wavevectors in 1/nm
/// * `cp` - Monomer concentration in mol/l
/// * `l` - Monomer length in nm
/// * `f` - Fraction of charged monomers
/// * `cs` - Monovalent salt concentration in mol/l
/// * `options` - Solvent, temperature and contrast
pub fn weak_polyelectrolyte(
    q: &[f64],
    cp: f64,
    l: f64,
    f: f64,
    cs: f64,
    options: &PolyelectrolyteOptions,
) -> Result<DataArray> {
    validate_q(q)?;
    let f = f.abs();
    if !(cp > 0.0 && l > 0.0 && f > 0.0) {
        return Err(StructureFactorError::InvalidParameter(format!(
            "monomer concentration, monomer length and charge fraction must be positive, \
             got cp={cp} l={l} f={f}"
        )));
    }
    if !(cs >= 0.0) || !(options.temperature > 0.0) {
        return Err(StructureFactorError::InvalidParameter(format!(
            "salt concentration must not be negative and temperature must be positive, \
             got cs={cs} T={}",
            options.temperature
        )));
    }

    let epsilon = options
        .epsilon
        .unwrap_or_else(|| dielectric_constant(Solvent::H2O, options.temperature, 0.0, 5.5));
    let lb = bjerrum_length(options.temperature, epsilon);
    // number densities in 1/nm³
    let ns = cs * MOLAR_TO_NUMBER_DENSITY;
    let np = cp * MOLAR_TO_NUMBER_DENSITY;

    let k2 = 4.0 * PI * lb * (2.0 * ns + np * f);
    let r02 = l / f / (48.0 * PI * np * lb).sqrt();
    let scale = match (options.contrast, options.molar_volume) {
        (Some(contrast), Some(volume)) => Some(volume * contrast),
        _ => None,
    };
    let c2 = scale.map_or(1.0, |c| c * c);

    let sq = q
        .iter()
        .map(|qq| {
            let q2 = qq * qq;
            c2 * (q2 + k2) / (4.0 * PI * lb * f * f)
                / (1.0 + r02 * r02 * (q2 + k2) * (q2 - 12.0 * options.ioc * np / (l * l)))
        })
        .collect();

    let mut result = sq_result(q, sq)?;
    result.set_attr("c_salt", cs);
    result.set_attr("c_monomer", cp);
    result.set_attr("c_ions", 2.0 * cs + cp * f);
    result.set_attr("epsilon", epsilon);
    result.set_attr("kappa", k2.sqrt());
    result.set_attr("screeninglength", 1.0 / k2.sqrt());
    result.set_attr("r0", r02.sqrt());
    if let Some(c) = scale {
        result.set_attr("monomerscatteringlength", c);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_salt_free_peak() {
        let q: Vec<f64> = (1..400).map(|i| i as f64 * 0.01).collect();
        let result = weak_polyelectrolyte(&q, 0.1, 0.38, 0.05, 0.0, &Default::default()).unwrap();
        let sq = result.column("Sq").unwrap();
        let imax = sq
            .iter()
            .enumerate()
            .fold(0, |best, (i, v)| if *v > sq[best] { i } else { best });
        assert!(imax > 0 && imax < q.len() - 1);

        // peak at (q*² + κ²)² = 1/r0⁴
        let kappa = result.attr_f64("kappa").unwrap();
        let r0 = result.attr_f64("r0").unwrap();
        let q_peak = (1.0 / (r0 * r0) - kappa * kappa).sqrt();
        assert_relative_eq!(q[imax], q_peak, epsilon = 0.02);
    }

    #[test]
    fn test_salt_screening_and_contrast() {
        let options = PolyelectrolyteOptions {
            contrast: Some(2.0),
            molar_volume: Some(0.1),
            ..Default::default()
        };
        let plain = weak_polyelectrolyte(&[0.0, 1.0], 0.1, 0.38, 0.05, 0.5, &Default::default()).unwrap();
        let scaled = weak_polyelectrolyte(&[0.0, 1.0], 0.1, 0.38, 0.05, 0.5, &options).unwrap();
        let s0 = plain.column("Sq").unwrap();
        let s1 = scaled.column("Sq").unwrap();
        assert_relative_eq!(s1[1], 0.04 * s0[1], max_relative = 1e-12);
        assert_relative_eq!(scaled.attr_f64("monomerscatteringlength").unwrap(), 0.2);
        assert!(plain.attr("monomerscatteringlength").is_none());
        assert_relative_eq!(plain.attr_f64("c_ions").unwrap(), 1.005);
        assert_relative_eq!(plain.attr_f64("epsilon").unwrap(), 80.08, epsilon = 0.01);
        assert!(weak_polyelectrolyte(&[0.1], 0.0, 0.38, 0.05, 0.5, &Default::default()).is_err());
    }
}
