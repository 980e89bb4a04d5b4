/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Powder averaged structure factor of a crystal lattice
//!
//! `S(q) = 1 + β(q)(Z0(q) - 1) DW(q)` with the lattice factor
//! `Z0(q) = (2π)^d c/(Ω_d v_d q^{d-1}) Σ m_hkl f²_hkl L_hkl(q) / Σ|b|²`
//! (after Förster et al., J. Phys. Chem. B 109, 1347 (2005)). `Ω_d` is the surface of
//! the d-dimensional unit sphere (2, 2π, 4π). With `f²_hkl/Σ|b|²` averaging to one over
//! the reciprocal lattice, Z0 tends to 1 at large q for any basis and dimension.
//! Peaks have a Voigt shape whose width follows the Scherrer relation `fwhm = 2π/D`.

use super::common::{ensure_finite, sq_result, validate_q, with_workers, Q_ZERO};
use super::errors::{Result, StructureFactorError};
use crate::data::{ColumnRole, DataArray};
use crate::kernels::peaks::fwhm_to_sigma;
use crate::kernels::{correction_factor, debye_waller, scattering_angle, sum_voigt_peaks, Correction};
use crate::lattice::{Lattice, DEFAULT_PEAK_THRESHOLD};
use crate::utils::math::{interp, linspace};
use crate::utils::Vector3D;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Asymmetry factor `β(q) = <F(q)>²/<F(q)²>` of the particles on the lattice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Beta {
    /// Same value at all wavevectors
    Scalar(f64),
    /// Tabulated values, linearly interpolated and clamped at the ends
    Table { q: Vec<f64>, beta: Vec<f64> },
}

impl Beta {
    /// Table from the x and y columns of a result, e.g. of a form factor
    pub fn from_data(data: &DataArray) -> Result<Self> {
        let sorted = data.sorted_by_x()?;
        Ok(Beta::Table {
            q: sorted.x()?.to_vec(),
            beta: sorted.y()?.to_vec(),
        })
    }

    /// Values at the wavevectors `q`
    pub fn values(&self, q: &[f64]) -> Result<Vec<f64>> {
        match self {
            Beta::Scalar(b) => Ok(vec![*b; q.len()]),
            Beta::Table { q: qt, beta } => {
                let mut pairs: Vec<(f64, f64)> = qt.iter().copied().zip(beta.iter().copied()).collect();
                pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
                let (x, y): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
                Ok(interp(q, &x, &y)?)
            }
        }
    }
}

/// Resolve an optional asymmetry factor, none means β = 1
pub(crate) fn beta_values(beta: Option<&Beta>, q: &[f64]) -> Result<Vec<f64>> {
    match beta {
        None => Ok(vec![1.0; q.len()]),
        Some(b) => b.values(q),
    }
}

/// Scattering angles and correction factors, points the wavelength cannot reach get zero
pub(crate) fn corrections_at(
    q: &[f64],
    wavelength: f64,
    corrections: &[Correction],
    oriented: bool,
) -> (Vec<f64>, Vec<f64>) {
    let mut unreachable = 0usize;
    let (theta, factor) = q
        .iter()
        .map(|&qq| {
            let theta = scattering_angle(qq, wavelength);
            if theta.is_nan() {
                unreachable += 1;
                (PI, 0.0)
            } else {
                (theta, correction_factor(qq, wavelength, corrections, oriented))
            }
        })
        .unzip();
    if unreachable > 0 {
        warn!("{unreachable} wavevectors are out of reach of wavelength {wavelength} nm");
    }
    (theta, factor)
}

fn unit_sphere_surface(dim: usize) -> f64 {
    match dim {
        1 => 2.0,
        2 => 2.0 * PI,
        _ => 4.0 * PI,
    }
}

/// Options of the powder averaged lattice structure factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatticeSfConfig {
    /// Domain size D, peaks have a FWHM of 2π/D
    pub domain_size: f64,
    /// Peak asymmetry
    pub asym: f64,
    /// Lorentzian over Gaussian width ratio of the Voigt peaks
    pub lg: f64,
    /// Root mean square displacement of lattice points
    pub rmsd: f64,
    /// Asymmetry factor, none means 1
    pub beta: Option<Beta>,
    /// Largest Miller index
    pub hkl_max: usize,
    /// Porod constant
    pub c: f64,
    /// Wavelength in nm, enables the scattering angle and corrections
    pub wavelength: Option<f64>,
    /// Geometric corrections, applied only with a wavelength
    pub corrections: Vec<Correction>,
    /// Relative intensity threshold of the peak selection
    pub threshold: f64,
    /// Number of worker threads, none uses the global pool
    pub workers: Option<usize>,
}

impl Default for LatticeSfConfig {
    fn default() -> Self {
        Self {
            domain_size: 1000.0,
            asym: 0.0,
            lg: 1.0,
            rmsd: 0.02,
            beta: None,
            hkl_max: 7,
            c: 1.0,
            wavelength: None,
            corrections: Vec::new(),
            threshold: DEFAULT_PEAK_THRESHOLD,
            workers: None,
        }
    }
}

impl LatticeSfConfig {
    /// Parse a configuration from JSON, missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| StructureFactorError::InvalidParameter(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if !(self.domain_size > 0.0) || !self.domain_size.is_finite() {
            return Err(StructureFactorError::InvalidParameter(format!(
                "domain size must be positive, got {}",
                self.domain_size
            )));
        }
        if !(self.lg >= 0.0) || !self.rmsd.is_finite() {
            return Err(StructureFactorError::InvalidParameter(format!(
                "invalid peak shape lg={} rmsd={}",
                self.lg, self.rmsd
            )));
        }
        if let Some(w) = self.wavelength {
            if !(w > 0.0) {
                return Err(StructureFactorError::InvalidParameter(format!(
                    "wavelength must be positive, got {w}"
                )));
            }
        }
        Ok(())
    }
}

/// Powder averaged structure factor of a lattice
///
/// # Arguments
///
/// * `q` - Wavevectors in 1/nm, zeros are replaced by `1e-4 · min(q > 0)`
/// * `lattice` - Periodic lattice with unit cell scattering lengths
/// * `config` - Peak shape, disorder and measurement options
///
/// # Returns
///
/// Columns `q`, `Sq`, `DW`, `beta`, `Z0q` and with a wavelength also `correction` and
/// `theta` (radians, Sq includes the correction). Attributes hold the peak list and
/// the peak shape parameters.
pub fn lattice_structure_factor(q: &[f64], lattice: &Lattice, config: &LatticeSfConfig) -> Result<DataArray> {
    validate_q(q)?;
    config.validate()?;
    let sum_b2 = lattice.sum_b_squared();
    if !(sum_b2 > 0.0) {
        return Err(StructureFactorError::InvalidParameter(
            "unit cell scattering lengths are all zero".to_string(),
        ));
    }

    let q_min = q.iter().copied().filter(|&v| v > 0.0).fold(f64::INFINITY, f64::min);
    let zero = if q_min.is_finite() { q_min * 1e-4 } else { Q_ZERO };
    let qq: Vec<f64> = q.iter().map(|&v| if v == 0.0 { zero } else { v }).collect();

    let dim = lattice.dimension();
    let vd = lattice.unit_cell_volume();
    let peaks = lattice.radial_peaks_above(config.hkl_max, config.threshold)?;
    debug!("powder structure factor with {} radial peaks", peaks.len());

    let fwhm = 2.0 * PI / config.domain_size;
    let weights: Vec<(f64, f64)> = peaks.iter().map(|p| (p.q, p.multiplicity as f64 * p.f2)).collect();
    let summed = with_workers(config.workers, || {
        sum_voigt_peaks(&qq, &weights, fwhm, config.lg, config.asym)
    })?;
    let prefactor = (2.0 * PI).powi(dim as i32) * config.c / unit_sphere_surface(dim) / vd / sum_b2;
    let z0: Vec<f64> = summed
        .iter()
        .zip(qq.iter())
        .map(|(s, qv)| s * prefactor / qv.powi(dim as i32 - 1))
        .collect();

    let beta = beta_values(config.beta.as_ref(), q)?;
    let dw: Vec<f64> = q.iter().map(|&v| debye_waller(v, config.rmsd)).collect();
    let mut sq: Vec<f64> = (0..q.len()).map(|i| 1.0 + beta[i] * (z0[i] - 1.0) * dw[i]).collect();

    let angles = match config.wavelength {
        Some(wavelength) => {
            let (theta, correction) = corrections_at(&qq, wavelength, &config.corrections, false);
            for (s, c) in sq.iter_mut().zip(correction.iter()) {
                *s *= c;
            }
            Some((wavelength, theta, correction))
        }
        None => None,
    };
    ensure_finite("Z0q", &z0)?;
    let mut result = sq_result(q, sq)?;
    result.push_column("DW", dw)?;
    result.push_column("beta", beta)?;
    result.push_column("Z0q", z0)?;
    if let Some((wavelength, theta, correction)) = angles {
        result.push_column("correction", correction)?;
        result.push_column("theta", theta)?;
        result.set_attr("Braggtheta", lattice.scattering_angles(config.hkl_max, wavelength)?);
    }

    result.set_attr("q_hkl", peaks.iter().map(|p| p.q).collect::<Vec<f64>>());
    result.set_attr("fhkl", peaks.iter().map(|p| p.f2).collect::<Vec<f64>>());
    result.set_attr("sumfi2", sum_b2);
    result.set_attr(
        "mhkl",
        peaks.iter().map(|p| p.multiplicity as f64).collect::<Vec<f64>>(),
    );
    result.set_attr(
        "hkl",
        peaks
            .iter()
            .map(|p| p.hkl.iter().map(|&h| h as f64).collect())
            .collect::<Vec<Vec<f64>>>(),
    );
    result.set_attr("latticeconstants", lattice.lattice_constants());
    result.set_attr("peakFWHM", fwhm);
    result.set_attr("peaksigma", fwhm_to_sigma(fwhm));
    result.set_attr("peakAsymmetry", config.asym);
    result.set_attr("domainsize", config.domain_size);
    result.set_attr("rmsd", config.rmsd);
    result.set_attr("lorenzianOverGaussian", config.lg);
    Ok(result)
}

/// Powder structure factor evaluated at 3D wavevectors
///
/// The powder result is computed on `2 √(mean(N, 3))` radial points up to the largest
/// `|q|` and linearly interpolated onto the norms of `qxyz`. Columns are `qx`, `qy`,
/// `qz` followed by those of [`lattice_structure_factor`].
pub fn radial_3d_lsf(qxyz: &[Vector3D], lattice: &Lattice, config: &LatticeSfConfig) -> Result<DataArray> {
    if qxyz.is_empty() {
        return Err(StructureFactorError::InvalidParameter(
            "no wavevectors given".to_string(),
        ));
    }
    let qr: Vec<f64> = qxyz.iter().map(|v| v.length()).collect();
    validate_q(&qr)?;
    let q_max = qr.iter().copied().fold(0.0_f64, f64::max);
    let points = ((2.0 * ((qxyz.len() as f64 + 3.0) / 2.0).sqrt()) as usize).max(2);
    let grid = linspace(0.0, q_max, points);
    let powder = lattice_structure_factor(&grid, lattice, config)?;

    let mut result = DataArray::new();
    result.push_column("qx", qxyz.iter().map(|v| v.x).collect::<Vec<f64>>())?;
    result.push_column("qy", qxyz.iter().map(|v| v.y).collect::<Vec<f64>>())?;
    result.push_column("qz", qxyz.iter().map(|v| v.z).collect::<Vec<f64>>())?;
    for name in powder.column_names().into_iter().skip(1) {
        let values = interp(&qr, &grid, &powder.column(name)?.to_vec())?;
        result.push_column(name, values)?;
    }
    result.set_role(ColumnRole::Y, "Sq")?;
    result.set_role(ColumnRole::Z, "qy")?;
    result.set_role(ColumnRole::W, "qz")?;
    for (name, value) in powder.attrs() {
        result.set_attr(name, value.clone());
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn peak_position(result: &DataArray) -> f64 {
        let q = result.column("q").unwrap();
        let sq = result.column("Sq").unwrap();
        let imax = (0..q.len()).fold(0, |best, i| if sq[i] > sq[best] { i } else { best });
        q[imax]
    }

    #[test]
    fn test_first_sc_peak() {
        let sc = Lattice::sc(1.5, 8, None).unwrap();
        let q = linspace(3.5, 5.0, 3001);
        let config = LatticeSfConfig {
            domain_size: 50.0,
            ..Default::default()
        };
        let result = lattice_structure_factor(&q, &sc, &config).unwrap();
        assert_relative_eq!(peak_position(&result), 2.0 * PI / 1.5, max_relative = 1e-3);
        assert_eq!(result.attr_f64("peakFWHM"), Some(2.0 * PI / 50.0));
    }

    #[test]
    fn test_lattice_factor_tends_to_one() {
        let sc = Lattice::sc(1.5, 2, None).unwrap();
        let config = LatticeSfConfig {
            domain_size: 5.0,
            lg: 0.0,
            hkl_max: 12,
            ..Default::default()
        };
        let q = linspace(20.0, 30.0, 2001);
        let result = lattice_structure_factor(&q, &sc, &config).unwrap();
        let z0 = result.column("Z0q").unwrap();
        let mean = z0.iter().sum::<f64>() / z0.len() as f64;
        assert_relative_eq!(mean, 1.0, epsilon = 0.05);
    }

    #[test]
    fn test_wavelength_columns_and_zero_q() {
        let sc = Lattice::sc(1.5, 2, None).unwrap();
        let config = LatticeSfConfig::from_json_str(
            r#"{"wavelength": 0.15406, "corrections": ["TP", "lh"], "beta": {"Scalar": 0.5}}"#,
        )
        .unwrap();
        let result = lattice_structure_factor(&[0.0, 1.0, 5.0], &sc, &config).unwrap();
        assert_eq!(
            result.column_names(),
            vec!["q", "Sq", "DW", "beta", "Z0q", "correction", "theta"]
        );
        assert!(result.column("Sq").unwrap().iter().all(|v| v.is_finite()));
        assert_relative_eq!(result.column("beta").unwrap()[1], 0.5);
        assert!(result.attr("Braggtheta").is_some());
    }

    #[test]
    fn test_beta_table_is_interpolated() {
        let beta = Beta::Table {
            q: vec![2.0, 0.0],
            beta: vec![0.0, 1.0],
        };
        assert_eq!(beta.values(&[0.0, 1.0, 3.0]).unwrap(), vec![1.0, 0.5, 0.0]);
    }

    #[test]
    fn test_radial_3d_matches_powder() {
        let sc = Lattice::sc(1.5, 2, None).unwrap();
        let config = LatticeSfConfig {
            domain_size: 20.0,
            ..Default::default()
        };
        let qxyz: Vec<Vector3D> = (0..400)
            .map(|i| Vector3D::new(0.01 * i as f64, 0.005 * i as f64, 0.0))
            .collect();
        let result = radial_3d_lsf(&qxyz, &sc, &config).unwrap();
        assert_eq!(result.len(), 400);
        assert_eq!(result.column_names()[..4], ["qx", "qy", "qz", "Sq"]);
        assert_eq!(result.y().unwrap(), result.column("Sq").unwrap());
        assert!(result.attr("q_hkl").is_some());
    }
}
