/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Hydrodynamic function H(q) of spheres in suspension
//!
//! H(q) corrects the collective diffusion `D(q) = D0 H(q)/S(q)` for hydrodynamic
//! interactions. The many body interaction follows the δγ-expansion of Beenakker and
//! Mazur in the form of Genz and Klein, which depends on the structure factor only.

use super::common::{validate_q, with_workers, Concentration};
use super::errors::{Result, StructureFactorError};
use super::percus_yevick::percus_yevick_values;
use crate::data::DataArray;
use crate::utils::math::{evaluate_polynomial, linspace, polynomial_fit, trapezoid};
use crate::utils::special::{bessel_j_half, sine_integral};
use log::debug;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Largest volume fraction the expansion is valid for
const MAX_VOLUME_FRACTION: f64 = 0.5;

/// `φ γ0^(m/n)` of Beenakker and Mazur, rows of volume fraction and four orders
const GAMMA0_TABLE: [[f64; 5]; 10] = [
    [0.00, 0.0, 0.0, 0.0, 0.0],
    [0.05, 0.0553, 0.0542, 0.0533, 0.0525],
    [0.10, 0.1228, 0.1177, 0.1135, 0.1104],
    [0.15, 0.2048, 0.1918, 0.1813, 0.1738],
    [0.20, 0.3038, 0.2777, 0.2574, 0.2432],
    [0.25, 0.4224, 0.3766, 0.3423, 0.3186],
    [0.30, 0.5627, 0.4895, 0.4364, 0.4005],
    [0.35, 0.7267, 0.6172, 0.5402, 0.4888],
    [0.40, 0.9157, 0.7601, 0.6538, 0.5839],
    [0.45, 1.1310, 0.9183, 0.7776, 0.6856],
];

/// Fourth order fits of the γ0 table columns, ascending coefficients
static GAMMA0_POLYNOMIALS: Lazy<std::result::Result<Vec<Vec<f64>>, String>> = Lazy::new(|| {
    let phi: Vec<f64> = GAMMA0_TABLE.iter().map(|row| row[0]).collect();
    (1..5)
        .map(|column| {
            let y: Vec<f64> = GAMMA0_TABLE.iter().map(|row| row[column]).collect();
            polynomial_fit(&phi, &y, 4).map_err(|e| e.to_string())
        })
        .collect()
});

/// `γ0^(m/n) - 1` at volume fraction `phi`
fn gamma0_minus_one(phi: f64) -> Result<[f64; 4]> {
    let polynomials = GAMMA0_POLYNOMIALS
        .as_ref()
        .map_err(|e| StructureFactorError::InvalidParameter(format!("γ0 fit failed: {e}")))?;
    let mut mm1 = [0.0; 4];
    for (m, coeffs) in mm1.iter_mut().zip(polynomials.iter()) {
        *m = if phi == 0.0 {
            // limit of poly(φ)/φ
            coeffs.get(1).copied().unwrap_or(0.0) - 1.0
        } else {
            evaluate_polynomial(phi, coeffs) / phi - 1.0
        };
    }
    Ok(mm1)
}

/// `S_γ(x)` of Genz and Klein, accurate to second order in the volume fraction
fn s_gamma(xx: f64, mm1: &[f64; 4]) -> f64 {
    let x = if xx == 0.0 { 1e-5 } else { xx };
    let x2 = 2.0 * x;
    let x3 = x * x * x;
    let x4 = x3 * x;
    let (s, c) = x.sin_cos();
    let cx = if xx == 0.0 {
        2.5
    } else {
        4.5 * (sine_integral(x2) / x + 0.5 * x2.cos() / (x * x) + 0.25 * x2.sin() / x3
            - s * s / x4
            - 4.0 / (x3 * x3) * (s - x * c).powi(2))
    };
    let pre = 9.0 / 4.0 * PI;
    cx + pre * 5.0 / 9.0 * mm1[0] * 9.0 / x3 * bessel_j_half(1, x).powi(2)
        + pre * mm1[1] * 25.0 / x3 * bessel_j_half(2, x).powi(2)
        + pre * mm1[2] * 49.0 / x3 * bessel_j_half(3, x).powi(2)
        + pre * mm1[3] * 81.0 / x3 * bessel_j_half(4, x).powi(2)
}

fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        x.sin() / x
    }
}

/// Ascending union of two grids, duplicates removed
fn union_grid(a: Vec<f64>, b: Vec<f64>) -> Vec<f64> {
    let mut grid: Vec<f64> = a.into_iter().chain(b).collect();
    grid.sort_by(f64::total_cmp);
    grid.dedup();
    grid
}

/// Options of the hydrodynamic function
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HydrodynamicConfig {
    /// Intrinsic viscosity `[η]`, sets `H∞ = 1/(1 + [η]φ)`
    pub intrinsic_viscosity: Option<f64>,
    /// Explicit high q limit `Ds/D0`, overrides the intrinsic viscosity
    pub ds_over_d0: Option<f64>,
    /// Integration points per π interval
    pub number_of_points: usize,
    /// Number of worker threads, none uses the global pool
    pub workers: Option<usize>,
}

impl Default for HydrodynamicConfig {
    fn default() -> Self {
        Self {
            intrinsic_viscosity: None,
            ds_over_d0: None,
            number_of_points: 50,
            workers: None,
        }
    }
}

impl HydrodynamicConfig {
    /// Parse a configuration from JSON, missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| StructureFactorError::InvalidParameter(e.to_string()))
    }
}

/// Self diffusion `Ds/D0 = 2/π ∫ sinc²(x)/(1 + φ S_γ(x)) dx` up to x = 153π
pub fn self_diffusion(phi: f64, number_of_points: usize) -> Result<f64> {
    let mm1 = gamma0_minus_one(phi)?;
    let n = number_of_points.max(2);
    let ak = union_grid(linspace(0.0, 3.0 * PI, 3 * n), linspace(3.0 * PI, 153.0 * PI, 50 * n));
    let integrand: Vec<f64> = ak
        .iter()
        .map(|&x| sinc(x).powi(2) / (1.0 + phi * s_gamma(x, &mm1)))
        .collect();
    Ok(2.0 / PI * trapezoid(&integrand, &ak))
}

/// Wavevector dependent part `H(q) - H∞` at a single q
fn distinct_part<F>(q: f64, rh: f64, phi: f64, mm1: &[f64; 4], n: usize, sf: &F) -> Result<f64>
where
    F: Fn(&[f64]) -> Result<Vec<f64>>,
{
    let ak = union_grid(linspace(0.0, 3.0 * PI, 3 * n), linspace(2.0 * PI, 53.0 * PI, 4 * n));
    let x: Vec<f64> = linspace(PI, 0.0, 2 * n).into_iter().map(f64::cos).collect();

    let qmk: Vec<f64> = ak
        .iter()
        .flat_map(|&a| {
            let k = a / rh;
            x.iter()
                .map(move |&xx| (q * q + k * k - 2.0 * q * k * xx).max(0.0).sqrt())
        })
        .collect();
    let sq = sf(&qmk)?;
    if sq.len() != qmk.len() {
        return Err(StructureFactorError::InvalidParameter(format!(
            "structure factor returned {} values for {} wavevectors",
            sq.len(),
            qmk.len()
        )));
    }

    let inner: Vec<f64> = ak
        .iter()
        .enumerate()
        .map(|(i, &a)| {
            let row = &sq[i * x.len()..(i + 1) * x.len()];
            let integrand: Vec<f64> = x
                .iter()
                .zip(row.iter())
                .map(|(&xx, &s)| (1.0 - xx * xx) * (s - 1.0))
                .collect();
            sinc(a).powi(2) / (1.0 + phi * s_gamma(a, mm1)) * trapezoid(&integrand, &x)
        })
        .collect();
    Ok(3.0 / (2.0 * PI) * trapezoid(&inner, &ak))
}

/// Hydrodynamic function with a Percus-Yevick structure factor of radius `rh`
///
/// See [`hydrodynamic_function_with`].
pub fn hydrodynamic_function(
    q: &[f64],
    rh: f64,
    concentration: Concentration,
    config: &HydrodynamicConfig,
) -> Result<DataArray> {
    let (eta, _) = concentration.resolve(rh)?;
    hydrodynamic_function_with(q, rh, concentration, config, move |k: &[f64]| {
        Ok(percus_yevick_values(k, rh, eta))
    })
}

/// Hydrodynamic function H(q) for any structure factor
///
/// `H(q) = H∞ + 3/(2π) ∫dk sinc²(kRh)/(1 + φS_γ(kRh)) ∫dx (1 - x²)(S(|q - k|) - 1)`
///
/// # Arguments
///
/// * `q` - Wavevectors in 1/nm
/// * `rh` - Hydrodynamic radius in nm, defines the volume fraction of the expansion
/// * `concentration` - Volume fraction or molarity in mol/l
/// * `config` - High q limit, integration points and workers
/// * `structure_factor` - S(q) at arbitrary wavevectors with `S(∞) = 1`
///
/// # Returns
///
/// Columns `q`, `H`, `DsoverD0` (the q dependent part `H - H∞`) and
/// `structureFactor`.
pub fn hydrodynamic_function_with<F>(
    q: &[f64],
    rh: f64,
    concentration: Concentration,
    config: &HydrodynamicConfig,
    structure_factor: F,
) -> Result<DataArray>
where
    F: Fn(&[f64]) -> Result<Vec<f64>> + Sync,
{
    validate_q(q)?;
    if !(rh > 0.0) {
        return Err(StructureFactorError::InvalidParameter(
            "hydrodynamic radius must be positive".to_string(),
        ));
    }
    let (phi, molarity) = concentration.resolve(rh)?;
    if phi > MAX_VOLUME_FRACTION || phi < 0.0 {
        return Err(StructureFactorError::InvalidParameter(format!(
            "volume fraction {phi:.3} out of [0, 0.5], choose another Rh or molarity"
        )));
    }
    let n = config.number_of_points.max(2);
    let mm1 = gamma0_minus_one(phi)?;

    let ds = self_diffusion(phi, n)?;
    let (h_inf, ds_over_d0) = match (config.ds_over_d0, config.intrinsic_viscosity) {
        (Some(d), _) => (d, d),
        (None, Some(visc)) => {
            let d = 1.0 / (1.0 + visc * phi);
            (d, d)
        }
        (None, None) => (ds, ds),
    };
    debug!("hydrodynamic function: phi {phi:.4}, Ds/D0 integral {ds:.4}, H∞ {h_inf:.4}");

    let distinct: Vec<f64> = with_workers(config.workers, || {
        q.par_iter()
            .map(|&qq| distinct_part(qq, rh, phi, &mm1, n, &structure_factor))
            .collect::<Result<Vec<f64>>>()
    })??;
    let sq = structure_factor(q)?;

    let mut result = DataArray::new();
    result.push_column("q", q.to_vec())?;
    result.push_column("H", distinct.iter().map(|d| h_inf + d).collect::<Vec<f64>>())?;
    result.push_column("DsoverD0", distinct)?;
    result.push_column("structureFactor", sq)?;
    result.set_attr("Rh", rh);
    result.set_attr("molarity", molarity);
    result.set_attr("phi_Rh", phi);
    result.set_attr("DsoverD0", ds_over_d0);
    if let Some(visc) = config.intrinsic_viscosity {
        result.set_attr("intrinsicVisc", visc);
    }
    result.set_attr("numberOfPoints", n);
    Ok(result)
}
