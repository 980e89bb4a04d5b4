/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Structure factor of an oriented crystal at 3D wavevectors
//!
//! Every reciprocal lattice point contributes a product of Gaussians whose widths
//! follow from the domain size along the lattice or user given directions. An optional
//! Gaussian distribution of rotation angles around a lattice direction averages over
//! domain orientations.

use super::common::{ensure_finite, validate_q, with_workers};
use super::errors::{Result, StructureFactorError};
use super::lattice_sf::{beta_values, corrections_at, Beta};
use crate::data::{ColumnRole, DataArray};
use crate::kernels::peaks::fwhm_to_sigma;
use crate::kernels::{debye_waller, rotation_matrix, sum_gauss_peaks, Correction};
use crate::lattice::{Lattice, DEFAULT_PEAK_THRESHOLD};
use crate::utils::quadrature::normal_weights;
use crate::utils::{Matrix3, Vector3D};
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Rows of wavevectors handled by one parallel task
const CHUNK_SIZE: usize = 256;

/// Domain size determining the Gaussian peak widths `σ = fwhm_to_sigma(2π/D)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DomainSize {
    /// Same size in all directions
    Isotropic(f64),
    /// One size along each lattice vector
    PerLatticeVector(Vec<f64>),
    /// Rows of `[size, h, k, l]`, directions should be nearly orthogonal
    PerHkl(Vec<[f64; 4]>),
}

impl Default for DomainSize {
    fn default() -> Self {
        DomainSize::Isotropic(1000.0)
    }
}

impl DomainSize {
    /// Peak width as Cartesian sigma vector
    pub fn peak_sigma(&self, lattice: &Lattice) -> Result<Vector3D> {
        let sigma = |d: f64| -> Result<f64> {
            if d != 0.0 && d.is_finite() {
                Ok(fwhm_to_sigma(2.0 * PI / d.abs()))
            } else {
                Err(StructureFactorError::InvalidParameter(format!(
                    "domain size must be finite and non zero, got {d}"
                )))
            }
        };
        let along = |directions: Vec<(f64, Vector3D)>| -> Result<Vector3D> {
            directions
                .into_iter()
                .try_fold(Vector3D::origin(), |acc, (d, dir)| {
                    if dir.length() == 0.0 {
                        return Err(StructureFactorError::InvalidParameter(
                            "zero direction for a domain size".to_string(),
                        ));
                    }
                    Ok(acc + dir.normalize() * sigma(d)?)
                })
                .map(|v| v.abs())
        };
        let width = match self {
            DomainSize::Isotropic(d) => {
                let s = sigma(*d)?;
                Vector3D::new(s, s, s)
            }
            DomainSize::PerLatticeVector(sizes) => {
                let vectors = lattice.lattice_vectors();
                if sizes.len() != vectors.len() {
                    return Err(StructureFactorError::InvalidParameter(format!(
                        "{} domain sizes for {} lattice vectors",
                        sizes.len(),
                        vectors.len()
                    )));
                }
                along(sizes.iter().copied().zip(vectors.iter().copied()).collect())?
            }
            DomainSize::PerHkl(rows) => along(
                rows.iter()
                    .map(|r| (r[0], lattice.vector_hkl(&[r[1], r[2], r[3]])))
                    .collect(),
            )?,
        };
        if width.x <= 0.0 || width.y <= 0.0 || width.z <= 0.0 {
            return Err(StructureFactorError::InvalidParameter(format!(
                "peak width vanishes along an axis: {width}"
            )));
        }
        Ok(width)
    }

    fn as_attr(&self) -> Vec<Vec<f64>> {
        match self {
            DomainSize::Isotropic(d) => vec![vec![*d]],
            DomainSize::PerLatticeVector(sizes) => vec![sizes.clone()],
            DomainSize::PerHkl(rows) => rows.iter().map(|r| r.to_vec()).collect(),
        }
    }
}

/// Options of the oriented lattice structure factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientedSfConfig {
    pub domain_size: DomainSize,
    /// Root mean square displacement of lattice points
    pub rmsd: f64,
    /// Asymmetry factor, none means 1
    pub beta: Option<Beta>,
    /// Largest Miller index
    pub hkl_max: usize,
    /// `[h, k, l, σ]`: Gaussian average over rotations around direction hkl with width σ in rad
    pub rotation: Option<[f64; 4]>,
    /// Points of the rotation average
    pub n_gauss: usize,
    /// Wavelength in nm, enables the scattering angle and corrections
    pub wavelength: Option<f64>,
    pub corrections: Vec<Correction>,
    /// Relative intensity threshold of the peak selection
    pub threshold: f64,
    /// Number of worker threads, none uses the global pool
    pub workers: Option<usize>,
}

impl Default for OrientedSfConfig {
    fn default() -> Self {
        Self {
            domain_size: DomainSize::default(),
            rmsd: 0.02,
            beta: None,
            hkl_max: 3,
            rotation: None,
            n_gauss: 13,
            wavelength: None,
            corrections: Vec::new(),
            threshold: DEFAULT_PEAK_THRESHOLD,
            workers: None,
        }
    }
}

impl OrientedSfConfig {
    /// Parse a configuration from JSON, missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| StructureFactorError::InvalidParameter(e.to_string()))
    }
}

/// Target wavevectors of a radial average
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RadialGrid {
    /// Number of equal intervals between the smallest and largest |q|
    Points(usize),
    /// Explicit ascending values, empty intervals hold zero
    Values(Vec<f64>),
}

/// Lattice factor at every wavevector, summed over the weighted orientations
fn lattice_factor(
    qxyz: &[Vector3D],
    peaks: &[(Vector3D, f64)],
    sigma: &Vector3D,
    orientations: &[(Option<Matrix3>, f64)],
) -> Vec<f64> {
    let eval = |chunk: &[Vector3D]| -> Vec<f64> {
        let mut total = vec![0.0; chunk.len()];
        for (rotation, weight) in orientations {
            let rotated: Vec<Vector3D> = match rotation {
                Some(r) => chunk.iter().map(|q| q.rotate(r)).collect(),
                None => chunk.to_vec(),
            };
            for (t, v) in total.iter_mut().zip(sum_gauss_peaks(&rotated, peaks, sigma)) {
                *t += weight * v;
            }
        }
        total
    };
    if qxyz.len() <= CHUNK_SIZE {
        eval(qxyz)
    } else {
        qxyz.par_chunks(CHUNK_SIZE).flat_map_iter(eval).collect()
    }
}

/// Structure factor of an oriented lattice at the 3D wavevectors `qxyz`
///
/// `S(q) = 1 + β(|q|)(Z0(q) - 1) DW(|q|)` with
/// `Z0(q) = (2π)^d/v_d Σ f²_hkl Π_i G(q_i - q_hkl,i; σ_i) / Σ|b|²`. Rotating the
/// wavevectors by `-angle` around the rotation axis is equivalent to rotating the crystal.
///
/// # Returns
///
/// Columns `qx`, `qy`, `qz`, `Sq`, `DW`, `beta`, `Z0q`, with a wavelength also
/// `correction` and `theta`. Roles: x = qx, y = Sq, z = qy, w = qz.
pub fn oriented_lattice_structure_factor(
    qxyz: &[Vector3D],
    lattice: &Lattice,
    config: &OrientedSfConfig,
) -> Result<DataArray> {
    let qr: Vec<f64> = qxyz.iter().map(|v| v.length()).collect();
    validate_q(&qr)?;
    let sum_b2 = lattice.sum_b_squared();
    if !(sum_b2 > 0.0) {
        return Err(StructureFactorError::InvalidParameter(
            "unit cell scattering lengths are all zero".to_string(),
        ));
    }
    let sigma = config.domain_size.peak_sigma(lattice)?;

    let reciprocal = lattice.reciprocal_peaks(config.hkl_max, config.threshold)?;
    let peaks: Vec<(Vector3D, f64)> = reciprocal
        .iter()
        .filter(|p| p.q.length() > 0.0)
        .map(|p| (p.q, p.f2))
        .collect();

    let orientations: Vec<(Option<Matrix3>, f64)> = match config.rotation {
        Some([h, k, l, width]) if width != 0.0 => {
            let axis = lattice.vector_hkl(&[h, k, l]);
            normal_weights(0.0, width.abs(), config.n_gauss)?
                .into_iter()
                .map(|(angle, w)| (Some(rotation_matrix(&axis, -angle)), w))
                .collect()
        }
        _ => vec![(None, 1.0)],
    };
    debug!(
        "oriented structure factor: {} peaks, {} orientations, sigma {sigma}",
        peaks.len(),
        orientations.len()
    );

    let summed = with_workers(config.workers, || {
        lattice_factor(qxyz, &peaks, &sigma, &orientations)
    })?;
    let prefactor = (2.0 * PI).powi(lattice.dimension() as i32) / lattice.unit_cell_volume() / sum_b2;
    let z0: Vec<f64> = summed.iter().map(|v| v * prefactor).collect();

    let beta = beta_values(config.beta.as_ref(), &qr)?;
    let dw: Vec<f64> = qr.iter().map(|&v| debye_waller(v, config.rmsd)).collect();
    let mut sq: Vec<f64> = (0..qr.len()).map(|i| 1.0 + beta[i] * (z0[i] - 1.0) * dw[i]).collect();

    let angles = match config.wavelength {
        Some(wavelength) => {
            let (theta, correction) = corrections_at(&qr, wavelength, &config.corrections, true);
            for (s, c) in sq.iter_mut().zip(correction.iter()) {
                *s *= c;
            }
            Some((theta, correction))
        }
        None => None,
    };
    ensure_finite("Sq", &sq)?;
    ensure_finite("Z0q", &z0)?;

    let mut result = DataArray::new();
    result.push_column("qx", qxyz.iter().map(|v| v.x).collect::<Vec<f64>>())?;
    result.push_column("qy", qxyz.iter().map(|v| v.y).collect::<Vec<f64>>())?;
    result.push_column("qz", qxyz.iter().map(|v| v.z).collect::<Vec<f64>>())?;
    result.push_column("Sq", sq)?;
    result.push_column("DW", dw)?;
    result.push_column("beta", beta)?;
    result.push_column("Z0q", z0)?;
    if let Some((theta, correction)) = angles {
        result.push_column("correction", correction)?;
        result.push_column("theta", theta)?;
    }
    result.set_role(ColumnRole::Y, "Sq")?;
    result.set_role(ColumnRole::Z, "qy")?;
    result.set_role(ColumnRole::W, "qz")?;

    result.set_attr("q_hkl", reciprocal.iter().map(|p| p.q).collect::<Vec<Vector3D>>());
    result.set_attr(
        "hkl",
        reciprocal
            .iter()
            .map(|p| p.hkl.iter().map(|&h| h as f64).collect())
            .collect::<Vec<Vec<f64>>>(),
    );
    result.set_attr("sumfi2", sum_b2);
    result.set_attr("peaksigma", sigma);
    result.set_attr("domainsize", config.domain_size.as_attr());
    result.set_attr("rmsd", config.rmsd);
    if let Some(rotation) = config.rotation {
        result.set_attr("rotation", rotation.to_vec());
    }
    Ok(result)
}

/// Radial average of the oriented structure factor
///
/// The oriented result is sorted by `|q|` and averaged in intervals, either `n` equal
/// intervals or intervals around explicit values. Columns are `q`, `Sq`, `DW`, `beta`
/// and `Z0q`.
pub fn radial_oriented_lsf(
    qxyz: &[Vector3D],
    lattice: &Lattice,
    config: &OrientedSfConfig,
    q_out: &RadialGrid,
) -> Result<DataArray> {
    let oriented = oriented_lattice_structure_factor(qxyz, lattice, config)?;
    let mut radial = DataArray::new();
    radial.push_column("q", qxyz.iter().map(|v| v.length()).collect::<Vec<f64>>())?;
    for name in ["Sq", "DW", "beta", "Z0q"] {
        radial.push_column(name, oriented.column(name)?.clone())?;
    }
    for (name, value) in oriented.attrs() {
        radial.set_attr(name, value.clone());
    }
    let sorted = radial.sorted_by_x()?;
    let averaged = match q_out {
        RadialGrid::Points(n) => sorted.prune_mean(*n)?,
        RadialGrid::Values(values) => sorted.bin_mean_onto(values, 0.0)?,
    };
    Ok(averaged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::AttrValue;
    use crate::structure_factor::lattice_sf::{lattice_structure_factor, LatticeSfConfig};
    use approx::assert_relative_eq;

    fn sc() -> Lattice {
        Lattice::sc(2.1, 1, None).unwrap()
    }

    #[test]
    fn test_peak_on_reciprocal_point() {
        let lattice = sc();
        let g = 2.0 * PI / 2.1;
        let qxyz = vec![Vector3D::new(g, 0.0, 0.0), Vector3D::new(0.7 * g, 0.7 * g, 0.0)];
        let config = OrientedSfConfig {
            domain_size: DomainSize::Isotropic(20.0),
            ..Default::default()
        };
        let result = oriented_lattice_structure_factor(&qxyz, &lattice, &config).unwrap();
        let sq = result.column("Sq").unwrap();
        assert!(sq[0] > 10.0);
        assert!(sq[1] < 1.0);
        assert_eq!(result.y().unwrap(), sq);
    }

    #[test]
    fn test_rotation_average_smears_peak() {
        let lattice = sc();
        let g = 2.0 * PI / 2.1;
        let qxyz = vec![Vector3D::new(g, 0.0, 0.0)];
        let sharp = OrientedSfConfig {
            domain_size: DomainSize::Isotropic(20.0),
            ..Default::default()
        };
        let smeared = OrientedSfConfig {
            rotation: Some([0.0, 0.0, 1.0, 0.2]),
            ..sharp.clone()
        };
        let s0 = oriented_lattice_structure_factor(&qxyz, &lattice, &sharp).unwrap();
        let s1 = oriented_lattice_structure_factor(&qxyz, &lattice, &smeared).unwrap();
        assert!(s1.column("Z0q").unwrap()[0] < s0.column("Z0q").unwrap()[0]);
        assert_eq!(
            s1.attr("rotation"),
            Some(&AttrValue::Vector(vec![0.0, 0.0, 1.0, 0.2]))
        );
    }

    #[test]
    fn test_domain_size_variants() {
        let lattice = sc();
        let iso = DomainSize::Isotropic(10.0).peak_sigma(&lattice).unwrap();
        let per_vector = DomainSize::PerLatticeVector(vec![10.0, 10.0, 10.0])
            .peak_sigma(&lattice)
            .unwrap();
        assert_relative_eq!(iso.x, per_vector.x, epsilon = 1e-12);
        let thin = DomainSize::PerHkl(vec![
            [2.0, 0.0, 0.0, 1.0],
            [50.0, 1.0, 0.0, 0.0],
            [50.0, 0.0, 1.0, 0.0],
        ])
        .peak_sigma(&lattice)
        .unwrap();
        assert!(thin.z > 10.0 * thin.x);
        assert!(DomainSize::PerLatticeVector(vec![10.0]).peak_sigma(&lattice).is_err());
    }

    #[test]
    fn test_radial_average_follows_powder_peak() {
        let lattice = Lattice::sc(2.1, 3, None).unwrap();
        let n = 120;
        let qxyz: Vec<Vector3D> = (0..n * n)
            .map(|i| {
                let x = -6.0 + 12.0 * (i / n) as f64 / (n - 1) as f64;
                let y = -6.0 + 12.0 * (i % n) as f64 / (n - 1) as f64;
                Vector3D::new(x, y, 0.0)
            })
            .collect();
        let config = OrientedSfConfig {
            domain_size: DomainSize::Isotropic(10.0),
            ..Default::default()
        };
        let radial = radial_oriented_lsf(&qxyz, &lattice, &config, &RadialGrid::Points(40)).unwrap();
        assert!(radial.len() <= 40);
        let q = radial.column("q").unwrap();
        assert!(q.to_vec().windows(2).all(|w| w[0] <= w[1]));

        let values = RadialGrid::Values(vec![1.0, 2.0, 3.0, 20.0]);
        let fixed = radial_oriented_lsf(&qxyz, &lattice, &config, &values).unwrap();
        assert_eq!(fixed.column("q").unwrap().to_vec(), vec![1.0, 2.0, 3.0, 20.0]);
        assert_eq!(fixed.column("Sq").unwrap()[3], 0.0);

        // the powder peak sits at the same |q|
        let powder = lattice_structure_factor(
            &[2.0 * PI / 2.1],
            &lattice,
            &LatticeSfConfig {
                domain_size: 10.0,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(powder.column("Sq").unwrap()[0] > 1.0);
    }
}
