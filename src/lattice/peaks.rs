/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Reciprocal lattice peaks with unit cell structure factors and multiplicities

use super::core::Lattice;
use super::errors::{LatticeError, Result};
use crate::utils::Vector3D;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;

/// Default relative threshold of the selection rule
pub const DEFAULT_PEAK_THRESHOLD: f64 = 1e-3;

/// Grouping resolution of peak positions in the radial peak list
const RADIAL_RESOLUTION: f64 = 1e7;

/// A reciprocal lattice point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReciprocalPeak {
    /// Wavevector `Σ h_i b_i` in 1/nm
    pub q: Vector3D,
    /// Squared unit cell structure factor `|f_hkl|²`
    pub f2: f64,
    /// Miller indices, zero beyond the lattice dimension
    pub hkl: [i64; 3],
}

/// Peaks sharing the same wavevector magnitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadialPeak {
    /// Wavevector magnitude in 1/nm
    pub q: f64,
    /// Squared structure factor of the representative peak
    pub f2: f64,
    /// Number of peaks with this magnitude
    pub multiplicity: usize,
    /// Miller indices of the representative peak
    pub hkl: [i64; 3],
}

impl Lattice {
    /// Squared unit cell structure factor `|Σ_j b_j exp(2πi h·r_j)|²`
    pub fn f2_hkl(&self, hkl: &[i64; 3]) -> f64 {
        let f: Complex64 = self
            .unit_cell_atoms
            .iter()
            .zip(self.unit_cell_b.iter())
            .map(|(frac, b)| {
                let phase: f64 = frac
                    .iter()
                    .zip(hkl.iter())
                    .map(|(r, h)| r * *h as f64)
                    .sum();
                b * Complex64::from_polar(1.0, 2.0 * PI * phase)
            })
            .sum();
        f.norm_sqr()
    }

    /// Enumerate reciprocal lattice points with all Miller indices in `[-m, m]`
    ///
    /// Peaks with `|f_hkl|² <= threshold · max|f_hkl|²` are dropped, which
    /// removes extinct reflections. Order is lexicographic in (h, k, l).
    ///
    /// # Arguments
    ///
    /// * `m` - Largest Miller index
    /// * `threshold` - Relative intensity threshold of the selection rule
    pub fn reciprocal_peaks(&self, m: usize, threshold: f64) -> Result<Vec<ReciprocalPeak>> {
        self.require_periodic("reciprocal lattice")?;
        if !(0.0..1.0).contains(&threshold) {
            return Err(LatticeError::InvalidParameter(format!(
                "peak threshold must be in [0, 1), got {threshold}"
            )));
        }
        let dim = self.reciprocal_vectors.len();
        let m = m as i64;
        let range = |axis: usize| if axis < dim { -m..=m } else { 0..=0 };

        let mut peaks = Vec::new();
        for h in range(0) {
            for k in range(1) {
                for l in range(2) {
                    let hkl = [h, k, l];
                    let q = self
                        .reciprocal_vectors
                        .iter()
                        .zip(hkl.iter())
                        .fold(Vector3D::origin(), |acc, (b, i)| acc + *b * *i as f64);
                    peaks.push(ReciprocalPeak {
                        q,
                        f2: self.f2_hkl(&hkl),
                        hkl,
                    });
                }
            }
        }

        let max = peaks.iter().fold(0.0_f64, |m, p| m.max(p.f2));
        if max <= 0.0 {
            return Ok(Vec::new());
        }
        peaks.retain(|p| p.f2 > threshold * max);
        Ok(peaks)
    }

    /// Radially grouped peaks sorted by ascending wavevector magnitude
    ///
    /// Magnitudes agreeing within 1e-7 form one group whose multiplicity is the
    /// group size. The representative is the lexicographically last member, so
    /// positive indices like (1, 1, 1) are reported. The origin is excluded.
    pub fn radial_peaks(&self, m: usize) -> Result<Vec<RadialPeak>> {
        self.radial_peaks_above(m, DEFAULT_PEAK_THRESHOLD)
    }

    /// Radially grouped peaks with a custom selection threshold
    pub fn radial_peaks_above(&self, m: usize, threshold: f64) -> Result<Vec<RadialPeak>> {
        let peaks = self.reciprocal_peaks(m, threshold)?;
        let mut groups: BTreeMap<i64, RadialPeak> = BTreeMap::new();
        for peak in peaks {
            let key = (peak.q.length() * RADIAL_RESOLUTION).floor() as i64;
            if key == 0 {
                continue;
            }
            let entry = groups.entry(key).or_insert(RadialPeak {
                q: key as f64 / RADIAL_RESOLUTION,
                f2: peak.f2,
                multiplicity: 0,
                hkl: peak.hkl,
            });
            entry.multiplicity += 1;
            entry.f2 = peak.f2;
            entry.hkl = peak.hkl;
        }
        Ok(groups.into_values().collect())
    }

    /// Bragg angles `2 asin(q λ/4π)` of the radial peaks in degrees
    ///
    /// Peaks beyond the reach of the wavelength are dropped.
    pub fn scattering_angles(&self, m: usize, wavelength: f64) -> Result<Vec<f64>> {
        if !(wavelength > 0.0) {
            return Err(LatticeError::InvalidParameter(format!(
                "wavelength must be positive, got {wavelength}"
            )));
        }
        Ok(self
            .radial_peaks(m)?
            .iter()
            .map(|p| p.q * wavelength / 4.0 / PI)
            .filter(|x| x.abs() < 1.0)
            .map(|x| (2.0 * x.asin()).to_degrees())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fcc_selection_rule() {
        let fcc = Lattice::fcc(1.5, 2, None).unwrap();
        let peaks = fcc.reciprocal_peaks(3, DEFAULT_PEAK_THRESHOLD).unwrap();
        assert!(!peaks.is_empty());
        for p in &peaks {
            let parity: Vec<i64> = p.hkl.iter().map(|h| h.rem_euclid(2)).collect();
            assert!(parity.iter().all(|&x| x == parity[0]), "{:?}", p.hkl);
            assert_relative_eq!(p.f2, 16.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_radial_peaks_sc() {
        let sc = Lattice::sc(2.0, 1, None).unwrap();
        let radial = sc.radial_peaks(1).unwrap();
        assert_eq!(radial.len(), 3);
        assert_relative_eq!(radial[0].q, PI, epsilon = 1e-6);
        assert_eq!(radial[0].multiplicity, 6);
        assert_eq!(radial[0].hkl, [1, 0, 0]);
        assert_eq!(radial[1].multiplicity, 12);
        assert_eq!(radial[2].multiplicity, 8);
        assert_eq!(radial[2].hkl, [1, 1, 1]);
    }

    #[test]
    fn test_scattering_angles() {
        let sc = Lattice::sc(0.5, 1, None).unwrap();
        let angles = sc.scattering_angles(1, 0.15406).unwrap();
        let expected = (2.0 * (2.0 * PI / 0.5 * 0.15406 / 4.0 / PI).asin()).to_degrees();
        assert_relative_eq!(angles[0], expected, epsilon = 1e-4);
        assert!(sc.scattering_angles(1, -1.0).is_err());
    }
}
