/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Pseudo random (Halton) and uniformly random point sets in a box

use super::core::{broadcast_b, Lattice, LatticeKind, LatticePoint};
use super::errors::{LatticeError, Result};
use crate::utils::Vector3D;
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const HALTON_BASES: [u64; 3] = [2, 3, 5];

/// Radical inverse of `index` in `base`, the Halton sequence element
pub fn halton(mut index: u64, base: u64) -> f64 {
    let mut f = 1.0;
    let mut r = 0.0;
    while index > 0 {
        f /= base as f64;
        r += f * (index % base) as f64;
        index /= base;
    }
    r
}

fn check_box(size: &[f64]) -> Result<()> {
    if !(1..=3).contains(&size.len()) {
        return Err(LatticeError::DimensionMismatch(format!(
            "a random lattice box needs 1 to 3 edges, got {}",
            size.len()
        )));
    }
    if size.iter().any(|s| !(*s > 0.0 && s.is_finite())) {
        return Err(LatticeError::InvalidParameter(format!(
            "box edges must be positive, got {size:?}"
        )));
    }
    Ok(())
}

fn random_lattice(kind: LatticeKind, size: &[f64], atoms: Vec<Vec<f64>>, b: Vec<Complex64>, seed: u64) -> Lattice {
    Lattice {
        kind,
        lattice_vectors: Vec::new(),
        size: Vec::new(),
        unit_cell_atoms: atoms,
        unit_cell_b: b,
        points: Vec::new(),
        reciprocal_vectors: Vec::new(),
        unit_cell_volume: size.iter().product(),
        extent: size.to_vec(),
        seed,
    }
}

impl Lattice {
    /// Low discrepancy point set in the box `[0, size_i]`
    ///
    /// Points follow a Halton sequence with bases 2, 3 and 5 that skips the first
    /// `seed` elements. Each sequence point carries the basis atoms, given as
    /// absolute offsets in nm.
    ///
    /// # Arguments
    ///
    /// * `size` - Box edge per dimension
    /// * `n` - Number of sequence points
    /// * `unit_cell_atoms` - Offsets of basis atoms, `None` is a single atom
    /// * `b` - Scattering lengths of the basis atoms
    /// * `seed` - Number of skipped sequence elements
    pub fn pseudo_random(
        size: &[f64],
        n: usize,
        unit_cell_atoms: Option<&[Vec<f64>]>,
        b: Option<&[f64]>,
        seed: u64,
    ) -> Result<Self> {
        check_box(size)?;
        let dim = size.len();
        let atoms: Vec<Vec<f64>> = match unit_cell_atoms {
            Some(a) if !a.is_empty() => a
                .iter()
                .map(|off| (0..dim).map(|i| off.get(i).copied().unwrap_or(0.0)).collect())
                .collect(),
            _ => vec![vec![0.0; dim]],
        };
        let b = broadcast_b(b, atoms.len())?;
        let mut lattice = random_lattice(LatticeKind::PseudoRandom, size, atoms, b, seed);
        lattice.append_points(n, None)?;
        Ok(lattice)
    }

    /// Uniformly random points in the box `[0, size_i]`
    ///
    /// Scattering lengths are assigned cyclically from `b`.
    pub fn random(size: &[f64], n: usize, b: Option<&[f64]>, seed: u64) -> Result<Self> {
        check_box(size)?;
        let b: Vec<Complex64> = match b {
            Some(values) if !values.is_empty() => {
                values.iter().map(|&v| Complex64::new(v, 0.0)).collect()
            }
            _ => vec![Complex64::new(1.0, 0.0)],
        };
        let atoms = vec![vec![0.0; size.len()]];
        let mut lattice = random_lattice(LatticeKind::Random, size, atoms, b, seed);
        lattice.append_points(n, None)?;
        Ok(lattice)
    }

    /// Add `n` points continuing the sequence of a random lattice
    ///
    /// Pseudo random lattices continue the Halton sequence at `seed` plus the
    /// current point count. `b` replaces the basis scattering lengths for the new
    /// points only.
    pub fn append_points(&mut self, n: usize, b: Option<&[f64]>) -> Result<()> {
        let dim = self.extent.len();
        let skip = self.seed + self.points.len() as u64;
        match self.kind {
            LatticeKind::PseudoRandom => {
                let b = match b {
                    Some(values) => broadcast_b(Some(values), self.unit_cell_atoms.len())?,
                    None => self.unit_cell_b.clone(),
                };
                let offsets = self.unit_cell_atom_positions();
                let mut new_points = Vec::with_capacity(n * offsets.len());
                for k in 0..n as u64 {
                    let index = skip + k + 1;
                    let coords: Vec<f64> = (0..dim)
                        .map(|d| halton(index, HALTON_BASES[d]) * self.extent[d])
                        .collect();
                    let base = Vector3D::from_slice(&coords);
                    for (offset, bj) in offsets.iter().zip(b.iter()) {
                        new_points.push(LatticePoint {
                            position: base + *offset,
                            b: bj.re,
                        });
                    }
                }
                self.points.extend(new_points);
            }
            LatticeKind::Random => {
                let b: Vec<f64> = match b {
                    Some(values) if !values.is_empty() => values.to_vec(),
                    _ => self.unit_cell_b.iter().map(|c| c.re).collect(),
                };
                let mut rng = StdRng::seed_from_u64(skip);
                let start = self.points.len();
                for k in 0..n {
                    let coords: Vec<f64> = self.extent.iter().map(|s| rng.gen::<f64>() * s).collect();
                    self.points.push(LatticePoint {
                        position: Vector3D::from_slice(&coords),
                        b: b[(start + k) % b.len()],
                    });
                }
            }
            kind => {
                return Err(LatticeError::InvalidParameter(format!(
                    "cannot append points to a {kind} lattice"
                )))
            }
        }
        Ok(())
    }

    /// Box edges of a random lattice, empty for periodic lattices
    pub fn box_size(&self) -> &[f64] {
        &self.extent
    }

    /// Skip of the Halton sequence or seed of the generator
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_halton() {
        assert_relative_eq!(halton(1, 2), 0.5);
        assert_relative_eq!(halton(3, 2), 0.75);
        assert_relative_eq!(halton(1, 3), 1.0 / 3.0);
        assert_relative_eq!(halton(4, 3), 4.0 / 9.0);
    }

    #[test]
    fn test_pseudo_random_append_matches_single_run() {
        let size = [10.0, 20.0, 5.0];
        let full = Lattice::pseudo_random(&size, 20, None, None, 7).unwrap();
        let mut split = Lattice::pseudo_random(&size, 12, None, None, 7).unwrap();
        split.append_points(8, None).unwrap();
        assert_eq!(full.all_points(), split.all_points());
        assert_eq!(full.dimension(), 3);
        assert!(full
            .all_points()
            .iter()
            .all(|p| (0.0..=10.0).contains(&p.position.x) && (0.0..=5.0).contains(&p.position.z)));
        assert!(full.reciprocal_peaks(2, 1e-3).is_err());
    }

    #[test]
    fn test_pseudo_random_basis() {
        let atoms = vec![vec![0.0, 0.0], vec![0.1, 0.0]];
        let lattice = Lattice::pseudo_random(&[1.0, 1.0], 5, Some(&atoms), Some(&[1.0, 3.0]), 0).unwrap();
        let points = lattice.all_points();
        assert_eq!(points.len(), 10);
        assert_relative_eq!(points[1].position.x - points[0].position.x, 0.1, epsilon = 1e-12);
        assert_relative_eq!(points[1].b, 3.0);
    }

    #[test]
    fn test_random_is_seeded() {
        let a = Lattice::random(&[3.0, 3.0], 50, Some(&[1.0, 2.0]), 42).unwrap();
        let b = Lattice::random(&[3.0, 3.0], 50, Some(&[1.0, 2.0]), 42).unwrap();
        assert_eq!(a.all_points(), b.all_points());
        assert_eq!(a.box_size(), &[3.0, 3.0]);
        assert_relative_eq!(a.all_points()[1].b, 2.0);
        assert!(Lattice::random(&[3.0, -1.0], 5, None, 0).is_err());
    }
}
