/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Lattice record: lattice vectors, basis, materialized points and reciprocal vectors

use super::errors::{LatticeError, Result};
use crate::utils::constants::B_TOLERANCE;
use crate::utils::Vector3D;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Smallest accepted ratio of cell volume to the product of the edge lengths
const DEGENERATE_CELL_TOLERANCE: f64 = 1e-12;

/// Kind of lattice, fixed by the constructor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LatticeKind {
    Rhombic,
    Bravais,
    Sc,
    Bcc,
    Fcc,
    Diamond,
    Hex,
    Honeycomb,
    Hcp,
    Square,
    Hex2D,
    Lamellar,
    Cif,
    PseudoRandom,
    Random,
}

impl LatticeKind {
    /// Short type name, honeycomb and 2D hexagonal lattices report `hex`
    pub fn name(&self) -> &'static str {
        match self {
            LatticeKind::Rhombic => "rhombic",
            LatticeKind::Bravais => "bravais",
            LatticeKind::Sc => "sc",
            LatticeKind::Bcc => "bcc",
            LatticeKind::Fcc => "fcc",
            LatticeKind::Diamond => "diamond",
            LatticeKind::Hex | LatticeKind::Honeycomb | LatticeKind::Hex2D => "hex",
            LatticeKind::Hcp => "hcp",
            LatticeKind::Square => "sq",
            LatticeKind::Lamellar => "lam",
            LatticeKind::Cif => "cif",
            LatticeKind::PseudoRandom => "pseudorandom",
            LatticeKind::Random => "random",
        }
    }

    /// True for lattices without translational order
    pub fn is_random(&self) -> bool {
        matches!(self, LatticeKind::PseudoRandom | LatticeKind::Random)
    }
}

impl fmt::Display for LatticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Per-axis extent of a lattice, each axis runs over `-s..=s`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extent {
    /// Same extent along every lattice vector
    Uniform(usize),
    /// Extent per lattice vector
    PerAxis(Vec<usize>),
}

impl Extent {
    /// Extents for a lattice of dimension `dim`
    pub fn resolve(&self, dim: usize) -> Vec<usize> {
        match self {
            Extent::Uniform(s) => vec![*s; dim],
            Extent::PerAxis(v) => v.clone(),
        }
    }
}

impl From<usize> for Extent {
    fn from(s: usize) -> Self {
        Extent::Uniform(s)
    }
}

impl From<Vec<usize>> for Extent {
    fn from(v: Vec<usize>) -> Self {
        Extent::PerAxis(v)
    }
}

impl<const N: usize> From<[usize; N]> for Extent {
    fn from(v: [usize; N]) -> Self {
        Extent::PerAxis(v.to_vec())
    }
}

/// A lattice point with its scattering length
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatticePoint {
    /// Absolute position in nm
    pub position: Vector3D,
    /// Scattering length, zero marks an empty site
    pub b: f64,
}

impl LatticePoint {
    /// True if the scattering length is not zero
    pub fn is_occupied(&self) -> bool {
        self.b.abs() > B_TOLERANCE
    }
}

/// Periodic or random point set in one, two or three dimensions
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    pub(crate) kind: LatticeKind,
    pub(crate) lattice_vectors: Vec<Vector3D>,
    pub(crate) size: Vec<usize>,
    pub(crate) unit_cell_atoms: Vec<Vec<f64>>,
    pub(crate) unit_cell_b: Vec<Complex64>,
    pub(crate) points: Vec<LatticePoint>,
    pub(crate) reciprocal_vectors: Vec<Vector3D>,
    pub(crate) unit_cell_volume: f64,
    /// Box size of random lattices
    pub(crate) extent: Vec<f64>,
    /// Skip of the Halton sequence of pseudo random lattices
    pub(crate) seed: u64,
}

/// Broadcast a scattering length list onto `n` basis atoms
pub(crate) fn broadcast_b(b: Option<&[f64]>, n: usize) -> Result<Vec<Complex64>> {
    match b {
        None | Some([]) => Ok(vec![Complex64::new(1.0, 0.0); n]),
        Some([single]) => Ok(vec![Complex64::new(*single, 0.0); n]),
        Some(values) if values.len() == n => {
            Ok(values.iter().map(|&v| Complex64::new(v, 0.0)).collect())
        }
        Some(values) => Err(LatticeError::DimensionMismatch(format!(
            "{} scattering lengths for {} unit cell atoms",
            values.len(),
            n
        ))),
    }
}

/// Area of the cell spanned by two vectors
fn cell_area(a: &Vector3D, b: &Vector3D) -> f64 {
    a.cross(b).length()
}

impl Lattice {
    /// Create a rhombic lattice with a multi atom basis and real scattering lengths
    ///
    /// # Arguments
    ///
    /// * `lattice_vectors` - One, two or three vectors spanning the unit cell
    /// * `size` - Extent along each lattice vector, axis i runs over `-s_i..=s_i`
    /// * `unit_cell_atoms` - Fractional coordinates of the basis atoms, `None` is a single atom at the origin
    /// * `b` - Scattering lengths of the basis atoms, one value is used for all
    ///
    /// # Returns
    ///
    /// The lattice or an error for inconsistent dimensions or a zero cell volume
    pub fn rhombic(
        lattice_vectors: &[Vector3D],
        size: impl Into<Extent>,
        unit_cell_atoms: Option<&[Vec<f64>]>,
        b: Option<&[f64]>,
    ) -> Result<Self> {
        let n_atoms = unit_cell_atoms.map_or(1, |a| a.len().max(1));
        let b = broadcast_b(b, n_atoms)?;
        Self::rhombic_complex(lattice_vectors, size, unit_cell_atoms, &b)
    }

    /// Create a rhombic lattice with complex scattering lengths
    ///
    /// Materialized points carry the real part, peak structure factors use the full
    /// complex amplitudes.
    pub fn rhombic_complex(
        lattice_vectors: &[Vector3D],
        size: impl Into<Extent>,
        unit_cell_atoms: Option<&[Vec<f64>]>,
        b: &[Complex64],
    ) -> Result<Self> {
        let dim = lattice_vectors.len();
        if !(1..=3).contains(&dim) {
            return Err(LatticeError::DimensionMismatch(format!(
                "a lattice needs 1 to 3 lattice vectors, got {dim}"
            )));
        }
        let size = size.into().resolve(dim);
        if size.len() != dim {
            return Err(LatticeError::DimensionMismatch(format!(
                "{} lattice vectors but size has {} entries",
                dim,
                size.len()
            )));
        }
        let atoms: Vec<Vec<f64>> = match unit_cell_atoms {
            Some(a) if !a.is_empty() => a
                .iter()
                .map(|frac| (0..dim).map(|i| frac.get(i).copied().unwrap_or(0.0)).collect())
                .collect(),
            _ => vec![vec![0.0; dim]],
        };
        if atoms.len() != b.len() {
            return Err(LatticeError::DimensionMismatch(format!(
                "{} unit cell atoms but {} scattering lengths",
                atoms.len(),
                b.len()
            )));
        }
        if lattice_vectors
            .iter()
            .any(|v| !(v.x.is_finite() && v.y.is_finite() && v.z.is_finite()))
        {
            return Err(LatticeError::InvalidParameter(
                "lattice vectors must be finite".to_string(),
            ));
        }

        let mut lattice = Lattice {
            kind: LatticeKind::Rhombic,
            lattice_vectors: lattice_vectors.to_vec(),
            size,
            unit_cell_atoms: atoms,
            unit_cell_b: b.to_vec(),
            points: Vec::new(),
            reciprocal_vectors: Vec::new(),
            unit_cell_volume: 0.0,
            extent: Vec::new(),
            seed: 0,
        };
        lattice.make_reciprocal_vectors()?;
        lattice.make_points();
        Ok(lattice)
    }

    /// Set the kind after construction by a specialized constructor
    pub(crate) fn with_kind(mut self, kind: LatticeKind) -> Self {
        self.kind = kind;
        self
    }

    /// Recompute cell volume and reciprocal vectors from the lattice vectors
    pub(crate) fn make_reciprocal_vectors(&mut self) -> Result<()> {
        let a = &self.lattice_vectors;
        let (volume, reciprocal) = match a.len() {
            3 => {
                let v = a[0].dot(&a[1].cross(&a[2]));
                let r = vec![
                    a[1].cross(&a[2]) * (2.0 * PI / v),
                    a[2].cross(&a[0]) * (2.0 * PI / v),
                    a[0].cross(&a[1]) * (2.0 * PI / v),
                ];
                (v.abs(), r)
            }
            2 => {
                let area = cell_area(&a[0], &a[1]);
                let normal = a[0].cross(&a[1]).normalize();
                let p0 = a[1].cross(&normal);
                let p1 = normal.cross(&a[0]);
                let r = vec![
                    p0 * (2.0 * PI / a[0].dot(&p0)),
                    p1 * (2.0 * PI / a[1].dot(&p1)),
                ];
                (area, r)
            }
            _ => {
                let len = a[0].length();
                (len, vec![a[0] * (2.0 * PI / (len * len))])
            }
        };
        // |det| relative to the product of the edge lengths
        let scale: f64 = a.iter().map(|v| v.length()).product();
        if !(volume > DEGENERATE_CELL_TOLERANCE * scale)
            || reciprocal.iter().any(|v| !v.length().is_finite())
        {
            return Err(LatticeError::DegenerateLattice(format!(
                "unit cell volume is {volume}"
            )));
        }
        self.unit_cell_volume = volume;
        self.reciprocal_vectors = reciprocal;
        Ok(())
    }

    /// Materialize all points, basis atom outermost, first lattice vector fastest
    pub(crate) fn make_points(&mut self) {
        let dim = self.lattice_vectors.len();
        let ranges: Vec<i64> = (0..3)
            .map(|i| if i < dim { self.size[i] as i64 } else { 0 })
            .collect();
        let mut translations = Vec::new();
        for k in -ranges[2]..=ranges[2] {
            for j in -ranges[1]..=ranges[1] {
                for i in -ranges[0]..=ranges[0] {
                    let idx = [i, j, k];
                    let t = (0..dim).fold(Vector3D::origin(), |acc, d| {
                        acc + self.lattice_vectors[d] * idx[d] as f64
                    });
                    translations.push(t);
                }
            }
        }
        let positions = self.unit_cell_atom_positions();
        self.points = positions
            .iter()
            .zip(self.unit_cell_b.iter())
            .flat_map(|(pos, b)| {
                translations.iter().map(move |t| LatticePoint {
                    position: *t + *pos,
                    b: b.re,
                })
            })
            .collect();
    }

    /// Absolute positions of the unit cell atoms
    pub fn unit_cell_atom_positions(&self) -> Vec<Vector3D> {
        if self.kind.is_random() {
            return self
                .unit_cell_atoms
                .iter()
                .map(|a| Vector3D::from_slice(a))
                .collect();
        }
        self.unit_cell_atoms
            .iter()
            .map(|frac| {
                frac.iter()
                    .zip(self.lattice_vectors.iter())
                    .fold(Vector3D::origin(), |acc, (f, v)| acc + *v * *f)
            })
            .collect()
    }

    /// Kind of lattice
    pub fn kind(&self) -> LatticeKind {
        self.kind
    }

    /// Dimensionality, the number of lattice vectors or box axes
    pub fn dimension(&self) -> usize {
        if self.kind.is_random() {
            self.extent.len()
        } else {
            self.lattice_vectors.len()
        }
    }

    /// Lattice vectors in nm
    pub fn lattice_vectors(&self) -> &[Vector3D] {
        &self.lattice_vectors
    }

    /// Lengths of the lattice vectors
    pub fn lattice_constants(&self) -> Vec<f64> {
        self.lattice_vectors.iter().map(|v| v.length()).collect()
    }

    /// Reciprocal vectors with `a_i · b_j = 2π δ_ij`
    pub fn reciprocal_vectors(&self) -> &[Vector3D] {
        &self.reciprocal_vectors
    }

    /// Unit cell volume (area in 2D, length in 1D)
    pub fn unit_cell_volume(&self) -> f64 {
        self.unit_cell_volume
    }

    /// Extent along each lattice vector
    pub fn size(&self) -> &[usize] {
        &self.size
    }

    /// Fractional coordinates of the basis atoms
    pub fn unit_cell_atoms(&self) -> &[Vec<f64>] {
        &self.unit_cell_atoms
    }

    /// Scattering lengths of the basis atoms
    pub fn unit_cell_b(&self) -> &[Complex64] {
        &self.unit_cell_b
    }

    /// Sum of squared basis scattering lengths, normalization of the lattice factor
    pub fn sum_b_squared(&self) -> f64 {
        self.unit_cell_b.iter().map(|b| b.norm_sqr()).sum()
    }

    /// All points including empty sites
    pub fn all_points(&self) -> &[LatticePoint] {
        &self.points
    }

    /// Points with non-zero scattering length
    pub fn points(&self) -> Vec<LatticePoint> {
        self.points.iter().copied().filter(|p| p.is_occupied()).collect()
    }

    /// Geometric center of occupied points
    pub fn center_of_mass(&self) -> Vector3D {
        let occupied = self.points();
        if occupied.is_empty() {
            return Vector3D::origin();
        }
        let sum = occupied
            .iter()
            .fold(Vector3D::origin(), |acc, p| acc + p.position);
        sum / occupied.len() as f64
    }

    /// Number of occupied points
    pub fn number_of_atoms(&self) -> usize {
        self.points.iter().filter(|p| p.is_occupied()).count()
    }

    /// Shift all points by a vector
    pub fn move_by(&mut self, vector: &Vector3D) {
        for p in self.points.iter_mut() {
            p.position += *vector;
        }
    }

    /// Set all points to the same scattering length
    pub fn set_b(&mut self, b: f64) {
        for p in self.points.iter_mut() {
            p.b = b;
        }
    }

    /// Real space vector of direction `[h, k, l]`
    ///
    /// Indices beyond the dimension of the lattice are ignored.
    pub fn vector_hkl(&self, hkl: &[f64; 3]) -> Vector3D {
        self.lattice_vectors
            .iter()
            .zip(hkl.iter())
            .fold(Vector3D::origin(), |acc, (v, h)| acc + *v * *h)
    }

    pub(crate) fn require_periodic(&self, operation: &str) -> Result<()> {
        if self.kind.is_random() {
            Err(LatticeError::InvalidParameter(format!(
                "{operation} needs a periodic lattice, got {}",
                self.kind
            )))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn oblique() -> Vec<Vector3D> {
        vec![
            Vector3D::new(1.0, 0.1, 0.0),
            Vector3D::new(0.3, 1.2, 0.2),
            Vector3D::new(-0.1, 0.2, 0.9),
        ]
    }

    #[test]
    fn test_reciprocal_inverse() {
        for dim in 1..=3 {
            let vectors = &oblique()[..dim];
            let lattice = Lattice::rhombic(vectors, 1, None, None).unwrap();
            for (i, a) in vectors.iter().enumerate() {
                for (j, b) in lattice.reciprocal_vectors().iter().enumerate() {
                    let expected = if i == j { 2.0 * PI } else { 0.0 };
                    assert_relative_eq!(a.dot(b), expected, epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_points_materialized() {
        let atoms = vec![vec![0.0, 0.0, 0.0], vec![0.5, 0.5]];
        let lattice = Lattice::rhombic(&oblique(), [1, 2, 0], Some(&atoms), Some(&[1.0, 2.0])).unwrap();
        assert_eq!(lattice.all_points().len(), 3 * 5 * 2);
        assert_eq!(lattice.unit_cell_atoms()[1], vec![0.5, 0.5, 0.0]);
        assert_relative_eq!(lattice.sum_b_squared(), 5.0);
    }

    #[test]
    fn test_degenerate_and_mismatch() {
        let flat = vec![
            Vector3D::new(1.0, 0.0, 0.0),
            Vector3D::new(0.0, 1.0, 0.0),
            Vector3D::new(1.0, 1.0, 0.0),
        ];
        assert!(matches!(
            Lattice::rhombic(&flat, 1, None, None),
            Err(LatticeError::DegenerateLattice(_))
        ));
        let nearly_flat = vec![flat[0], flat[1], Vector3D::new(1.0, 1.0, 1e-14)];
        assert!(matches!(
            Lattice::rhombic(&nearly_flat, 1, None, None),
            Err(LatticeError::DegenerateLattice(_))
        ));
        // tiny but well shaped cells are fine
        let tiny: Vec<Vector3D> = oblique().iter().map(|v| *v * 1e-6).collect();
        assert!(Lattice::rhombic(&tiny, 1, None, None).is_ok());
        assert!(matches!(
            Lattice::rhombic(&oblique(), [1, 1], None, None),
            Err(LatticeError::DimensionMismatch(_))
        ));
        let atoms = vec![vec![0.0], vec![0.5]];
        assert!(matches!(
            Lattice::rhombic(&oblique(), 1, Some(&atoms), Some(&[1.0, 2.0, 3.0])),
            Err(LatticeError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_point_helpers() {
        let mut lattice = Lattice::rhombic(&oblique(), 1, None, Some(&[2.0])).unwrap();
        assert_eq!(lattice.number_of_atoms(), 27);
        let com = lattice.center_of_mass();
        assert_relative_eq!(com.length(), 0.0, epsilon = 1e-12);
        lattice.move_by(&Vector3D::new(1.0, 0.0, 0.0));
        assert_relative_eq!(lattice.center_of_mass().x, 1.0, epsilon = 1e-12);
        lattice.set_b(0.0);
        assert_eq!(lattice.number_of_atoms(), 0);
        let v = lattice.vector_hkl(&[1.0, 1.0, 0.0]);
        assert_relative_eq!(v.y, 1.3, epsilon = 1e-12);
    }
}
