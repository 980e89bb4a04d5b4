/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Named lattice constructors: cubic, hexagonal, 2D and 1D lattices

use super::core::{Extent, Lattice, LatticeKind};
use super::errors::{LatticeError, Result};
use crate::utils::Vector3D;

const FCC_BASIS: [[f64; 3]; 4] = [
    [0.0, 0.0, 0.0],
    [0.0, 0.5, 0.5],
    [0.5, 0.0, 0.5],
    [0.5, 0.5, 0.0],
];

const DIAMOND_BASIS: [[f64; 3]; 8] = [
    [0.0, 0.0, 0.0],
    [0.5, 0.5, 0.0],
    [0.0, 0.5, 0.5],
    [0.5, 0.0, 0.5],
    [0.25, 0.25, 0.25],
    [0.75, 0.75, 0.25],
    [0.25, 0.75, 0.75],
    [0.75, 0.25, 0.75],
];

fn basis(atoms: &[[f64; 3]]) -> Vec<Vec<f64>> {
    atoms.iter().map(|a| a.to_vec()).collect()
}

fn cubic_vectors(a: f64) -> Vec<Vector3D> {
    vec![
        Vector3D::new(a, 0.0, 0.0),
        Vector3D::new(0.0, a, 0.0),
        Vector3D::new(0.0, 0.0, a),
    ]
}

fn hex_vectors(ab: f64, c: f64) -> Vec<Vector3D> {
    vec![
        Vector3D::new(ab, 0.0, 0.0),
        Vector3D::new(ab / 2.0, 3f64.sqrt() / 2.0 * ab, 0.0),
        Vector3D::new(0.0, 0.0, c),
    ]
}

fn check_constant(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(LatticeError::InvalidParameter(format!(
            "{name} must be positive, got {value}"
        )))
    }
}

/// Lattice vectors from lattice constants and angles in degrees
///
/// The first vector lies along x, the second in the xy plane.
pub fn lattice_vectors_from_constants(
    a: f64,
    b: f64,
    c: f64,
    alpha: f64,
    beta: f64,
    gamma: f64,
) -> Result<Vec<Vector3D>> {
    check_constant("a", a)?;
    check_constant("b", b)?;
    check_constant("c", c)?;
    let (ca, cb) = (alpha.to_radians().cos(), beta.to_radians().cos());
    let (cg, sg) = (gamma.to_radians().cos(), gamma.to_radians().sin());
    if sg.abs() < 1e-12 {
        return Err(LatticeError::DegenerateLattice(format!(
            "gamma of {gamma} degrees gives collinear vectors"
        )));
    }
    let cy = (ca - cb * cg) / sg;
    let cz2 = 1.0 - cb * cb - cy * cy;
    if cz2 <= 0.0 {
        return Err(LatticeError::DegenerateLattice(format!(
            "angles ({alpha}, {beta}, {gamma}) do not span a cell"
        )));
    }
    Ok(vec![
        Vector3D::new(a, 0.0, 0.0),
        Vector3D::new(b * cg, b * sg, 0.0),
        Vector3D::new(c * cb, c * cy, c * cz2.sqrt()),
    ])
}

impl Lattice {
    /// Bravais lattice with a single atom at the origin of the unit cell
    pub fn bravais(
        lattice_vectors: &[Vector3D],
        size: impl Into<Extent>,
        b: Option<&[f64]>,
    ) -> Result<Self> {
        Ok(Self::rhombic(lattice_vectors, size, None, b)?.with_kind(LatticeKind::Bravais))
    }

    /// Simple cubic lattice with lattice constant `a`
    pub fn sc(a: f64, size: impl Into<Extent>, b: Option<&[f64]>) -> Result<Self> {
        check_constant("lattice constant", a)?;
        Ok(Self::rhombic(&cubic_vectors(a), size, None, b)?.with_kind(LatticeKind::Sc))
    }

    /// Body centered cubic lattice
    pub fn bcc(a: f64, size: impl Into<Extent>, b: Option<&[f64]>) -> Result<Self> {
        check_constant("lattice constant", a)?;
        let atoms = basis(&[[0.0, 0.0, 0.0], [0.5, 0.5, 0.5]]);
        Ok(Self::rhombic(&cubic_vectors(a), size, Some(&atoms), b)?.with_kind(LatticeKind::Bcc))
    }

    /// Face centered cubic lattice
    pub fn fcc(a: f64, size: impl Into<Extent>, b: Option<&[f64]>) -> Result<Self> {
        check_constant("lattice constant", a)?;
        let atoms = basis(&FCC_BASIS);
        Ok(Self::rhombic(&cubic_vectors(a), size, Some(&atoms), b)?.with_kind(LatticeKind::Fcc))
    }

    /// Diamond cubic lattice, fcc with a second fcc shifted by a quarter diagonal
    pub fn diamond(a: f64, size: impl Into<Extent>, b: Option<&[f64]>) -> Result<Self> {
        check_constant("lattice constant", a)?;
        let atoms = basis(&DIAMOND_BASIS);
        Ok(Self::rhombic(&cubic_vectors(a), size, Some(&atoms), b)?
            .with_kind(LatticeKind::Diamond))
    }

    /// Hexagonal lattice with in-plane constant `ab` and height `c`
    pub fn hex(ab: f64, c: f64, size: impl Into<Extent>, b: Option<&[f64]>) -> Result<Self> {
        check_constant("ab", ab)?;
        check_constant("c", c)?;
        Ok(Self::rhombic(&hex_vectors(ab, c), size, None, b)?.with_kind(LatticeKind::Hex))
    }

    /// Stacked honeycomb lattice with two atoms per cell
    pub fn honeycomb(ab: f64, c: f64, size: impl Into<Extent>, b: Option<&[f64]>) -> Result<Self> {
        check_constant("ab", ab)?;
        check_constant("c", c)?;
        let s3 = 3f64.sqrt();
        let vectors = vec![
            Vector3D::new(3.0, s3, 0.0) * (ab / 2.0),
            Vector3D::new(3.0, -s3, 0.0) * (ab / 2.0),
            Vector3D::new(0.0, 0.0, c),
        ];
        let atoms = basis(&[[0.0, 0.0, 0.0], [2.0 / 3.0, 2.0 / 3.0, 0.0]]);
        Ok(Self::rhombic(&vectors, size, Some(&atoms), b)?.with_kind(LatticeKind::Honeycomb))
    }

    /// Hexagonal close packed lattice with ideal ratio `c = ab √(8/3)`
    pub fn hcp(ab: f64, size: impl Into<Extent>, b: Option<&[f64]>) -> Result<Self> {
        check_constant("ab", ab)?;
        let c = ab * (8.0f64 / 3.0).sqrt();
        let atoms = basis(&[[0.0, 0.0, 0.0], [1.0 / 3.0, 1.0 / 3.0, 0.5]]);
        Ok(Self::rhombic(&hex_vectors(ab, c), size, Some(&atoms), b)?.with_kind(LatticeKind::Hcp))
    }

    /// Two dimensional square lattice in the xy plane
    pub fn square(ab: f64, size: impl Into<Extent>, b: Option<&[f64]>) -> Result<Self> {
        check_constant("ab", ab)?;
        let vectors = vec![Vector3D::new(ab, 0.0, 0.0), Vector3D::new(0.0, ab, 0.0)];
        Ok(Self::rhombic(&vectors, size, None, b)?.with_kind(LatticeKind::Square))
    }

    /// Two dimensional hexagonal lattice in the xy plane
    pub fn hex2d(ab: f64, size: impl Into<Extent>, b: Option<&[f64]>) -> Result<Self> {
        check_constant("ab", ab)?;
        let vectors = vec![
            Vector3D::new(ab, 0.0, 0.0),
            Vector3D::new(ab / 2.0, 3f64.sqrt() / 2.0 * ab, 0.0),
        ];
        Ok(Self::rhombic(&vectors, size, None, b)?.with_kind(LatticeKind::Hex2D))
    }

    /// One dimensional lamellar stack along x
    pub fn lamellar(a: f64, size: impl Into<Extent>, b: Option<&[f64]>) -> Result<Self> {
        check_constant("lattice constant", a)?;
        Ok(Self::rhombic(&[Vector3D::new(a, 0.0, 0.0)], size, None, b)?
            .with_kind(LatticeKind::Lamellar))
    }
}
