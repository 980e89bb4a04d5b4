/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Rigid rotations of lattices and of detector planes relative to lattice directions

use super::core::Lattice;
use super::errors::{LatticeError, Result};
use crate::kernels::{is_rotation, rotation_between, rotation_matrix};
use crate::utils::{Matrix3, Vector3D};
use log::debug;

/// Tolerance of the orthogonality and determinant test of rotation matrices
pub const ROTATION_TOLERANCE: f64 = 1e-8;

impl Lattice {
    fn direction(&self, hkl: &[f64; 3]) -> Result<Vector3D> {
        let v = self.vector_hkl(hkl);
        if v.length() < 1e-12 {
            return Err(LatticeError::InvalidParameter(format!(
                "direction {hkl:?} has zero length"
            )));
        }
        Ok(v)
    }

    /// Rotate points and lattice vectors by `r` and recompute reciprocal vectors
    ///
    /// Fails with `InvalidRotation` unless `det(R) = 1` and `R Rᵀ = I` within 1e-8.
    pub fn rotate_by_matrix(&mut self, r: &Matrix3) -> Result<()> {
        if !is_rotation(r, ROTATION_TOLERANCE) {
            return Err(LatticeError::InvalidRotation(format!("{r:?}")));
        }
        for p in self.points.iter_mut() {
            p.position = p.position.rotate(r);
        }
        for v in self.lattice_vectors.iter_mut() {
            *v = v.rotate(r);
        }
        if !self.kind.is_random() {
            self.make_reciprocal_vectors()?;
        }
        Ok(())
    }

    /// Rotate the lattice so that direction `hkl` points along `vector`
    pub fn rotate_axis_to_vector(&mut self, hkl: &[f64; 3], vector: &Vector3D) -> Result<()> {
        let from = self.direction(hkl)?;
        if vector.length() < 1e-12 {
            return Err(LatticeError::InvalidParameter(
                "target vector must not be zero".to_string(),
            ));
        }
        self.rotate_by_matrix(&rotation_between(&from, vector))
    }

    /// Rotate the lattice around direction `hkl` by `angle` (rad)
    pub fn rotate_around_axis(&mut self, hkl: &[f64; 3], angle: f64) -> Result<()> {
        let axis = self.direction(hkl)?;
        self.rotate_by_matrix(&rotation_matrix(&axis, angle))
    }

    /// Rotate around direction `hkl`, optionally aligning a second direction
    ///
    /// With `align = Some((vector, hkl2))` the lattice is first turned around `hkl`
    /// until the projection of `hkl2` onto the plane normal to `hkl` points along the
    /// projection of `vector`; `angle` is added on top.
    pub fn rotate_around_hkl(
        &mut self,
        hkl: &[f64; 3],
        angle: f64,
        align: Option<(&Vector3D, &[f64; 3])>,
    ) -> Result<()> {
        let axis = self.direction(hkl)?.normalize();
        let mut total = angle;
        if let Some((vector, hkl2)) = align {
            let second = self.direction(hkl2)?;
            let project = |v: &Vector3D| *v - axis * v.dot(&axis);
            let (from, to) = (project(&second), project(vector));
            if from.length() < 1e-8 || to.length() < 1e-8 {
                return Err(LatticeError::InvalidParameter(
                    "alignment direction is parallel to the rotation axis".to_string(),
                ));
            }
            let derived = from.cross(&to).dot(&axis).atan2(from.dot(&to));
            debug!("alignment around {hkl:?} needs {derived} rad");
            total += derived;
        }
        self.rotate_by_matrix(&rotation_matrix(&axis, total))
    }

    /// Rotate a plane so that its normal points along direction `hkl`
    ///
    /// The plane normal defaults to z. The lattice is not changed; a plane whose
    /// normal is already parallel to `hkl` is returned as is.
    pub fn rotate_plane_to_hkl(
        &self,
        plane: &[Vector3D],
        hkl: &[f64; 3],
        normal: Option<&Vector3D>,
    ) -> Result<Vec<Vector3D>> {
        let target = self.direction(hkl)?;
        let normal = normal.copied().unwrap_or(Vector3D::new(0.0, 0.0, 1.0));
        let axis = target.normalize().cross(&normal.normalize());
        if axis.length() < 1e-8 {
            return Ok(plane.to_vec());
        }
        let r = rotation_between(&normal, &target);
        Ok(plane.iter().map(|p| p.rotate(&r)).collect())
    }

    /// Rotate a plane around direction `hkl` by `angle` (rad) without changing the lattice
    pub fn rotate_plane_around_hkl(
        &self,
        plane: &[Vector3D],
        hkl: &[f64; 3],
        angle: f64,
    ) -> Result<Vec<Vector3D>> {
        let r = rotation_matrix(&self.direction(hkl)?, angle);
        Ok(plane.iter().map(|p| p.rotate(&r)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    #[test]
    fn test_invalid_rotation() {
        let mut lattice = Lattice::sc(1.0, 1, None).unwrap();
        let scaled = [[2.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert!(matches!(
            lattice.rotate_by_matrix(&scaled),
            Err(LatticeError::InvalidRotation(_))
        ));
        let mirror = [[-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert!(lattice.rotate_by_matrix(&mirror).is_err());
    }

    #[test]
    fn test_rotation_keeps_reciprocal_inverse() {
        let mut lattice = Lattice::fcc(1.3, 1, None).unwrap();
        let r = rotation_matrix(&Vector3D::new(1.0, 2.0, 0.5), 0.7);
        lattice.rotate_by_matrix(&r).unwrap();
        for (i, a) in lattice.lattice_vectors().iter().enumerate() {
            assert_relative_eq!(a.length(), 1.3, epsilon = 1e-12);
            for (j, b) in lattice.reciprocal_vectors().iter().enumerate() {
                let expected = if i == j { 2.0 * PI } else { 0.0 };
                assert_relative_eq!(a.dot(b), expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_axis_to_vector() {
        let mut lattice = Lattice::sc(1.0, 1, None).unwrap();
        let target = Vector3D::new(0.0, 0.0, 1.0);
        lattice.rotate_axis_to_vector(&[1.0, 1.0, 1.0], &target).unwrap();
        let v = lattice.vector_hkl(&[1.0, 1.0, 1.0]);
        assert_relative_eq!(v.z, 3f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-12);

        lattice.rotate_around_axis(&[1.0, 1.0, 1.0], 1.1).unwrap();
        let w = lattice.vector_hkl(&[1.0, 1.0, 1.0]);
        assert_relative_eq!(w.z, 3f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_around_hkl_with_alignment() {
        let mut lattice = Lattice::sc(1.0, 1, None).unwrap();
        let target = Vector3D::new(1.0, 1.0, 0.0);
        lattice
            .rotate_around_hkl(&[0.0, 0.0, 1.0], 0.0, Some((&target, &[1.0, 0.0, 0.0])))
            .unwrap();
        let a = lattice.lattice_vectors()[0];
        assert_relative_eq!(a.x, FRAC_PI_4.cos(), epsilon = 1e-12);
        assert_relative_eq!(a.y, FRAC_PI_4.sin(), epsilon = 1e-12);

        let parallel = Vector3D::new(0.0, 0.0, 1.0);
        assert!(lattice
            .rotate_around_hkl(&[0.0, 0.0, 1.0], 0.0, Some((&parallel, &[1.0, 0.0, 0.0])))
            .is_err());
    }

    #[test]
    fn test_plane_rotations_are_pure() {
        let lattice = Lattice::sc(1.0, 1, None).unwrap();
        let plane = vec![Vector3D::new(1.0, 0.0, 0.0), Vector3D::new(0.0, 0.0, 1.0)];
        let rotated = lattice.rotate_plane_to_hkl(&plane, &[1.0, 0.0, 0.0], None).unwrap();
        assert_relative_eq!(rotated[1].x, 1.0, epsilon = 1e-12);
        let same = lattice.rotate_plane_to_hkl(&plane, &[0.0, 0.0, 1.0], None).unwrap();
        assert_eq!(same, plane);

        let turned = lattice
            .rotate_plane_around_hkl(&plane, &[0.0, 0.0, 1.0], FRAC_PI_2)
            .unwrap();
        assert_relative_eq!(turned[0].y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(lattice.lattice_vectors()[0].x, 1.0);
    }
}
