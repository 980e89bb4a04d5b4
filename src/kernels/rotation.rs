/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Rotation matrices from axis and angle

use crate::utils::vector::{determinant, matmul, transpose, Matrix3, IDENTITY};
use crate::utils::Vector3D;

/// Rotation around `axis` by `angle` (rad) using Rodrigues' formula
///
/// `R = cos(a) I + sin(a) [n]x + (1-cos(a)) n nᵀ` with the normalized axis `n`.
/// A zero axis gives the identity.
pub fn rotation_matrix(axis: &Vector3D, angle: f64) -> Matrix3 {
    let n = axis.normalize();
    if n.length() == 0.0 {
        return IDENTITY;
    }
    let (s, c) = angle.sin_cos();
    let skew = [[0.0, -n.z, n.y], [n.z, 0.0, -n.x], [-n.y, n.x, 0.0]];
    let mut r = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            r[i][j] = c * IDENTITY[i][j] + s * skew[i][j] + (1.0 - c) * n[i] * n[j];
        }
    }
    r
}

/// Rotation that turns direction `from` onto direction `to`
///
/// Antiparallel directions rotate by π around an arbitrary perpendicular axis.
pub fn rotation_between(from: &Vector3D, to: &Vector3D) -> Matrix3 {
    let a = from.normalize();
    let b = to.normalize();
    let axis = a.cross(&b);
    let angle = a.dot(&b).clamp(-1.0, 1.0).acos();
    if axis.length() < 1e-12 {
        if angle < 1.0 {
            return IDENTITY;
        }
        let trial = if a.x.abs() < 0.9 {
            Vector3D::new(1.0, 0.0, 0.0)
        } else {
            Vector3D::new(0.0, 1.0, 0.0)
        };
        return rotation_matrix(&a.cross(&trial), std::f64::consts::PI);
    }
    rotation_matrix(&axis, angle)
}

/// True if `r` is a proper rotation, `det(R) = 1` and `R Rᵀ = I` within `tol`
pub fn is_rotation(r: &Matrix3, tol: f64) -> bool {
    if r.iter().flatten().any(|v| !v.is_finite()) {
        return false;
    }
    let rrt = matmul(r, &transpose(r));
    let orthogonal = (0..3).all(|i| (0..3).all(|j| (rrt[i][j] - IDENTITY[i][j]).abs() <= tol));
    orthogonal && (determinant(r) - 1.0).abs() <= tol
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_quarter_turn_about_z() {
        let r = rotation_matrix(&Vector3D::new(0.0, 0.0, 2.0), FRAC_PI_2);
        let v = Vector3D::new(1.0, 0.0, 0.0).rotate(&r);
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-15);
        assert_relative_eq!(v.y, 1.0, epsilon = 1e-15);
        assert!(is_rotation(&r, 1e-8));
    }

    #[test]
    fn test_rotation_between() {
        let from = Vector3D::new(1.0, 1.0, 1.0);
        let to = Vector3D::new(0.0, 0.0, 3.0);
        let r = rotation_between(&from, &to);
        let v = from.normalize().rotate(&r);
        assert_relative_eq!(v.z, 1.0, epsilon = 1e-12);

        let back = rotation_between(&to, &(-to));
        let w = Vector3D::new(0.0, 0.0, 1.0).rotate(&back);
        assert_relative_eq!(w.z, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_reflection_is_not_rotation() {
        let mirror = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, -1.0]];
        assert!(!is_rotation(&mirror, 1e-8));
        let scaled = [[2.0, 0.0, 0.0], [0.0, 0.5, 0.0], [0.0, 0.0, 1.0]];
        assert!(!is_rotation(&scaled, 1e-8));
    }
}
