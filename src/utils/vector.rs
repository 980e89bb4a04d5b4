/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Vector3D type for lattice points, lattice vectors and wavevectors

use std::fmt;
use std::ops::{Add, AddAssign, Div, Index, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// 3x3 matrix stored row major
pub type Matrix3 = [[f64; 3]; 3];

/// Identity matrix
pub const IDENTITY: Matrix3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Represents a 3D vector for positions, lattice vectors and wavevectors
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3D {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
}

impl Vector3D {
    /// Create a new 3D vector
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Create a new vector at the origin
    pub const fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Build from up to three components, missing ones are zero
    pub fn from_slice(v: &[f64]) -> Self {
        let get = |i: usize| v.get(i).copied().unwrap_or(0.0);
        Self::new(get(0), get(1), get(2))
    }

    /// Components as array
    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Calculate the distance to another vector
    pub fn distance(&self, other: &Self) -> f64 {
        (*self - *other).length()
    }

    /// Calculate the length (magnitude) of the vector
    pub fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Calculate the dot product with another vector
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Calculate the cross product with another vector
    pub fn cross(&self, other: &Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Normalize the vector to unit length
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 1e-10 {
            *self / len
        } else {
            Self::origin()
        }
    }

    /// Component-wise division
    pub fn component_div(&self, other: &Self) -> Self {
        Self::new(self.x / other.x, self.y / other.y, self.z / other.z)
    }

    /// Absolute value of each component
    pub fn abs(&self) -> Self {
        Self::new(self.x.abs(), self.y.abs(), self.z.abs())
    }

    /// Apply a matrix from the left, `R·v`
    pub fn rotate(&self, r: &Matrix3) -> Self {
        Self::new(
            r[0][0] * self.x + r[0][1] * self.y + r[0][2] * self.z,
            r[1][0] * self.x + r[1][1] * self.y + r[1][2] * self.z,
            r[2][0] * self.x + r[2][1] * self.y + r[2][2] * self.z,
        )
    }
}

impl From<[f64; 3]> for Vector3D {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl Index<usize> for Vector3D {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        match i {
            0 => &self.x,
            1 => &self.y,
            _ => &self.z,
        }
    }
}

impl fmt::Display for Vector3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6}, {:.6})", self.x, self.y, self.z)
    }
}

impl Add for Vector3D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl AddAssign for Vector3D {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Vector3D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Neg for Vector3D {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f64> for Vector3D {
    type Output = Self;

    fn mul(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Mul<Vector3D> for f64 {
    type Output = Vector3D;

    fn mul(self, v: Vector3D) -> Vector3D {
        v * self
    }
}

impl Div<f64> for Vector3D {
    type Output = Self;

    fn div(self, s: f64) -> Self {
        Self::new(self.x / s, self.y / s, self.z / s)
    }
}

/// Matrix product `a·b`
pub fn matmul(a: &Matrix3, b: &Matrix3) -> Matrix3 {
    let mut out = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            out[i][j] = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

/// Matrix transpose
pub fn transpose(a: &Matrix3) -> Matrix3 {
    let mut out = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            out[i][j] = a[j][i];
        }
    }
    out
}

/// Determinant of a 3x3 matrix
pub fn determinant(a: &Matrix3) -> f64 {
    a[0][0] * (a[1][1] * a[2][2] - a[1][2] * a[2][1])
        - a[0][1] * (a[1][0] * a[2][2] - a[1][2] * a[2][0])
        + a[0][2] * (a[1][0] * a[2][1] - a[1][1] * a[2][0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_vector_operations() {
        let v1 = Vector3D::new(1.0, 2.0, 3.0);
        let v2 = Vector3D::new(4.0, 5.0, 6.0);

        assert_relative_eq!(v1.distance(&v2), 27.0_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(v1.dot(&v2), 32.0);

        let c = v1.cross(&v2);
        assert_eq!(c, Vector3D::new(-3.0, 6.0, -3.0));
        assert_relative_eq!(c.dot(&v1), 0.0);

        let n = v1.normalize();
        assert_relative_eq!(n.length(), 1.0, epsilon = 1e-12);
        assert_eq!(Vector3D::origin().normalize(), Vector3D::origin());
    }

    #[test]
    fn test_from_slice_zero_extends() {
        assert_eq!(Vector3D::from_slice(&[0.5]), Vector3D::new(0.5, 0.0, 0.0));
        assert_eq!(Vector3D::from_slice(&[0.5, 0.25]), Vector3D::new(0.5, 0.25, 0.0));
    }

    #[test]
    fn test_matrix_helpers() {
        let a = [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
        assert_relative_eq!(determinant(&a), 1.0);
        let p = matmul(&a, &transpose(&a));
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(p[i][j], IDENTITY[i][j]);
            }
        }
        let v = Vector3D::new(1.0, 0.0, 0.0).rotate(&a);
        assert_relative_eq!(v.y, 1.0);
    }
}
