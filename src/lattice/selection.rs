/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Sublattice selection by geometric primitives
//!
//! Selections assign a scattering length to all points inside a body, or to all
//! points outside when `invert` is set. A zero scattering length marks a point as
//! empty, so selections with `b = 0` carve shapes out of a lattice. Each method
//! returns the number of points that were assigned.

use super::core::{Lattice, LatticePoint};
use super::errors::{LatticeError, Result};
use crate::utils::constants::B_TOLERANCE;
use crate::utils::{Matrix3, Vector3D};
use log::debug;

impl Lattice {
    fn assign_where<F>(&mut self, b: f64, invert: bool, inside: F) -> usize
    where
        F: Fn(&Vector3D) -> bool,
    {
        let mut count = 0;
        for p in self.points.iter_mut() {
            if inside(&p.position) != invert {
                p.b = b;
                count += 1;
            }
        }
        debug!("assigned b = {b} to {count} of {} points", self.points.len());
        count
    }

    /// Assign `b` to points with `|p - center| < |radius|`
    pub fn select_in_sphere(
        &mut self,
        center: &Vector3D,
        radius: f64,
        b: f64,
        invert: bool,
    ) -> Result<usize> {
        if !radius.is_finite() {
            return Err(LatticeError::InvalidParameter(format!(
                "sphere radius must be finite, got {radius}"
            )));
        }
        let r = radius.abs();
        let c = *center;
        Ok(self.assign_where(b, invert, |p| p.distance(&c) < r))
    }

    /// Assign `b` to points inside an ellipsoid with half axes `abc`
    ///
    /// The optional rotation is applied to `p - center` before the axes test.
    pub fn select_in_ellipsoid(
        &mut self,
        center: &Vector3D,
        abc: &Vector3D,
        rotation: Option<&Matrix3>,
        b: f64,
        invert: bool,
    ) -> Result<usize> {
        if abc.to_array().iter().any(|a| !(*a > 0.0)) {
            return Err(LatticeError::InvalidParameter(format!(
                "ellipsoid half axes must be positive, got {abc}"
            )));
        }
        let c = *center;
        let axes = *abc;
        let rotation = rotation.copied();
        Ok(self.assign_where(b, invert, |p| {
            let d = *p - c;
            let d = match &rotation {
                Some(r) => d.rotate(r),
                None => d,
            };
            d.component_div(&axes).length() < 1.0
        }))
    }

    /// Assign `b` to points inside a cylinder
    ///
    /// # Arguments
    ///
    /// * `axis` - Cylinder axis direction
    /// * `radius` - Cylinder radius
    /// * `base` - Point on the axis where the cylinder starts
    /// * `length` - Positive extends along `axis`, negative against it, zero is infinite both ways
    /// * `b` - Scattering length to assign
    /// * `invert` - Assign to points outside instead
    pub fn select_in_cylinder(
        &mut self,
        axis: &Vector3D,
        radius: f64,
        base: &Vector3D,
        length: f64,
        b: f64,
        invert: bool,
    ) -> Result<usize> {
        let n = axis.normalize();
        if n.length() == 0.0 {
            return Err(LatticeError::InvalidParameter(
                "cylinder axis must not be zero".to_string(),
            ));
        }
        let r = radius.abs();
        let a = *base;
        Ok(self.assign_where(b, invert, |p| {
            let d = *p - a;
            let along = d.dot(&n);
            let radial = (d - n * along).length();
            let axial = if length > 0.0 {
                (0.0..=length).contains(&along)
            } else if length < 0.0 {
                (length..=0.0).contains(&along)
            } else {
                true
            };
            radial < r && axial
        }))
    }

    /// Assign `b` to points on the side of the plane through `center` that `normal` points to
    pub fn select_half_space(
        &mut self,
        center: &Vector3D,
        normal: &Vector3D,
        b: f64,
        invert: bool,
    ) -> Result<usize> {
        let n = normal.normalize();
        if n.length() == 0.0 {
            return Err(LatticeError::InvalidParameter(
                "plane normal must not be zero".to_string(),
            ));
        }
        let c = *center;
        Ok(self.assign_where(b, invert, |p| (*p - c).dot(&n) > 0.0))
    }

    /// Assign `b` to points inside the parallelepiped spanned by `v1, v2, v3` at `corner`
    pub fn select_in_parallelepiped(
        &mut self,
        corner: &Vector3D,
        v1: &Vector3D,
        v2: &Vector3D,
        v3: &Vector3D,
        b: f64,
        invert: bool,
    ) -> Result<usize> {
        let faces = [
            (v2.cross(v3), *v1),
            (v3.cross(v1), *v2),
            (v1.cross(v2), *v3),
        ];
        if v1.dot(&faces[0].0).abs() < 1e-12 {
            return Err(LatticeError::DegenerateLattice(
                "parallelepiped edges are coplanar".to_string(),
            ));
        }
        let c = *corner;
        Ok(self.assign_where(b, invert, |p| {
            let d = *p - c;
            faces.iter().all(|(normal, edge)| {
                let x = d.dot(normal);
                let top = edge.dot(normal);
                x >= top.min(0.0) && x <= top.max(0.0)
            })
        }))
    }

    /// Set `b := f(position)` where `|f(position)|` exceeds the zero tolerance
    ///
    /// Points where `f` vanishes keep their scattering length.
    pub fn filter<F>(&mut self, f: F) -> usize
    where
        F: Fn(&Vector3D) -> f64,
    {
        let mut count = 0;
        for p in self.points.iter_mut() {
            let value = f(&p.position);
            if value.abs() > B_TOLERANCE {
                p.b = value;
                count += 1;
            }
        }
        count
    }

    /// Remove all points for which `predicate` is true, returning how many were removed
    pub fn prune<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&LatticePoint) -> bool,
    {
        let before = self.points.len();
        self.points.retain(|p| !predicate(p));
        before - self.points.len()
    }
}
