/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Direct and reciprocal lattice algebra
//!
//! This module provides one, two and three dimensional lattices with multi atom
//! bases, reciprocal lattice peaks with structure factors and multiplicities,
//! rigid rotations, sublattice selection by geometric primitives, random point
//! sets and a constructor from parsed crystallographic data.

pub mod cif;
pub mod constructors;
pub mod core;
pub mod errors;
pub mod peaks;
pub mod random;
pub mod rotation;
pub mod scattering_lengths;
pub mod selection;

pub use cif::{CifSite, CifStructure, ScatteringMode};
pub use constructors::lattice_vectors_from_constants;
pub use self::core::{Extent, Lattice, LatticeKind, LatticePoint};
pub use errors::{LatticeError, Result};
pub use peaks::{RadialPeak, ReciprocalPeak, DEFAULT_PEAK_THRESHOLD};
pub use scattering_lengths::{element, neutron_b_coherent, ElementScattering};
