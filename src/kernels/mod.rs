/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Small numeric kernels used by the lattice and structure factor solvers
//!
//! Bragg peak line shapes, Debye-Waller damping, geometric corrections,
//! rotation matrices and the electrostatics of aqueous solvents.

pub mod corrections;
pub mod electrostatics;
pub mod peaks;
pub mod rotation;

pub use corrections::{correction_factor, debye_waller, scattering_angle, Correction};
pub use electrostatics::{bjerrum_length, dielectric_constant, Solvent};
pub use peaks::{gauss_peak_product, sum_gauss_peaks, sum_voigt_peaks, voigt};
pub use rotation::{is_rotation, rotation_between, rotation_matrix};
