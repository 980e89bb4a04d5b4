/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Structure factors of interacting particles and of lattices
//!
//! All solvers take wavevectors in 1/nm and lengths in nm and return a
//! [`DataArray`](crate::data::DataArray) whose first column is `q`, followed by
//! `Sq` and auxiliary columns. Parameters of a calculation are attached as attributes.

pub mod common;
pub mod critical;
pub mod errors;
pub mod fractal;
pub mod hydrodynamic;
pub mod lattice_sf;
pub mod memo;
pub mod oriented;
pub mod pair_correlation;
pub mod percus_yevick;
pub mod polyelectrolyte;
pub mod rmsa;
pub mod sticky;
pub mod two_yukawa;

pub use common::Concentration;
pub use critical::critical_system;
pub use errors::{Result, StructureFactorError};
pub use fractal::fractal;
pub use hydrodynamic::{hydrodynamic_function, hydrodynamic_function_with, HydrodynamicConfig};
pub use lattice_sf::{lattice_structure_factor, radial_3d_lsf, Beta, LatticeSfConfig};
pub use memo::{percus_yevick_cached, rmsa_cached};
pub use oriented::{
    oriented_lattice_structure_factor, radial_oriented_lsf, DomainSize, OrientedSfConfig, RadialGrid,
};
pub use pair_correlation::{radial_distribution_hs, sq2gr};
pub use percus_yevick::{percus_yevick, percus_yevick_1d, percus_yevick_2d};
pub use polyelectrolyte::{weak_polyelectrolyte, PolyelectrolyteOptions};
pub use rmsa::{rmsa, RmsaCoefficients, RmsaConfig, RootSelection};
pub use sticky::{adhesive_hard_sphere, sticky_hard_sphere, StickyOptions};
pub use two_yukawa::{two_yukawa, TwoYukawaCoefficients, TwoYukawaPotential};
