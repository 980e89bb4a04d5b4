/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! # sasfactor-rs
//!
//! Structure factors for small-angle scattering of X-rays and neutrons.
//!
//! The crate provides fluid structure factors (Percus-Yevick, RMSA, sticky and adhesive
//! hard spheres, two-Yukawa, critical, fractal and polyelectrolyte), the pair
//! correlation function, powder and oriented structure factors of crystalline lattices
//! and the hydrodynamic function H(q).
//!
//! ```
//! use sasfactor_rs::structure_factor::{percus_yevick, Concentration};
//!
//! let q = [0.5, 1.0, 2.0];
//! let sq = percus_yevick(&q, 3.0, Concentration::VolumeFraction(0.2)).unwrap();
//! assert_eq!(sq.column_names(), vec!["q", "Sq"]);
//! ```

pub mod data;
pub mod kernels;
pub mod lattice;
pub mod structure_factor;
pub mod utils;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
