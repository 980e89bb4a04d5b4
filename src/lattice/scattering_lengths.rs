/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Neutron scattering lengths of common elements
//!
//! Coherent scattering lengths and incoherent cross sections after Sears,
//! Neutron News 3 (1992) 26. Lengths are stored in nm, the incoherent length is
//! `sqrt(σ_inc / 4π)`.

use super::errors::{LatticeError, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::f64::consts::PI;

/// Scattering data of one element or isotope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementScattering {
    /// Number of electrons
    pub z: u32,
    /// Coherent neutron scattering length in nm
    pub b_coherent: f64,
    /// Incoherent neutron scattering length in nm
    pub b_incoherent: f64,
}

// symbol, Z, b_coh in fm, sigma_inc in barn
const TABLE: &[(&str, u32, f64, f64)] = &[
    ("h", 1, -3.7390, 80.26),
    ("1h", 1, -3.7406, 80.27),
    ("2h", 1, 6.671, 2.05),
    ("3h", 1, 4.792, 0.14),
    ("he", 2, 3.26, 0.0),
    ("li", 3, -1.90, 0.92),
    ("be", 4, 7.79, 0.0018),
    ("b", 5, 5.30, 1.70),
    ("c", 6, 6.6460, 0.001),
    ("n", 7, 9.36, 0.50),
    ("o", 8, 5.803, 0.0008),
    ("f", 9, 5.654, 0.0008),
    ("ne", 10, 4.566, 0.008),
    ("na", 11, 3.63, 1.62),
    ("mg", 12, 5.375, 0.08),
    ("al", 13, 3.449, 0.0082),
    ("si", 14, 4.1491, 0.004),
    ("p", 15, 5.13, 0.005),
    ("s", 16, 2.847, 0.007),
    ("cl", 17, 9.5770, 5.3),
    ("ar", 18, 1.909, 0.225),
    ("k", 19, 3.67, 0.27),
    ("ca", 20, 4.70, 0.05),
    ("ti", 22, -3.438, 2.87),
    ("v", 23, -0.3824, 5.08),
    ("cr", 24, 3.635, 1.83),
    ("mn", 25, -3.73, 0.40),
    ("fe", 26, 9.45, 0.40),
    ("co", 27, 2.49, 4.8),
    ("ni", 28, 10.3, 5.2),
    ("cu", 29, 7.718, 0.55),
    ("zn", 30, 5.680, 0.077),
    ("ga", 31, 7.288, 0.16),
    ("ge", 32, 8.185, 0.18),
    ("br", 35, 6.795, 0.10),
    ("rb", 37, 7.09, 0.5),
    ("sr", 38, 7.02, 0.06),
    ("zr", 40, 7.16, 0.02),
    ("mo", 42, 6.715, 0.04),
    ("ag", 47, 5.922, 0.58),
    ("cd", 48, 4.87, 3.46),
    ("sn", 50, 6.225, 0.022),
    ("i", 53, 5.28, 0.31),
    ("cs", 55, 5.42, 0.21),
    ("ba", 56, 5.07, 0.15),
    ("w", 74, 4.86, 1.63),
    ("pt", 78, 9.60, 0.13),
    ("au", 79, 7.63, 0.43),
    ("hg", 80, 12.692, 6.6),
    ("pb", 82, 9.405, 0.003),
];

static SCATTERING_LENGTHS: Lazy<HashMap<&'static str, ElementScattering>> = Lazy::new(|| {
    let mut map: HashMap<&'static str, ElementScattering> = TABLE
        .iter()
        .map(|&(symbol, z, b_fm, sigma_inc)| {
            (
                symbol,
                ElementScattering {
                    z,
                    b_coherent: b_fm * 1e-6,
                    b_incoherent: (sigma_inc / 4.0 / PI * 1e-10).sqrt(),
                },
            )
        })
        .collect();
    // isotope aliases
    for (alias, isotope) in [("d", "2h"), ("t", "3h")] {
        if let Some(&entry) = map.get(isotope) {
            map.insert(alias, entry);
        }
    }
    map
});

/// Scattering data for an element symbol, case insensitive
///
/// Isotopes of hydrogen are written `1h`, `2h`, `3h` or `d`, `t`.
pub fn element(symbol: &str) -> Result<ElementScattering> {
    let key = symbol.trim().to_lowercase();
    SCATTERING_LENGTHS
        .get(key.as_str())
        .copied()
        .ok_or_else(|| LatticeError::UnknownElement(symbol.to_string()))
}

/// Coherent neutron scattering length in nm
pub fn neutron_b_coherent(symbol: &str) -> Result<f64> {
    element(symbol).map(|e| e.b_coherent)
}
