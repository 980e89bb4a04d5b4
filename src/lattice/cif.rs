/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Lattice from an already parsed crystallographic description

use super::constructors::lattice_vectors_from_constants;
use super::core::{Extent, Lattice, LatticeKind};
use super::errors::{LatticeError, Result};
use super::scattering_lengths::element;
use crate::utils::angstrom_to_nm;
use crate::utils::constants::ELECTRON_SCATTERING_LENGTH;
use serde::{Deserialize, Serialize};

/// One site of the asymmetric unit after symmetry expansion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CifSite {
    /// Element symbol, charges and digits after the symbol are ignored
    pub element: String,
    /// Fractional coordinates
    pub fractional: [f64; 3],
    /// Site occupancy
    #[serde(default = "full_occupancy")]
    pub occupancy: f64,
}

fn full_occupancy() -> f64 {
    1.0
}

/// Cell constants in Angstrom and degrees with the occupied sites
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CifStructure {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub sites: Vec<CifSite>,
}

/// Radiation used to derive site scattering lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScatteringMode {
    /// Electron count times the classical electron radius
    #[default]
    #[serde(rename = "x-ray", alias = "xray")]
    XRay,
    /// Coherent neutron scattering length
    #[serde(rename = "neutron")]
    Neutron,
}

/// Reduce a type symbol like `Fe3+` or `2H` to a table key
fn element_key(symbol: &str) -> String {
    let s = symbol.trim();
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    let letters: String = s[digits.len()..]
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    format!("{digits}{letters}").to_lowercase()
}

fn site_b(site: &CifSite, mode: ScatteringMode) -> Result<f64> {
    let data = element(&element_key(&site.element))?;
    Ok(match mode {
        ScatteringMode::XRay => site.occupancy * data.z as f64 * ELECTRON_SCATTERING_LENGTH,
        ScatteringMode::Neutron => site.occupancy * data.b_coherent,
    })
}

impl Lattice {
    /// Build a lattice from cell constants and sites
    ///
    /// Sites at the same fractional position form one basis atom whose scattering
    /// length is the occupancy weighted sum of its elements. Cell constants are
    /// converted from Angstrom to nm.
    pub fn from_cif(structure: &CifStructure, size: impl Into<Extent>, mode: ScatteringMode) -> Result<Self> {
        if structure.sites.is_empty() {
            return Err(LatticeError::InvalidParameter(
                "structure has no sites".to_string(),
            ));
        }
        let vectors: Vec<_> = lattice_vectors_from_constants(
            angstrom_to_nm(structure.a),
            angstrom_to_nm(structure.b),
            angstrom_to_nm(structure.c),
            structure.alpha,
            structure.beta,
            structure.gamma,
        )?;

        let mut positions: Vec<Vec<f64>> = Vec::new();
        let mut b: Vec<f64> = Vec::new();
        for site in &structure.sites {
            let frac: Vec<f64> = site.fractional.iter().map(|x| x.rem_euclid(1.0)).collect();
            let value = site_b(site, mode)?;
            match positions
                .iter()
                .position(|p| p.iter().zip(frac.iter()).all(|(a, c)| (a - c).abs() < 1e-6))
            {
                Some(i) => b[i] += value,
                None => {
                    positions.push(frac);
                    b.push(value);
                }
            }
        }
        Ok(Self::rhombic(&vectors, size, Some(&positions), Some(&b))?.with_kind(LatticeKind::Cif))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rock_salt() -> CifStructure {
        let site = |element: &str, fractional: [f64; 3]| CifSite {
            element: element.to_string(),
            fractional,
            occupancy: 1.0,
        };
        CifStructure {
            a: 5.64,
            b: 5.64,
            c: 5.64,
            alpha: 90.0,
            beta: 90.0,
            gamma: 90.0,
            sites: vec![
                site("Na1+", [0.0, 0.0, 0.0]),
                site("Na1+", [0.0, 0.5, 0.5]),
                site("Na1+", [0.5, 0.0, 0.5]),
                site("Na1+", [0.5, 0.5, 0.0]),
                site("Cl1-", [0.5, 0.5, 0.5]),
                site("Cl1-", [0.5, 0.0, 0.0]),
                site("Cl1-", [0.0, 0.5, 0.0]),
                site("Cl1-", [0.0, 0.0, 1.5]),
            ],
        }
    }

    #[test]
    fn test_element_key() {
        assert_eq!(element_key("Fe3+"), "fe");
        assert_eq!(element_key(" 2H"), "2h");
        assert_eq!(element_key("O"), "o");
    }

    #[test]
    fn test_rock_salt_xray() {
        let lattice = Lattice::from_cif(&rock_salt(), 1, ScatteringMode::XRay).unwrap();
        assert_eq!(lattice.kind(), LatticeKind::Cif);
        assert_eq!(lattice.unit_cell_atoms().len(), 8);
        assert_relative_eq!(lattice.lattice_constants()[0], 0.564, epsilon = 1e-12);
        assert_relative_eq!(lattice.unit_cell_b()[0].re, 11.0 * ELECTRON_SCATTERING_LENGTH);
        assert_relative_eq!(lattice.unit_cell_b()[4].re, 17.0 * ELECTRON_SCATTERING_LENGTH);
        assert_eq!(lattice.unit_cell_atoms()[7], vec![0.0, 0.0, 0.5]);
    }

    #[test]
    fn test_mixed_site_neutron() {
        let mut structure = rock_salt();
        structure.sites = vec![
            CifSite { element: "H".to_string(), fractional: [0.0; 3], occupancy: 0.5 },
            CifSite { element: "D".to_string(), fractional: [0.0; 3], occupancy: 0.5 },
        ];
        let lattice = Lattice::from_cif(&structure, 0, ScatteringMode::Neutron).unwrap();
        let expected = 0.5 * element("h").unwrap().b_coherent + 0.5 * element("d").unwrap().b_coherent;
        assert_eq!(lattice.unit_cell_b().len(), 1);
        assert_relative_eq!(lattice.unit_cell_b()[0].re, expected);

        structure.sites[0].element = "Xx".to_string();
        assert!(matches!(
            Lattice::from_cif(&structure, 0, ScatteringMode::Neutron),
            Err(LatticeError::UnknownElement(_))
        ));
    }
}
