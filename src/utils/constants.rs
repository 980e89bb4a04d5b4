/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Physical constants (CODATA 2018) used by the structure factor models

/// Avogadro constant in 1/mol
pub const AVOGADRO: f64 = 6.022_140_76e23;

/// Elementary charge in C
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;

/// Vacuum permittivity in F/m
pub const VACUUM_PERMITTIVITY: f64 = 8.854_187_812_8e-12;

/// Boltzmann constant in J/K
pub const BOLTZMANN: f64 = 1.380_649e-23;

/// Classical electron radius in nm, the x-ray scattering length per electron
pub const ELECTRON_SCATTERING_LENGTH: f64 = 2.817_940_326_7e-6;

/// Default x-ray wavelength (Cu K-alpha) in nm
pub const CU_K_ALPHA: f64 = 0.15406;

/// Zero degree Celsius in K
pub const ZERO_CELSIUS: f64 = 273.15;

/// Conversion of a concentration in mol/l to a number density in 1/nm³
pub const MOLAR_TO_NUMBER_DENSITY: f64 = AVOGADRO * 1e-24;

/// Scattering lengths with absolute value below this are treated as empty sites
pub const B_TOLERANCE: f64 = 1e-12;
