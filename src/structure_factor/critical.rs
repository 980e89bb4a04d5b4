/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Ornstein-Zernike structure factor of a system close to its critical point

use super::common::{sq_result, validate_length, validate_q};
use super::errors::Result;
use crate::data::DataArray;

/// Structure factor `itc/(1 + q² cl²)` of a critical system
///
/// # Arguments
///
/// * `q` - Wavevectors in 1/nm
/// * `cl` - Correlation length in nm
/// * `itc` - Isothermal compressibility, the value at q = 0
pub fn critical_system(q: &[f64], cl: f64, itc: f64) -> Result<DataArray> {
    validate_q(q)?;
    validate_length("correlation length", cl)?;
    let sq = q.iter().map(|qq| itc / (1.0 + qq * qq * cl * cl)).collect();
    let mut result = sq_result(q, sq)?;
    result.set_attr("corrlength", cl);
    result.set_attr("isothermalcompress", itc);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_lorentzian() {
        let result = critical_system(&[0.0, 0.5], 2.0, 3.0).unwrap();
        let sq = result.column("Sq").unwrap();
        assert_relative_eq!(sq[0], 3.0);
        assert_relative_eq!(sq[1], 1.5);
        assert_eq!(result.attr_f64("corrlength"), Some(2.0));
    }
}
