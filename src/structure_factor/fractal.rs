/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Structure factor of fractal clusters of particles (Teixeira)

use super::common::{sq_result, validate_length, validate_q};
use super::errors::{Result, StructureFactorError};
use crate::data::DataArray;
use statrs::function::gamma::gamma;

/// Structure factor of a mass fractal built from particles
///
/// # Arguments
///
/// * `q` - Wavevectors in 1/nm
/// * `cluster_size` - Cutoff length ξ of the fractal correlations in nm
/// * `particle_size` - Size r0 of the building blocks in nm
/// * `df` - Fractal dimension, between 0 and 3
///
/// # Returns
///
/// Columns `q`, `Sq` with attributes `clustersize`, `particlesize`, `df`,
/// `fractaldimension`, `Rg` and `Sq0`
pub fn fractal(q: &[f64], cluster_size: f64, particle_size: f64, df: f64) -> Result<DataArray> {
    validate_q(q)?;
    validate_length("cluster size", cluster_size)?;
    if !(particle_size > 0.0) {
        return Err(StructureFactorError::InvalidParameter(format!(
            "particle size must be positive, got {particle_size}"
        )));
    }
    if !(0.0..=3.0).contains(&df) {
        return Err(StructureFactorError::InvalidParameter(format!(
            "fractal dimension must be in [0, 3], got {df}"
        )));
    }
    let xi = cluster_size;
    let r0 = particle_size;
    let sq0 = 1.0 + (xi / r0).powf(df) * gamma(df + 1.0);

    let sq = q
        .iter()
        .map(|&qq| {
            if df == 0.0 {
                1.0
            } else if qq == 0.0 {
                sq0
            } else if df == 1.0 {
                // Γ(df-1) diverges, the limit is an arctangent
                1.0 + (qq * xi).atan() / (qq * r0)
            } else {
                let qxi = qq * xi;
                1.0 + df * gamma(df - 1.0) / (1.0 + 1.0 / (qxi * qxi)).powf((df - 1.0) / 2.0)
                    * ((df - 1.0) * qxi.atan()).sin()
                    / (qq * r0).powf(df)
            }
        })
        .collect();

    let mut result = sq_result(q, sq)?;
    result.set_attr("clustersize", cluster_size);
    result.set_attr("particlesize", particle_size);
    result.set_attr("df", df);
    result.set_attr("fractaldimension", df);
    result.set_attr("Rg", df * (df + 1.0) * xi * xi / 2.0);
    result.set_attr("Sq0", if df == 0.0 { 1.0 } else { sq0 });
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(1.5)]
    #[case(2.0)]
    #[case(2.5)]
    fn test_low_q_continuity(#[case] df: f64) {
        let result = fractal(&[0.0, 1e-4], 20.0, 1.0, df).unwrap();
        let sq = result.column("Sq").unwrap();
        assert_relative_eq!(sq[1], sq[0], max_relative = 1e-3);
        assert_relative_eq!(result.attr_f64("Sq0").unwrap(), sq[0]);
    }

    #[test]
    fn test_large_q_and_special_dimensions() {
        let result = fractal(&[1e4], 20.0, 1.0, 2.0).unwrap();
        assert_relative_eq!(result.column("Sq").unwrap()[0], 1.0, epsilon = 1e-6);
        let flat = fractal(&[0.0, 0.3], 20.0, 1.0, 0.0).unwrap();
        assert!(flat.column("Sq").unwrap().iter().all(|&v| v == 1.0));
        let linear = fractal(&[0.5], 20.0, 1.0, 1.0).unwrap();
        assert_relative_eq!(linear.column("Sq").unwrap()[0], 1.0 + 10f64.atan() / 0.5);
        assert!(fractal(&[0.5], 20.0, 0.0, 2.0).is_err());
    }
}
