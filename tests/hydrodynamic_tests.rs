/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

use approx::assert_relative_eq;
use sasfactor_rs::structure_factor::{
    hydrodynamic_function, hydrodynamic_function_with, percus_yevick, Concentration,
    HydrodynamicConfig, Result,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_plateau_at_large_q() {
    init_logging();
    let config = HydrodynamicConfig {
        intrinsic_viscosity: Some(2.5),
        number_of_points: 30,
        ..Default::default()
    };
    let result = hydrodynamic_function(&[10.0], 5.0, Concentration::VolumeFraction(0.1), &config)
        .unwrap();
    assert_relative_eq!(result.column("H").unwrap()[0], 0.8, epsilon = 1e-3);
    assert_eq!(
        result.column_names(),
        vec!["q", "H", "DsoverD0", "structureFactor"]
    );
    for name in ["Rh", "molarity", "phi_Rh", "DsoverD0", "intrinsicVisc", "numberOfPoints"] {
        assert!(result.attr(name).is_some(), "missing {name}");
    }
}

#[test]
fn test_worker_count_does_not_change_result() {
    init_logging();
    let q = [0.1, 0.4, 0.8];
    let base = HydrodynamicConfig {
        number_of_points: 20,
        ..Default::default()
    };
    let pooled = HydrodynamicConfig {
        workers: Some(2),
        ..base
    };
    let a = hydrodynamic_function(&q, 4.0, 0.15.into(), &base).unwrap();
    let b = hydrodynamic_function(&q, 4.0, 0.15.into(), &pooled).unwrap();
    assert_eq!(a.column("H").unwrap(), b.column("H").unwrap());
}

#[test]
fn test_closure_from_a_solver_result() {
    init_logging();
    let config = HydrodynamicConfig {
        number_of_points: 20,
        ..Default::default()
    };
    let concentration = Concentration::VolumeFraction(0.2);
    let closure = |k: &[f64]| -> Result<Vec<f64>> {
        Ok(percus_yevick(k, 3.0, concentration)?.column("Sq")?.to_vec())
    };
    let custom = hydrodynamic_function_with(&[0.3, 1.0], 3.0, concentration, &config, closure)
        .unwrap();
    let default = hydrodynamic_function(&[0.3, 1.0], 3.0, concentration, &config).unwrap();
    for (a, b) in custom
        .column("H")
        .unwrap()
        .iter()
        .zip(default.column("H").unwrap().iter())
    {
        assert_relative_eq!(a, b, epsilon = 1e-12);
    }
}

#[test]
fn test_negative_radius_and_concentration_are_rejected() {
    init_logging();
    let config = HydrodynamicConfig::default();
    let q = [0.5];
    assert!(hydrodynamic_function(&q, -4.0, 0.15.into(), &config).is_err());
    assert!(hydrodynamic_function(&q, 4.0, (-0.15).into(), &config).is_err());
    assert!(hydrodynamic_function(&q, 4.0, Concentration::Molarity(-1e-4), &config).is_err());
    let constant = |k: &[f64]| -> Result<Vec<f64>> { Ok(vec![1.0; k.len()]) };
    assert!(hydrodynamic_function_with(&q, -4.0, 0.15.into(), &config, constant).is_err());
}
