/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

use approx::assert_relative_eq;
use sasfactor_rs::data::{ColumnRole, DataArray};
use sasfactor_rs::lattice::Lattice;
use sasfactor_rs::structure_factor::{
    lattice_structure_factor, rmsa, Beta, LatticeSfConfig, RmsaConfig,
};
use sasfactor_rs::utils::linspace;
use tempfile::tempdir;

#[test]
fn test_solver_result_survives_a_file() {
    let q = linspace(0.05, 2.0, 40);
    let result = rmsa(&q, 2.5, 1.0, 5.0, 0.1.into(), &RmsaConfig::default()).unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("rmsa.json");
    result.save_json(&path).unwrap();
    let loaded = DataArray::load_json(&path).unwrap();

    assert_eq!(loaded.column_names(), result.column_names());
    for (a, b) in loaded.y().unwrap().iter().zip(result.y().unwrap().iter()) {
        assert_relative_eq!(a, b, max_relative = 1e-14);
    }
    assert_eq!(loaded.attr_f64("gamma"), Some(5.0));
}

#[test]
fn test_measured_beta_drives_lattice_factor() {
    let table = DataArray::from_columns(vec![("q", vec![0.0, 10.0]), ("beta", vec![1.0, 0.0])])
        .unwrap();
    let beta = Beta::from_data(&table).unwrap();
    let config = LatticeSfConfig {
        beta: Some(beta),
        domain_size: 20.0,
        hkl_max: 3,
        ..Default::default()
    };
    let lattice = Lattice::sc(2.0, 2, None).unwrap();
    let result = lattice_structure_factor(&[2.5, 5.0, 10.0], &lattice, &config).unwrap();
    let beta = result.column("beta").unwrap();
    assert!((beta[1] - 0.5).abs() < 1e-12);
    assert_eq!(result.column("Sq").unwrap()[2], 1.0);
    assert!(result.role(ColumnRole::Y).is_some());
}

#[test]
fn test_config_from_json() {
    let config = LatticeSfConfig::from_json_str(r#"{"domain_size": 80.0, "hkl_max": 5}"#).unwrap();
    assert_eq!(config.domain_size, 80.0);
    assert_eq!(config.hkl_max, 5);
    assert_eq!(config.rmsd, LatticeSfConfig::default().rmsd);
    assert!(LatticeSfConfig::from_json_str("{\"hkl_max\": -1}").is_err());
}
