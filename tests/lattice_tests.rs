/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

use approx::assert_relative_eq;
use rstest::rstest;
use sasfactor_rs::kernels::{debye_waller, rotation_matrix};
use sasfactor_rs::lattice::{Lattice, DEFAULT_PEAK_THRESHOLD};
use sasfactor_rs::structure_factor::{
    lattice_structure_factor, oriented_lattice_structure_factor, Beta, DomainSize,
    LatticeSfConfig, OrientedSfConfig, StructureFactorError,
};
use sasfactor_rs::utils::{linspace, Vector3D};
use std::f64::consts::PI;

#[test]
fn test_fcc_radial_peaks_follow_selection_rule() {
    let fcc = Lattice::fcc(1.5, 2, None).unwrap();
    let radial = fcc.radial_peaks(3).unwrap();
    let hkl: Vec<[i64; 3]> = radial.iter().map(|p| p.hkl).collect();
    assert!(hkl.contains(&[1, 1, 1]));
    assert!(hkl.contains(&[2, 0, 0]));
    assert!(!hkl.contains(&[1, 0, 0]));
    assert!(!hkl.contains(&[1, 1, 0]));

    let g = 2.0 * PI / 1.5;
    assert!(radial.iter().all(|p| (p.q - g).abs() > 1e-6));
    assert!(radial.iter().all(|p| (p.q - 2f64.sqrt() * g).abs() > 1e-6));
    assert_relative_eq!(radial[0].q, 3f64.sqrt() * g, epsilon = 1e-6);
}

#[rstest]
#[case(Lattice::sc(1.5, 2, None).unwrap())]
#[case(Lattice::bcc(2.0, 2, None).unwrap())]
#[case(Lattice::hcp(1.0, 2, None).unwrap())]
fn test_reciprocal_vectors_are_inverse(#[case] lattice: Lattice) {
    let a = lattice.lattice_vectors();
    let b = lattice.reciprocal_vectors();
    for i in 0..3 {
        for j in 0..3 {
            let expected = if i == j { 2.0 * PI } else { 0.0 };
            assert_relative_eq!(a[i].dot(&b[j]), expected, epsilon = 1e-12);
        }
    }
}

#[test]
fn test_sc_powder_first_peak() {
    let lattice = Lattice::sc(1.5, 8, None).unwrap();
    let g = 2.0 * PI / 1.5;
    let q = linspace(0.9 * g, 1.1 * g, 2001);
    let config = LatticeSfConfig {
        domain_size: 50.0,
        rmsd: 0.02,
        ..Default::default()
    };
    let result = lattice_structure_factor(&q, &lattice, &config).unwrap();
    let sq = result.column("Sq").unwrap();
    let imax = (0..sq.len())
        .max_by(|&a, &b| sq[a].total_cmp(&sq[b]))
        .unwrap();
    assert!((q[imax] - g).abs() / g < 1e-3, "peak at {}", q[imax]);
}

#[test]
fn test_lattice_factor_approaches_one() {
    let lattice = Lattice::sc(1.5, 2, None).unwrap();
    let config = LatticeSfConfig {
        domain_size: 5.0,
        lg: 0.0,
        hkl_max: 12,
        ..Default::default()
    };
    let q = linspace(20.0, 30.0, 1001);
    let result = lattice_structure_factor(&q, &lattice, &config).unwrap();
    let z0 = result.column("Z0q").unwrap();
    assert_relative_eq!(z0.sum() / z0.len() as f64, 1.0, epsilon = 0.05);
}

#[test]
fn test_powder_is_rotation_invariant() {
    let q = linspace(0.5, 12.0, 200);
    let config = LatticeSfConfig {
        domain_size: 30.0,
        hkl_max: 4,
        ..Default::default()
    };
    let lattice = Lattice::bcc(2.0, 3, None).unwrap();
    let reference = lattice_structure_factor(&q, &lattice, &config).unwrap();

    let mut rotated = lattice.clone();
    let axis = Vector3D::new(1.0, 2.0, -0.5);
    rotated.rotate_by_matrix(&rotation_matrix(&axis, 0.83)).unwrap();
    let result = lattice_structure_factor(&q, &rotated, &config).unwrap();

    for (a, b) in reference
        .column("Sq")
        .unwrap()
        .iter()
        .zip(result.column("Sq").unwrap().iter())
    {
        assert!((a - b).abs() < 1e-6);
    }
}

#[test]
fn test_oriented_peak_rotates_with_lattice() {
    let lattice = Lattice::sc(2.0, 1, None).unwrap();
    let g = 2.0 * PI / 2.0;
    let config = OrientedSfConfig {
        domain_size: DomainSize::Isotropic(30.0),
        ..Default::default()
    };
    let mut rotated = lattice.clone();
    let r = rotation_matrix(&Vector3D::new(0.0, 0.0, 1.0), PI / 4.0);
    rotated.rotate_by_matrix(&r).unwrap();

    let on_axis = [Vector3D::new(g, 0.0, 0.0)];
    let diagonal = [Vector3D::new(g, 0.0, 0.0).rotate(&r)];
    let a = oriented_lattice_structure_factor(&on_axis, &lattice, &config).unwrap();
    let b = oriented_lattice_structure_factor(&diagonal, &rotated, &config).unwrap();
    assert_relative_eq!(
        a.column("Sq").unwrap()[0],
        b.column("Sq").unwrap()[0],
        max_relative = 1e-6
    );
    let missed = oriented_lattice_structure_factor(&on_axis, &rotated, &config).unwrap();
    assert!(missed.column("Sq").unwrap()[0] < 1.0);
}

#[test]
fn test_debye_waller_decreases() {
    let q = linspace(0.0, 20.0, 50);
    let dw: Vec<f64> = q.iter().map(|&v| debye_waller(v, 0.1)).collect();
    assert!(dw.windows(2).all(|w| w[0] > w[1]));
}

#[test]
fn test_threshold_drops_weak_peaks() {
    let b = [1.0, 0.01];
    let lattice = Lattice::bcc(2.0, 1, Some(&b)).unwrap();
    let all = lattice.reciprocal_peaks(2, 0.0).unwrap();
    let strong = lattice.reciprocal_peaks(2, 0.9).unwrap();
    assert!(strong.len() < all.len());
    assert!(lattice.reciprocal_peaks(2, DEFAULT_PEAK_THRESHOLD).unwrap().len() <= all.len());
}

#[test]
fn test_non_finite_lattice_result_is_an_error() {
    let sc = Lattice::sc(1.5, 2, None).unwrap();
    let powder = LatticeSfConfig {
        beta: Some(Beta::Scalar(f64::NAN)),
        ..Default::default()
    };
    assert!(matches!(
        lattice_structure_factor(&[1.0, 4.2], &sc, &powder),
        Err(StructureFactorError::InvalidParameter(_))
    ));

    let oriented = OrientedSfConfig {
        beta: Some(Beta::Scalar(f64::INFINITY)),
        ..Default::default()
    };
    let qxyz = [Vector3D::new(2.0 * PI / 1.5, 0.0, 0.0)];
    assert!(matches!(
        oriented_lattice_structure_factor(&qxyz, &sc, &oriented),
        Err(StructureFactorError::InvalidParameter(_))
    ));
}
