/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sasfactor_rs::lattice::Lattice;
use sasfactor_rs::structure_factor::{
    hydrodynamic_function, lattice_structure_factor, oriented_lattice_structure_factor,
    percus_yevick, rmsa, HydrodynamicConfig, LatticeSfConfig, OrientedSfConfig, RmsaConfig,
};
use sasfactor_rs::utils::{linspace, Vector3D};

fn fluid_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Fluid structure factors");
    let q = linspace(0.01, 5.0, 1000);

    group.bench_function("percus_yevick", |b| {
        b.iter(|| percus_yevick(black_box(&q), 3.0, 0.3.into()))
    });

    group.bench_function("rmsa", |b| {
        b.iter(|| rmsa(black_box(&q), 3.0, 1.5, 20.0, 0.1.into(), &RmsaConfig::default()))
    });

    group.finish();
}

fn lattice_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Lattice structure factors");
    group.sample_size(20);
    let lattice = Lattice::fcc(2.0, 3, None).expect("fcc lattice");
    let q = linspace(0.1, 15.0, 2000);
    let config = LatticeSfConfig {
        domain_size: 50.0,
        ..Default::default()
    };
    group.bench_function("powder_fcc", |b| {
        b.iter(|| lattice_structure_factor(black_box(&q), &lattice, &config))
    });

    let qxyz: Vec<Vector3D> = (0..4096)
        .map(|i| Vector3D::new(-6.0 + 0.2 * (i / 64) as f64, -6.0 + 0.2 * (i % 64) as f64, 0.0))
        .collect();
    let oriented = OrientedSfConfig::default();
    group.bench_function("oriented_fcc", |b| {
        b.iter(|| oriented_lattice_structure_factor(black_box(&qxyz), &lattice, &oriented))
    });
    group.finish();
}

fn hydrodynamic_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Hydrodynamic function");
    group.sample_size(10);
    let q = linspace(0.05, 2.0, 16);
    let config = HydrodynamicConfig::default();
    group.bench_function("percus_yevick_closure", |b| {
        b.iter(|| hydrodynamic_function(black_box(&q), 3.0, 0.2.into(), &config))
    });
    group.finish();
}

criterion_group!(
    benches,
    fluid_benchmark,
    lattice_benchmark,
    hydrodynamic_benchmark
);
criterion_main!(benches);
