/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! Engine lifecycle and physical sanity checks
//!
//! One engine instance serves repeated evaluations of the same species
//! set from a single scatter-table build, F(Q) behaves as an intensive
//! quantity, and homonuclear profiles are independent of the species
//! because the scatter factors cancel under normalization.

use approx::assert_relative_eq;
use debye_rs::atoms::{AtomicConfig, Vector3D};
use debye_rs::backend::Backend;
use debye_rs::config::{DebyeConfig, QGrid, RGrid};
use debye_rs::engine::DebyeEngine;

fn sampling() -> DebyeConfig {
    DebyeConfig::new(
        QGrid::new(0.0, 18.0, 0.1).unwrap(),
        RGrid::new(0.0, 10.0, 0.02).unwrap(),
    )
    .unwrap()
}

fn tetrahedron(species: i32) -> AtomicConfig {
    let positions = vec![
        Vector3D::new(0.0, 0.0, 0.0),
        Vector3D::new(2.04, 2.04, 0.0),
        Vector3D::new(2.04, 0.0, 2.04),
        Vector3D::new(0.0, 2.04, 2.04),
    ];
    AtomicConfig::new(positions, vec![species; 4]).unwrap()
}

#[test]
fn test_full_lifecycle_reuses_one_table() {
    let mut engine = DebyeEngine::new(sampling(), Backend::Serial).unwrap();
    let atoms = tetrahedron(79);
    let bins = engine.config().qgrid.bins();
    let points = engine.config().rgrid.points();

    let fq = engine.fq(&atoms).unwrap();
    assert_eq!(fq.len(), bins);

    let grad = engine.fq_gradient(&atoms).unwrap();
    assert_eq!(grad.dim(), (4, 3, bins));

    let (pdf, masked) = engine.pdf(&atoms).unwrap();
    assert_eq!(pdf.len(), points);
    assert_eq!(masked.len(), bins);

    let pdf_grad = engine.pdf_gradient(&atoms).unwrap();
    assert_eq!(pdf_grad.dim(), (4, 3, points));

    let gobs = pdf.clone();
    let report = engine.rw(&atoms, &gobs).unwrap();
    let rw_grad = engine.rw_gradient(&atoms, &gobs, Some(&report)).unwrap();
    assert_eq!(rw_grad.dim(), (4, 3));

    let (chi2, _) = engine.chi_squared(&atoms, &gobs).unwrap();
    assert!(chi2 >= 0.0);
    let chi_grad = engine
        .chi_squared_gradient(&atoms, &gobs, Some(&report))
        .unwrap();
    assert_eq!(chi_grad.dim(), (4, 3));

    assert_eq!(
        engine.table_builds(),
        1,
        "every call shares one scatter-table build"
    );
}

#[test]
fn test_fq_is_intensive_for_duplicated_clusters() {
    // Two far-separated copies of a cluster scatter like one copy:
    // cross-pair terms decay as 1/r and the normalization is per atom.
    let mut engine = DebyeEngine::new(sampling(), Backend::Serial).unwrap();
    let single = tetrahedron(29);

    let offset = 5.0e4;
    let mut positions = single.positions().to_vec();
    positions.extend(
        single
            .positions()
            .iter()
            .map(|p| Vector3D::new(p.x, p.y, p.z + offset)),
    );
    let double = AtomicConfig::new(positions, vec![29; 8]).unwrap();

    let fq_single = engine.fq(&single).unwrap();
    let fq_double = engine.fq(&double).unwrap();
    for (a, b) in fq_single.iter().zip(fq_double.iter()) {
        assert!(
            (a - b).abs() < 1e-3,
            "intensive mismatch: {a} vs {b}"
        );
    }
}

#[test]
fn test_homonuclear_fq_is_species_independent() {
    // For a single-species cluster the scatter factors cancel between
    // the pair weighting and the mean-square normalization.
    let mut engine = DebyeEngine::new(sampling(), Backend::Serial).unwrap();
    let gold = engine.fq(&tetrahedron(79)).unwrap();
    let carbon = engine.fq(&tetrahedron(6)).unwrap();
    for (a, b) in gold.iter().zip(carbon.iter()) {
        assert_relative_eq!(a, b, max_relative = 1e-12, epsilon = 1e-14);
    }
    assert_eq!(engine.table_builds(), 2, "distinct species rebuild the table");
}

#[test]
fn test_qmin_cutoff_shapes_the_pdf() {
    let atoms = tetrahedron(79);
    let rgrid = RGrid::new(0.0, 10.0, 0.02).unwrap();

    let mut open = DebyeEngine::new(
        DebyeConfig::new(QGrid::new(0.0, 18.0, 0.1).unwrap(), rgrid).unwrap(),
        Backend::Serial,
    )
    .unwrap();
    let mut cut = DebyeEngine::new(
        DebyeConfig::new(QGrid::new(3.0, 18.0, 0.1).unwrap(), rgrid).unwrap(),
        Backend::Serial,
    )
    .unwrap();

    let (pdf_open, _) = open.pdf(&atoms).unwrap();
    let (pdf_cut, masked) = cut.pdf(&atoms).unwrap();
    assert!(masked.iter().take(30).all(|v| *v == 0.0));

    let max_diff = pdf_open
        .iter()
        .zip(pdf_cut.iter())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0f64, f64::max);
    assert!(
        max_diff > 1e-3,
        "dropping low-Q bins must reshape the PDF, max diff {max_diff:e}"
    );
}

#[test]
fn test_degenerate_sizes_on_multicore() {
    let mut engine = DebyeEngine::new(sampling(), Backend::MultiCore).unwrap();
    let bins = engine.config().qgrid.bins();

    let empty = AtomicConfig::new(vec![], vec![]).unwrap();
    let fq = engine.fq(&empty).unwrap();
    assert_eq!(fq.len(), bins);
    assert!(fq.iter().all(|v| *v == 0.0));
    let grad = engine.fq_gradient(&empty).unwrap();
    assert_eq!(grad.dim(), (0, 3, bins));

    let lone = AtomicConfig::new(vec![Vector3D::origin()], vec![8]).unwrap();
    let fq = engine.fq(&lone).unwrap();
    assert!(fq.iter().all(|v| *v == 0.0));
    let grad = engine.fq_gradient(&lone).unwrap();
    assert_eq!(grad.dim(), (1, 3, bins));
    assert!(grad.iter().all(|v| *v == 0.0));
    let (pdf, _) = engine.pdf(&lone).unwrap();
    assert!(pdf.iter().all(|v| *v == 0.0));
}
