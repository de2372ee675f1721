/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! Thermal smearing through atomic displacement parameters
//!
//! A homonuclear dimer has a closed-form F(Q): the scatter factors
//! cancel under normalization and the damped profile is
//! sin(Q L) / L * exp(-sigma Q^2 / 2) with sigma the squared ADP
//! projection onto the bond.

use approx::assert_relative_eq;
use debye_rs::atoms::{AtomicConfig, Vector3D};
use debye_rs::backend::Backend;
use debye_rs::config::{DebyeConfig, QGrid, RGrid};
use debye_rs::engine::DebyeEngine;

const BOND: f64 = 2.5;

fn sampling() -> DebyeConfig {
    DebyeConfig::new(
        QGrid::new(0.0, 25.0, 0.1).unwrap(),
        RGrid::new(0.0, 10.0, 0.01).unwrap(),
    )
    .unwrap()
}

fn dimer_positions() -> Vec<Vector3D> {
    vec![Vector3D::origin(), Vector3D::new(0.0, 0.0, BOND)]
}

fn dimer(adps: Option<Vector3D>) -> AtomicConfig {
    let positions = dimer_positions();
    let species = vec![79, 79];
    match adps {
        Some(u) => AtomicConfig::with_adps(positions, species, vec![u; 2]).unwrap(),
        None => AtomicConfig::new(positions, species).unwrap(),
    }
}

#[test]
fn test_dimer_fq_with_adps_matches_closed_form() {
    let mut engine = DebyeEngine::new(sampling(), Backend::Serial).unwrap();
    let u = 0.1;
    let fq = engine
        .fq(&dimer(Some(Vector3D::new(u, u, u))))
        .unwrap();
    for k in 0..engine.config().qgrid.bins() {
        let q = engine.config().qgrid.q(k);
        let expected = (q * BOND).sin() / BOND * (-0.5 * u * u * q * q).exp();
        assert_relative_eq!(fq[k], expected, max_relative = 1e-10, epsilon = 1e-12);
    }
}

#[test]
fn test_zero_adps_match_absent_adps() {
    let mut engine = DebyeEngine::new(sampling(), Backend::Serial).unwrap();
    let plain = dimer(None);
    let frozen = dimer(Some(Vector3D::origin()));

    let fq_plain = engine.fq(&plain).unwrap();
    let fq_frozen = engine.fq(&frozen).unwrap();
    for (a, b) in fq_plain.iter().zip(fq_frozen.iter()) {
        assert_relative_eq!(a, b, max_relative = 1e-14, epsilon = 1e-15);
    }

    let grad_plain = engine.fq_gradient(&plain).unwrap();
    let grad_frozen = engine.fq_gradient(&frozen).unwrap();
    for (a, b) in grad_plain.iter().zip(grad_frozen.iter()) {
        assert_relative_eq!(a, b, max_relative = 1e-14, epsilon = 1e-15);
    }
}

#[test]
fn test_adp_damping_factorizes_for_dimer() {
    let mut engine = DebyeEngine::new(sampling(), Backend::Serial).unwrap();
    let u = 0.15;
    let fq_plain = engine.fq(&dimer(None)).unwrap();
    let fq_damped = engine.fq(&dimer(Some(Vector3D::new(u, u, u)))).unwrap();
    for k in 0..engine.config().qgrid.bins() {
        let q = engine.config().qgrid.q(k);
        let tau = (-0.5 * u * u * q * q).exp();
        assert_relative_eq!(
            fq_damped[k],
            fq_plain[k] * tau,
            max_relative = 1e-10,
            epsilon = 1e-12
        );
    }
}

#[test]
fn test_anisotropic_adps_project_onto_bond() {
    // The bond runs along z, so transverse ADP components do not enter
    // sigma and F(Q) depends only on the axial component.
    let mut engine = DebyeEngine::new(sampling(), Backend::Serial).unwrap();
    let axial = engine
        .fq(&dimer(Some(Vector3D::new(0.0, 0.0, 0.12))))
        .unwrap();
    let skewed = engine
        .fq(&dimer(Some(Vector3D::new(0.5, 0.3, 0.12))))
        .unwrap();
    for (a, b) in axial.iter().zip(skewed.iter()) {
        assert_relative_eq!(a, b, max_relative = 1e-12, epsilon = 1e-14);
    }
}

#[test]
fn test_adp_sign_is_ignored() {
    let mut engine = DebyeEngine::new(sampling(), Backend::Serial).unwrap();
    let positive = engine
        .fq(&dimer(Some(Vector3D::new(0.1, 0.1, 0.1))))
        .unwrap();
    let negative = engine
        .fq(&dimer(Some(Vector3D::new(-0.1, -0.1, -0.1))))
        .unwrap();
    for (a, b) in positive.iter().zip(negative.iter()) {
        assert_relative_eq!(a, b, max_relative = 1e-14);
    }
}

#[test]
fn test_adp_gradient_dimer_symmetry_split() {
    // Axial gradient components come from the omega derivative and
    // cancel between the two ends of the pair; transverse components
    // come from the tau projection term and are shared with equal sign.
    let mut engine = DebyeEngine::new(sampling(), Backend::Serial).unwrap();
    let grad = engine
        .fq_gradient(&dimer(Some(Vector3D::new(0.2, 0.2, 0.2))))
        .unwrap();
    let bins = engine.config().qgrid.bins();

    let mut transverse_peak = 0.0f64;
    for k in 0..bins {
        assert_relative_eq!(
            grad[[0, 2, k]],
            -grad[[1, 2, k]],
            max_relative = 1e-12,
            epsilon = 1e-14
        );
        for axis in 0..2 {
            assert_relative_eq!(
                grad[[0, axis, k]],
                grad[[1, axis, k]],
                max_relative = 1e-12,
                epsilon = 1e-14
            );
            transverse_peak = transverse_peak.max(grad[[0, axis, k]].abs());
        }
    }
    assert!(
        transverse_peak > 0.0,
        "thermal projection must produce transverse terms"
    );
}
