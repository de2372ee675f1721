/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! Dense NxN reference kernels
//!
//! These walk the full partner matrix per atom instead of the flat
//! pair enumeration. They exist as the easy-to-audit mirror of the
//! chunked kernels: simple nested loops, no index bijection, no
//! chunking. The conformance tests hold every other backend to these.
//!
//! Contract matches the flat path: `fq_dense` returns the raw
//! unordered pair sum, `gradient_dense` the raw one-sided per-atom
//! accumulation; neither applies the ordered-sum doubling nor the
//! 1/(N * msn) normalization.

use ndarray::{Array1, Array3};

use crate::atoms::Vector3D;
use crate::config::QGrid;
use crate::scattering::ScatterTable;

#[inline]
fn pair_distance(positions: &[Vector3D], i: usize, j: usize) -> (Vector3D, f64) {
    let d = positions[i] - positions[j];
    (d, d.length())
}

#[inline]
fn pair_adp(adps: &[Vector3D], i: usize, j: usize) -> [f64; 3] {
    let a = adps[i].abs();
    let b = adps[j].abs();
    [
        (a.x + b.x) / 2.0,
        (a.y + b.y) / 2.0,
        (a.z + b.z) / 2.0,
    ]
}

#[inline]
fn pair_sigma(d: Vector3D, r: f64, ubar: [f64; 3]) -> f64 {
    if r == 0.0 {
        return 0.0;
    }
    let s = (ubar[0] * d.x + ubar[1] * d.y + ubar[2] * d.z) / r;
    s * s
}

/// Raw unordered F(Q) sum over the strict lower triangle
pub fn fq_dense(
    positions: &[Vector3D],
    adps: Option<&[Vector3D]>,
    table: &ScatterTable,
    qgrid: &QGrid,
) -> Array1<f64> {
    let bins = qgrid.bins();
    let values = table.values();
    let mut fq = Array1::zeros(bins);
    for i in 1..positions.len() {
        for j in 0..i {
            let (d, r) = pair_distance(positions, i, j);
            if r == 0.0 {
                continue;
            }
            let sigma = adps.map(|adps| pair_sigma(d, r, pair_adp(adps, i, j)));
            for q in 0..bins {
                let qv = qgrid.q(q);
                let omega = (qv * r).sin() / r;
                let tau = match sigma {
                    Some(sigma) => (-0.5 * sigma * qv * qv).exp(),
                    None => 1.0,
                };
                fq[q] += values[[i, q]] * values[[j, q]] * omega * tau;
            }
        }
    }
    fq
}

/// Raw one-sided gradient: for each atom the sum over all partners
pub fn gradient_dense(
    positions: &[Vector3D],
    adps: Option<&[Vector3D]>,
    table: &ScatterTable,
    qgrid: &QGrid,
) -> Array3<f64> {
    let n = positions.len();
    let bins = qgrid.bins();
    let values = table.values();
    let mut grad = Array3::zeros((n, 3, bins));
    for i in 0..n {
        for j in 0..n {
            if j == i {
                continue;
            }
            let (d, r) = pair_distance(positions, i, j);
            if r == 0.0 {
                continue;
            }
            let dw = [d.x, d.y, d.z];
            let r2 = r * r;
            match adps {
                None => {
                    for q in 0..bins {
                        let qv = qgrid.q(q);
                        let omega = (qv * r).sin() / r;
                        let a = (qv * (qv * r).cos() - omega) / r2;
                        let nw = values[[i, q]] * values[[j, q]];
                        for w in 0..3 {
                            grad[[i, w, q]] += nw * a * dw[w];
                        }
                    }
                }
                Some(adps) => {
                    let ubar = pair_adp(adps, i, j);
                    let sigma = pair_sigma(d, r, ubar);
                    let r3 = r2 * r;
                    let d2 = r2;
                    for q in 0..bins {
                        let qv = qgrid.q(q);
                        let omega = (qv * r).sin() / r;
                        let tau = (-0.5 * sigma * qv * qv).exp();
                        let a_omega = (qv * (qv * r).cos() - omega) / r2;
                        let a_tau = -(qv * qv) * sigma * tau / r3;
                        let nw = values[[i, q]] * values[[j, q]];
                        for w in 0..3 {
                            let mut tmp = 0.0;
                            for z in 0..3 {
                                let c = if z == w {
                                    d2 - dw[w] * dw[w]
                                } else {
                                    -dw[w] * dw[z]
                                };
                                tmp += c * ubar[z];
                            }
                            grad[[i, w, q]] +=
                                nw * (tau * a_omega * dw[w] + omega * a_tau * tmp);
                        }
                    }
                }
            }
        }
    }
    grad
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::flat;
    use crate::kernels::pairs::PairChunk;
    use approx::assert_relative_eq;

    fn cluster() -> Vec<Vector3D> {
        vec![
            Vector3D::new(0.0, 0.0, 0.0),
            Vector3D::new(1.8, 0.1, -0.2),
            Vector3D::new(-0.4, 2.1, 0.3),
            Vector3D::new(0.9, 1.0, 1.7),
        ]
    }

    fn table(n: usize) -> ScatterTable {
        let species = vec![79; n];
        ScatterTable::build(&species, &qgrid()).unwrap()
    }

    fn qgrid() -> QGrid {
        QGrid::new(0.0, 12.0, 0.4).unwrap()
    }

    #[test]
    fn test_dense_dimer_closed_form() {
        let positions = vec![Vector3D::origin(), Vector3D::new(0.0, 0.0, 3.0)];
        let qg = qgrid();
        let tab = table(2);
        let fq = fq_dense(&positions, None, &tab, &qg);
        for q in 0..qg.bins() {
            let qv = qg.q(q);
            let f = tab.values()[[0, q]];
            assert_relative_eq!(
                fq[q],
                f * f * (qv * 3.0).sin() / 3.0,
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn test_dense_matches_flat_fq() {
        let positions = cluster();
        let qg = qgrid();
        let tab = table(positions.len());
        let dense = fq_dense(&positions, None, &tab, &qg);

        let chunk = PairChunk::full(positions.len());
        let geom = flat::geometry(&positions, chunk);
        let norm = flat::normalization(&tab, chunk);
        let om = flat::omega(&geom.dist, &qg);
        let flat_fq = flat::fq_partial(&norm, &om, None);

        for q in 0..qg.bins() {
            assert_relative_eq!(dense[q], flat_fq[q], max_relative = 1e-12);
        }
    }

    #[test]
    fn test_dense_matches_flat_gradient() {
        let positions = cluster();
        let qg = qgrid();
        let tab = table(positions.len());
        let dense = gradient_dense(&positions, None, &tab, &qg);

        let chunk = PairChunk::full(positions.len());
        let geom = flat::geometry(&positions, chunk);
        let norm = flat::normalization(&tab, chunk);
        let om = flat::omega(&geom.dist, &qg);
        let mut flat_grad = Array3::zeros((positions.len(), 3, qg.bins()));
        flat::accumulate_gradient(&mut flat_grad, chunk, &geom, &norm, &om, &qg, None);

        for i in 0..positions.len() {
            for w in 0..3 {
                for q in 0..qg.bins() {
                    assert_relative_eq!(
                        dense[[i, w, q]],
                        flat_grad[[i, w, q]],
                        max_relative = 1e-10,
                        epsilon = 1e-12
                    );
                }
            }
        }
    }

    #[test]
    fn test_dense_matches_flat_with_adps() {
        let positions = cluster();
        let adps = vec![
            Vector3D::new(0.10, 0.12, 0.08),
            Vector3D::new(0.09, 0.11, 0.10),
            Vector3D::new(0.13, 0.07, 0.09),
            Vector3D::new(0.08, 0.10, 0.12),
        ];
        let qg = qgrid();
        let tab = table(positions.len());
        let dense_fq = fq_dense(&positions, Some(&adps), &tab, &qg);
        let dense_grad = gradient_dense(&positions, Some(&adps), &tab, &qg);

        let chunk = PairChunk::full(positions.len());
        let geom = flat::geometry(&positions, chunk);
        let norm = flat::normalization(&tab, chunk);
        let om = flat::omega(&geom.dist, &qg);
        let sig = flat::sigma(&adps, &geom, chunk);
        let ta = flat::tau(&sig, &qg);
        let flat_fq = flat::fq_partial(&norm, &om, Some(&ta));
        let adp = flat::AdpTerms {
            adps: &adps,
            sigma: &sig,
            tau: &ta,
        };
        let mut flat_grad = Array3::zeros((positions.len(), 3, qg.bins()));
        flat::accumulate_gradient(&mut flat_grad, chunk, &geom, &norm, &om, &qg, Some(adp));

        for q in 0..qg.bins() {
            assert_relative_eq!(dense_fq[q], flat_fq[q], max_relative = 1e-12);
        }
        for i in 0..positions.len() {
            for w in 0..3 {
                for q in 0..qg.bins() {
                    assert_relative_eq!(
                        dense_grad[[i, w, q]],
                        flat_grad[[i, w, q]],
                        max_relative = 1e-10,
                        epsilon = 1e-12
                    );
                }
            }
        }
    }

    #[test]
    fn test_dense_adp_damps_high_q() {
        let positions = vec![Vector3D::origin(), Vector3D::new(0.0, 0.0, 2.5)];
        let adps = vec![Vector3D::new(0.0, 0.0, 0.2), Vector3D::new(0.0, 0.0, 0.2)];
        let qg = qgrid();
        let tab = table(2);
        let plain = fq_dense(&positions, None, &tab, &qg);
        let damped = fq_dense(&positions, Some(&adps), &tab, &qg);
        let q = qg.bins() - 1;
        assert!(damped[q].abs() < plain[q].abs());
        // tau -> 1 as Q -> 0
        assert_relative_eq!(damped[0], plain[0], max_relative = 1e-12);
    }
}
