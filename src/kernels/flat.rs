/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! Chunked pairwise kernels over the flat pair enumeration
//!
//! Every kernel here works on one contiguous chunk of the flat
//! pair-index space and is oblivious to how many other workers exist.
//! Displacements are oriented displacement(i, j) = position(i) -
//! position(j) for i > j, which makes the analytic gradient terms the
//! exact derivatives with respect to atom i.
//!
//! Pairs that collapse to zero distance are clamped to a zero
//! contribution at each division site; a degenerate pair must not
//! poison the whole Q row.

use ndarray::{Array1, Array2, Array3};

use super::pairs::{self, PairChunk};
use crate::atoms::Vector3D;
use crate::config::QGrid;
use crate::scattering::ScatterTable;

/// Displacements and distances for one chunk of pairs
#[derive(Debug, Clone)]
pub struct PairGeometry {
    /// Row p: displacement(i, j) of the chunk's p-th pair
    pub disp: Array2<f64>,
    /// Distance of the chunk's p-th pair
    pub dist: Array1<f64>,
}

/// Compute displacements and distances for a chunk
pub fn geometry(positions: &[Vector3D], chunk: PairChunk) -> PairGeometry {
    let mut disp = Array2::zeros((chunk.len, 3));
    let mut dist = Array1::zeros(chunk.len);
    for p in 0..chunk.len {
        let (i, j) = pairs::decode(chunk.flat(p));
        let d = positions[i] - positions[j];
        disp[[p, 0]] = d.x;
        disp[[p, 1]] = d.y;
        disp[[p, 2]] = d.z;
        dist[p] = d.length();
    }
    PairGeometry { disp, dist }
}

/// Per-pair, per-Q scatter weighting for a chunk
pub fn normalization(table: &ScatterTable, chunk: PairChunk) -> Array2<f64> {
    let bins = table.bins();
    let values = table.values();
    let mut norm = Array2::zeros((chunk.len, bins));
    for p in 0..chunk.len {
        let (i, j) = pairs::decode(chunk.flat(p));
        for q in 0..bins {
            norm[[p, q]] = values[[i, q]] * values[[j, q]];
        }
    }
    norm
}

/// Combined per-axis displacement magnitude of a pair
#[inline]
fn adp_pair(adps: &[Vector3D], i: usize, j: usize) -> [f64; 3] {
    let a = adps[i].abs();
    let b = adps[j].abs();
    [
        (a.x + b.x) / 2.0,
        (a.y + b.y) / 2.0,
        (a.z + b.z) / 2.0,
    ]
}

/// Projected mean-square relative displacement per pair
///
/// sigma(i, j) = [sum_w adp_pair_w * disp_w / dist]^2; zero-distance
/// pairs clamp to zero.
pub fn sigma(adps: &[Vector3D], geom: &PairGeometry, chunk: PairChunk) -> Array1<f64> {
    let mut sigma = Array1::zeros(chunk.len);
    for p in 0..chunk.len {
        let (i, j) = pairs::decode(chunk.flat(p));
        let r = geom.dist[p];
        if r == 0.0 {
            continue;
        }
        let ubar = adp_pair(adps, i, j);
        let mut s = 0.0;
        for w in 0..3 {
            s += ubar[w] * geom.disp[[p, w]] / r;
        }
        sigma[p] = s * s;
    }
    sigma
}

/// Thermal damping factor tau(p, Q) = exp(-sigma(p) * Q^2 / 2)
pub fn tau(sigma: &Array1<f64>, qgrid: &QGrid) -> Array2<f64> {
    let bins = qgrid.bins();
    let mut tau = Array2::zeros((sigma.len(), bins));
    for p in 0..sigma.len() {
        for q in 0..bins {
            let qv = qgrid.q(q);
            tau[[p, q]] = (-0.5 * sigma[p] * qv * qv).exp();
        }
    }
    tau
}

/// Debye kernel omega(p, Q) = sin(Q * dist) / dist
///
/// Zero-distance pairs clamp to a zero row.
pub fn omega(dist: &Array1<f64>, qgrid: &QGrid) -> Array2<f64> {
    let bins = qgrid.bins();
    let mut omega = Array2::zeros((dist.len(), bins));
    for p in 0..dist.len() {
        let r = dist[p];
        if r == 0.0 {
            continue;
        }
        for q in 0..bins {
            omega[[p, q]] = (qgrid.q(q) * r).sin() / r;
        }
    }
    omega
}

/// Reduce a chunk into its unordered-pair F(Q) partial
///
/// The ordered-sum doubling and the 1/(N * msn) normalization are
/// applied once by the engine, outside the chunk kernels.
pub fn fq_partial(
    norm: &Array2<f64>,
    omega: &Array2<f64>,
    tau: Option<&Array2<f64>>,
) -> Array1<f64> {
    let bins = norm.ncols();
    let mut fq = Array1::zeros(bins);
    for p in 0..norm.nrows() {
        for q in 0..bins {
            let term = norm[[p, q]] * omega[[p, q]];
            fq[q] += match tau {
                Some(tau) => term * tau[[p, q]],
                None => term,
            };
        }
    }
    fq
}

/// ADP inputs for the gradient kernel
#[derive(Debug, Clone, Copy)]
pub struct AdpTerms<'a> {
    /// Per-atom displacement parameters
    pub adps: &'a [Vector3D],
    /// Per-pair sigma for this chunk
    pub sigma: &'a Array1<f64>,
    /// Per-pair, per-Q tau for this chunk
    pub tau: &'a Array2<f64>,
}

/// Quadratic form coupling the pair displacement to the combined ADP,
/// axis w: sum_z c(w, z) * ubar_z with c(w, w) = |d|^2 - d_w^2 and
/// c(w, z) = -d_w * d_z off the diagonal.
#[inline]
fn tau_quadratic(d: [f64; 3], ubar: [f64; 3], w: usize) -> f64 {
    let d2 = d[0] * d[0] + d[1] * d[1] + d[2] * d[2];
    let mut tmp = 0.0;
    for z in 0..3 {
        let c = if z == w { d2 - d[w] * d[w] } else { -d[w] * d[z] };
        tmp += c * ubar[z];
    }
    tmp
}

/// Accumulate one chunk's gradient contributions into an N x 3 x Q
/// partial tensor
///
/// Accumulates in place so callers can fold many chunks into one
/// tensor without per-chunk allocations. For each pair the omega
/// derivative is odd under exchanging the two atoms while the tau
/// derivative is even, so the two ends of a pair receive different
/// sign combinations. Partial tensors from disjoint chunks sum to the
/// full one-sided per-atom accumulation.
pub fn accumulate_gradient(
    grad: &mut Array3<f64>,
    chunk: PairChunk,
    geom: &PairGeometry,
    norm: &Array2<f64>,
    omega: &Array2<f64>,
    qgrid: &QGrid,
    adp: Option<AdpTerms<'_>>,
) {
    let bins = qgrid.bins();
    debug_assert_eq!(grad.dim().2, bins);
    for p in 0..chunk.len {
        let (i, j) = pairs::decode(chunk.flat(p));
        let r = geom.dist[p];
        if r == 0.0 {
            continue;
        }
        let d = [geom.disp[[p, 0]], geom.disp[[p, 1]], geom.disp[[p, 2]]];
        let r2 = r * r;
        match adp {
            None => {
                for q in 0..bins {
                    let qv = qgrid.q(q);
                    let a = (qv * (qv * r).cos() - omega[[p, q]]) / r2;
                    let nw = norm[[p, q]];
                    for w in 0..3 {
                        let term = nw * a * d[w];
                        grad[[i, w, q]] += term;
                        grad[[j, w, q]] -= term;
                    }
                }
            }
            Some(adp) => {
                let ubar = adp_pair(adp.adps, i, j);
                let sig = adp.sigma[p];
                let r3 = r2 * r;
                for q in 0..bins {
                    let qv = qgrid.q(q);
                    let om = omega[[p, q]];
                    let ta = adp.tau[[p, q]];
                    let a_omega = (qv * (qv * r).cos() - om) / r2;
                    let a_tau = -(qv * qv) * sig * ta / r3;
                    let nw = norm[[p, q]];
                    for w in 0..3 {
                        let go = a_omega * d[w];
                        let gt = a_tau * tau_quadratic(d, ubar, w);
                        grad[[i, w, q]] += nw * (ta * go + om * gt);
                        grad[[j, w, q]] += nw * (-ta * go + om * gt);
                    }
                }
            }
        }
    }
}
