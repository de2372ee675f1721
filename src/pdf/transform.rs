/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! Fourier transform from F(Q) to the reduced pair distribution
//!
//! G(r) = (2/π)·qbin·Σ_k F(Q_k)·sin(Q_k·r) over the sampled bins, with
//! bins below the configured qmin excluded. The transform is linear,
//! so the same operator maps each (atom, axis) slice of the F(Q)
//! gradient into PDF space.

use ndarray::{s, Array1, Array2, Array3};

use crate::config::{QGrid, RGrid};

/// Sine operator mapping Q bins to r points. Columns below the qmin
/// cutoff are zero, so masked bins never contribute.
fn sine_operator(qgrid: &QGrid, rgrid: &RGrid) -> Array2<f64> {
    let bins = qgrid.bins();
    let points = rgrid.points();
    let qmin_bin = qgrid.qmin_bin();
    let mut op = Array2::zeros((points, bins));
    for r_idx in 0..points {
        let r = rgrid.r(r_idx);
        for qx in qmin_bin..bins {
            op[[r_idx, qx]] = (qgrid.q(qx) * r).sin();
        }
    }
    op
}

/// Copy of `fq` with bins below the qmin cutoff zeroed
pub fn mask_low_q(fq: &Array1<f64>, qgrid: &QGrid) -> Array1<f64> {
    let mut masked = fq.clone();
    for v in masked.iter_mut().take(qgrid.qmin_bin()) {
        *v = 0.0;
    }
    masked
}

/// Transform one F(Q) vector into G(r) over [0, rmax)
pub fn pdf_from_fq(fq: &Array1<f64>, qgrid: &QGrid, rgrid: &RGrid) -> Array1<f64> {
    let op = sine_operator(qgrid, rgrid);
    let prefactor = 2.0 / std::f64::consts::PI * qgrid.qbin;
    op.dot(fq) * prefactor
}

/// Transform every (atom, axis) slice of the F(Q) gradient into PDF
/// space; output shape `(n, 3, points)`.
pub fn pdf_gradient(fq_grad: &Array3<f64>, qgrid: &QGrid, rgrid: &RGrid) -> Array3<f64> {
    let (n, axes, _) = fq_grad.dim();
    let op = sine_operator(qgrid, rgrid);
    let prefactor = 2.0 / std::f64::consts::PI * qgrid.qbin;
    let mut out = Array3::zeros((n, axes, rgrid.points()));
    for i in 0..n {
        for w in 0..axes {
            let row = op.dot(&fq_grad.slice(s![i, w, ..])) * prefactor;
            out.slice_mut(s![i, w, ..]).assign(&row);
        }
    }
    out
}
