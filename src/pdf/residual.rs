/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! Weighted residuals between observed and computed PDFs
//!
//! Both objectives share the closed-form least-squares scale
//! s = Σw·g_obs·g_calc / Σw·g_calc². Their gradients use the envelope
//! form: at the minimizing scale the ∂s/∂x term vanishes, so only the
//! explicit g_calc dependence survives. Weights default to 1.

use ndarray::{Array1, Array2, Array3, ArrayView1};

/// Outputs of one Rw evaluation; the gradient path reuses them instead
/// of recomputing the forward problem.
#[derive(Debug, Clone)]
pub struct RwReport {
    /// Weighted residual; 0 for curves equal up to scale
    pub rw: f64,
    /// Least-squares scale applied to the computed curve
    pub scale: f64,
    /// Computed PDF over the comparison window
    pub gcalc: Array1<f64>,
    /// F(Q) behind `gcalc`, masked below qmin
    pub fq: Array1<f64>,
}

fn weight_at(weights: Option<ArrayView1<'_, f64>>, k: usize) -> f64 {
    weights.map_or(1.0, |w| w[k])
}

/// Least-squares scale; 1 when the computed curve carries no signal
pub fn scale_factor(
    gobs: ArrayView1<'_, f64>,
    gcalc: ArrayView1<'_, f64>,
    weights: Option<ArrayView1<'_, f64>>,
) -> f64 {
    let mut num = 0.0;
    let mut den = 0.0;
    for k in 0..gobs.len() {
        let w = weight_at(weights, k);
        num += w * gobs[k] * gcalc[k];
        den += w * gcalc[k] * gcalc[k];
    }
    // Flat computed curve: nothing to scale against
    if den == 0.0 {
        1.0
    } else {
        num / den
    }
}

/// Weighted Rw and its scale
pub fn rw(
    gobs: ArrayView1<'_, f64>,
    gcalc: ArrayView1<'_, f64>,
    weights: Option<ArrayView1<'_, f64>>,
) -> (f64, f64) {
    let scale = scale_factor(gobs, gcalc, weights);
    let mut num = 0.0;
    let mut den = 0.0;
    for k in 0..gobs.len() {
        let w = weight_at(weights, k);
        let diff = gobs[k] - scale * gcalc[k];
        num += w * diff * diff;
        den += w * gobs[k] * gobs[k];
    }
    // Flat observed curve: perfect agreement by convention
    if den == 0.0 {
        (0.0, scale)
    } else {
        ((num / den).sqrt(), scale)
    }
}

/// Weighted chi² and its scale
pub fn chi_squared(
    gobs: ArrayView1<'_, f64>,
    gcalc: ArrayView1<'_, f64>,
    weights: Option<ArrayView1<'_, f64>>,
) -> (f64, f64) {
    let scale = scale_factor(gobs, gcalc, weights);
    let mut sum = 0.0;
    for k in 0..gobs.len() {
        let w = weight_at(weights, k);
        let diff = gobs[k] - scale * gcalc[k];
        sum += w * diff * diff;
    }
    (sum, scale)
}

/// ∂Rw/∂position from a finished forward evaluation
///
/// `grad_gcalc` is the PDF-space gradient restricted to the comparison
/// window, shape `(n, 3, window)`. Output shape `(n, 3)`.
pub fn rw_gradient(
    rw: f64,
    scale: f64,
    gobs: ArrayView1<'_, f64>,
    gcalc: ArrayView1<'_, f64>,
    grad_gcalc: &Array3<f64>,
    weights: Option<ArrayView1<'_, f64>>,
) -> Array2<f64> {
    let (n, axes, window) = grad_gcalc.dim();
    let mut out = Array2::zeros((n, axes));
    // At rw == 0 the residual sits at its minimum along every axis
    if rw == 0.0 {
        return out;
    }
    let mut den = 0.0;
    for k in 0..gobs.len() {
        den += weight_at(weights, k) * gobs[k] * gobs[k];
    }
    let lead = scale / (rw * den);
    for i in 0..n {
        for w_axis in 0..axes {
            let mut acc = 0.0;
            for k in 0..window {
                let w = weight_at(weights, k);
                acc += w * (scale * gcalc[k] - gobs[k]) * grad_gcalc[[i, w_axis, k]];
            }
            out[[i, w_axis]] = lead * acc;
        }
    }
    out
}

/// ∂chi²/∂position from a finished forward evaluation
pub fn chi_squared_gradient(
    scale: f64,
    gobs: ArrayView1<'_, f64>,
    gcalc: ArrayView1<'_, f64>,
    grad_gcalc: &Array3<f64>,
    weights: Option<ArrayView1<'_, f64>>,
) -> Array2<f64> {
    let (n, axes, window) = grad_gcalc.dim();
    let mut out = Array2::zeros((n, axes));
    for i in 0..n {
        for w_axis in 0..axes {
            let mut acc = 0.0;
            for k in 0..window {
                let w = weight_at(weights, k);
                acc += w * (gobs[k] - scale * gcalc[k]) * grad_gcalc[[i, w_axis, k]];
            }
            out[[i, w_axis]] = -2.0 * scale * acc;
        }
    }
    out
}
