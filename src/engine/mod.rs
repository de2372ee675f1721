/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! Elastic scattering engine
//!
//! [`DebyeEngine`] ties the pieces together: it owns the sampling
//! configuration, the backend dispatcher, and the scatter-table cache,
//! and exposes the user-facing operations — F(Q), its gradient, the
//! PDF, and the Rw / chi² residuals against an observed curve.
//!
//! Backends return raw unordered pair sums; the engine scales them by
//! 2/(N·msn(Q)) to the normalized structure function, clamping to zero
//! wherever the normalization vanishes. Configurations with fewer than
//! two atoms therefore report flat zero signals rather than errors.

pub mod errors;

use log::debug;
use ndarray::{s, Array1, Array2, Array3};

use crate::atoms::AtomicConfig;
use crate::backend::{Backend, DebyeJob, Dispatcher};
use crate::config::DebyeConfig;
use crate::pdf::residual::{self, RwReport};
use crate::pdf::transform;
use crate::scattering::ScatterTableCache;

pub use errors::{EngineError, Result};

/// Scale a raw unordered pair sum to F(Q) = 2·raw/(N·msn)
fn normalize_fq(raw: Array1<f64>, msn: &Array1<f64>, n: usize) -> Array1<f64> {
    Array1::from_shape_fn(raw.len(), |k| {
        let denom = n as f64 * msn[k];
        // Degenerate normalization reports zero signal
        if denom == 0.0 {
            0.0
        } else {
            2.0 * raw[k] / denom
        }
    })
}

/// Apply the same per-bin scaling across every (atom, axis) slice
fn normalize_gradient(mut raw: Array3<f64>, msn: &Array1<f64>, n: usize) -> Array3<f64> {
    for ((_, _, k), v) in raw.indexed_iter_mut() {
        let denom = n as f64 * msn[k];
        *v = if denom == 0.0 { 0.0 } else { 2.0 * *v / denom };
    }
    raw
}

/// Debye-sum evaluator with a fixed sampling configuration
pub struct DebyeEngine {
    config: DebyeConfig,
    dispatcher: Dispatcher,
    cache: ScatterTableCache,
}

impl DebyeEngine {
    /// Create an engine for one sampling configuration and backend
    ///
    /// GPU backends acquire their devices lazily on first use, so
    /// construction never touches hardware.
    pub fn new(config: DebyeConfig, backend: Backend) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            dispatcher: Dispatcher::new(backend),
            cache: ScatterTableCache::new(),
        })
    }

    /// Sampling configuration in force
    pub fn config(&self) -> &DebyeConfig {
        &self.config
    }

    /// Selected backend
    pub fn backend(&self) -> Backend {
        self.dispatcher.backend()
    }

    /// Scatter-table builds performed so far
    pub fn table_builds(&self) -> u64 {
        self.cache.builds()
    }

    /// Reduced structure function F(Q), full unmasked vector
    pub fn fq(&mut self, config: &AtomicConfig) -> Result<Array1<f64>> {
        let table = self.cache.get_or_build(config.species(), &self.config.qgrid)?;
        let job = DebyeJob {
            positions: config.positions(),
            adps: config.adps(),
            table,
            qgrid: &self.config.qgrid,
        };
        let raw = self.dispatcher.fq_raw(&job)?;
        Ok(normalize_fq(raw, table.mean_square_norm(), config.len()))
    }

    /// Analytic ∂F(Q)/∂position, shape `(n, 3, bins)`
    pub fn fq_gradient(&mut self, config: &AtomicConfig) -> Result<Array3<f64>> {
        let table = self.cache.get_or_build(config.species(), &self.config.qgrid)?;
        let job = DebyeJob {
            positions: config.positions(),
            adps: config.adps(),
            table,
            qgrid: &self.config.qgrid,
        };
        let raw = self.dispatcher.gradient_raw(&job)?;
        Ok(normalize_gradient(raw, table.mean_square_norm(), config.len()))
    }

    /// PDF over [0, rmax) plus the qmin-masked F(Q) behind it
    pub fn pdf(&mut self, config: &AtomicConfig) -> Result<(Array1<f64>, Array1<f64>)> {
        let fq = self.fq(config)?;
        let masked = transform::mask_low_q(&fq, &self.config.qgrid);
        let pdf = transform::pdf_from_fq(&masked, &self.config.qgrid, &self.config.rgrid);
        Ok((pdf, masked))
    }

    /// ∂PDF/∂position over [0, rmax), shape `(n, 3, points)`
    pub fn pdf_gradient(&mut self, config: &AtomicConfig) -> Result<Array3<f64>> {
        let grad_fq = self.fq_gradient(config)?;
        Ok(transform::pdf_gradient(
            &grad_fq,
            &self.config.qgrid,
            &self.config.rgrid,
        ))
    }

    /// Rw against an observed PDF sampled on the comparison window
    ///
    /// The observed curve starts at rmin: its length must equal the
    /// configured points minus the rmin offset.
    pub fn rw(&mut self, config: &AtomicConfig, gobs: &Array1<f64>) -> Result<RwReport> {
        self.check_observed(gobs)?;
        let (pdf, fq) = self.pdf(config)?;
        let gcalc = pdf.slice(s![self.config.rgrid.rmin_bin()..]).to_owned();
        let (rw, scale) = residual::rw(gobs.view(), gcalc.view(), None);
        debug!("rw = {rw:.6} at scale {scale:.6}");
        Ok(RwReport {
            rw,
            scale,
            gcalc,
            fq,
        })
    }

    /// chi² against an observed PDF, with its least-squares scale
    pub fn chi_squared(&mut self, config: &AtomicConfig, gobs: &Array1<f64>) -> Result<(f64, f64)> {
        self.check_observed(gobs)?;
        let (pdf, _) = self.pdf(config)?;
        let gcalc = pdf.slice(s![self.config.rgrid.rmin_bin()..]).to_owned();
        Ok(residual::chi_squared(gobs.view(), gcalc.view(), None))
    }

    /// ∂Rw/∂position, shape `(n, 3)`
    ///
    /// A report from a previous [`DebyeEngine::rw`] call on the same
    /// configuration can be passed as `cached` to skip the forward
    /// evaluation; only the gradient pipeline runs then.
    pub fn rw_gradient(
        &mut self,
        config: &AtomicConfig,
        gobs: &Array1<f64>,
        cached: Option<&RwReport>,
    ) -> Result<Array2<f64>> {
        self.check_observed(gobs)?;
        let fresh;
        let forward = match cached {
            Some(report) => report,
            None => {
                fresh = self.rw(config, gobs)?;
                &fresh
            }
        };
        let window = self.gradient_window(config)?;
        Ok(residual::rw_gradient(
            forward.rw,
            forward.scale,
            gobs.view(),
            forward.gcalc.view(),
            &window,
            None,
        ))
    }

    /// ∂chi²/∂position, shape `(n, 3)`, with the same caching contract
    /// as [`DebyeEngine::rw_gradient`]
    pub fn chi_squared_gradient(
        &mut self,
        config: &AtomicConfig,
        gobs: &Array1<f64>,
        cached: Option<&RwReport>,
    ) -> Result<Array2<f64>> {
        self.check_observed(gobs)?;
        let fresh;
        let forward = match cached {
            Some(report) => report,
            None => {
                fresh = self.rw(config, gobs)?;
                &fresh
            }
        };
        let window = self.gradient_window(config)?;
        Ok(residual::chi_squared_gradient(
            forward.scale,
            gobs.view(),
            forward.gcalc.view(),
            &window,
            None,
        ))
    }

    /// PDF-space gradient restricted to the comparison window
    fn gradient_window(&mut self, config: &AtomicConfig) -> Result<Array3<f64>> {
        let grad_pdf = self.pdf_gradient(config)?;
        Ok(grad_pdf
            .slice(s![.., .., self.config.rgrid.rmin_bin()..])
            .to_owned())
    }

    fn check_observed(&self, gobs: &Array1<f64>) -> Result<()> {
        let expected = self.config.rgrid.points() - self.config.rgrid.rmin_bin();
        if gobs.len() != expected {
            return Err(EngineError::ObservedLengthMismatch {
                expected,
                actual: gobs.len(),
            });
        }
        Ok(())
    }
}
