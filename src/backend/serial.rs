/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! Single-threaded chunked backend
//!
//! Walks the flat pair enumeration one bounded chunk at a time, so
//! peak memory stays proportional to the chunk size and the Q grid
//! rather than to the full pair count. The chunk assembly helpers
//! here are shared with the threaded backend, which runs the same
//! chunks across a rayon pool.

use ndarray::{Array1, Array3};

use super::errors::Result;
use super::{DebyeJob, DebyeKernels};
use crate::kernels::flat::{self, AdpTerms};
use crate::kernels::pairs::{self, PairChunk};

/// Pairs per work chunk for the CPU backends
pub(super) const CHUNK_PAIRS: usize = 1024;

/// Assemble one chunk and reduce it to its F(Q) partial
pub(super) fn chunk_fq(job: &DebyeJob<'_>, chunk: PairChunk) -> Array1<f64> {
    let geom = flat::geometry(job.positions, chunk);
    let norm = flat::normalization(job.table, chunk);
    let omega = flat::omega(&geom.dist, job.qgrid);
    match job.adps {
        Some(adps) => {
            let sigma = flat::sigma(adps, &geom, chunk);
            let tau = flat::tau(&sigma, job.qgrid);
            flat::fq_partial(&norm, &omega, Some(&tau))
        }
        None => flat::fq_partial(&norm, &omega, None),
    }
}

/// Assemble one chunk and fold its gradient contributions into `grad`
pub(super) fn chunk_gradient(grad: &mut Array3<f64>, job: &DebyeJob<'_>, chunk: PairChunk) {
    let geom = flat::geometry(job.positions, chunk);
    let norm = flat::normalization(job.table, chunk);
    let omega = flat::omega(&geom.dist, job.qgrid);
    match job.adps {
        Some(adps) => {
            let sigma = flat::sigma(adps, &geom, chunk);
            let tau = flat::tau(&sigma, job.qgrid);
            let adp = AdpTerms {
                adps,
                sigma: &sigma,
                tau: &tau,
            };
            flat::accumulate_gradient(grad, chunk, &geom, &norm, &omega, job.qgrid, Some(adp));
        }
        None => flat::accumulate_gradient(grad, chunk, &geom, &norm, &omega, job.qgrid, None),
    }
}

/// Sequential reference backend
pub struct SerialKernels;

impl DebyeKernels for SerialKernels {
    fn label(&self) -> &'static str {
        "serial"
    }

    fn fq_raw(&self, job: &DebyeJob<'_>) -> Result<Array1<f64>> {
        let total = pairs::pair_count(job.positions.len());
        let mut fq = Array1::zeros(job.qgrid.bins());
        for chunk in pairs::partition(total, CHUNK_PAIRS) {
            fq += &chunk_fq(job, chunk);
        }
        Ok(fq)
    }

    fn gradient_raw(&self, job: &DebyeJob<'_>) -> Result<Array3<f64>> {
        let n = job.positions.len();
        let mut grad = Array3::zeros((n, 3, job.qgrid.bins()));
        for chunk in pairs::partition(pairs::pair_count(n), CHUNK_PAIRS) {
            chunk_gradient(&mut grad, job, chunk);
        }
        Ok(grad)
    }
}
