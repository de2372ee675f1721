/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! Rayon-threaded chunked backend
//!
//! Identical chunk kernels to the serial backend, folded across the
//! rayon pool. Each worker keeps one private accumulator, so no locks
//! are taken on the hot path and the reduction is a plain elementwise
//! sum of per-worker partials.

use ndarray::{Array1, Array3};
use rayon::prelude::*;

use super::errors::Result;
use super::serial::{chunk_fq, chunk_gradient, CHUNK_PAIRS};
use super::{DebyeJob, DebyeKernels};
use crate::kernels::pairs;

/// Thread-pool backend over the same chunk kernels as [`super::serial::SerialKernels`]
pub struct MultiCoreKernels;

impl DebyeKernels for MultiCoreKernels {
    fn label(&self) -> &'static str {
        "multicore"
    }

    fn fq_raw(&self, job: &DebyeJob<'_>) -> Result<Array1<f64>> {
        let bins = job.qgrid.bins();
        let chunks = pairs::partition(pairs::pair_count(job.positions.len()), CHUNK_PAIRS);
        let fq = chunks
            .par_iter()
            .fold(
                || Array1::zeros(bins),
                |mut acc: Array1<f64>, &chunk| {
                    acc += &chunk_fq(job, chunk);
                    acc
                },
            )
            .reduce(|| Array1::zeros(bins), |a, b| a + b);
        Ok(fq)
    }

    fn gradient_raw(&self, job: &DebyeJob<'_>) -> Result<Array3<f64>> {
        let n = job.positions.len();
        let bins = job.qgrid.bins();
        let chunks = pairs::partition(pairs::pair_count(n), CHUNK_PAIRS);
        let grad = chunks
            .par_iter()
            .fold(
                || Array3::zeros((n, 3, bins)),
                |mut acc: Array3<f64>, &chunk| {
                    chunk_gradient(&mut acc, job, chunk);
                    acc
                },
            )
            .reduce(|| Array3::zeros((n, 3, bins)), |a, b| a + b);
        Ok(grad)
    }
}
