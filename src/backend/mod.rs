/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! Compute backends for the Debye sums
//!
//! Every backend evaluates the same two primitives over the strict
//! lower triangle of the pair matrix:
//!
//! * `fq_raw` — the unordered pair sum of `f_i f_j sin(Q r)/r` per Q bin
//! * `gradient_raw` — the one-sided per-atom derivative of that sum
//!
//! Backends agree numerically; they differ only in where the pair
//! ranges run (one thread, a rayon pool, or f64-capable GPUs). Scaling
//! by 2/(N <f>^2) is applied by the engine on top of the raw sums, so
//! kernels stay free of normalization policy.

use clap::ValueEnum;
use ndarray::{Array1, Array3};
use serde::{Deserialize, Serialize};

use crate::atoms::Vector3D;
use crate::config::QGrid;
use crate::scattering::ScatterTable;

pub mod errors;
mod gpu;
mod multicore;
mod serial;
mod shaders;

pub use errors::{BackendError, Result};
pub use gpu::GpuPool;
pub use multicore::MultiCoreKernels;
pub use serial::SerialKernels;

/// Backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// Single-threaded CPU
    Serial,
    /// Rayon thread pool
    MultiCore,
    /// First f64-capable GPU
    GpuSingle,
    /// All f64-capable GPUs
    GpuMulti,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Serial => "serial",
            Backend::MultiCore => "multi-core",
            Backend::GpuSingle => "gpu-single",
            Backend::GpuMulti => "gpu-multi",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Borrowed inputs for one kernel evaluation
///
/// Positions and ADPs are Cartesian per atom; the scatter table rows
/// follow atom order and its columns the Q grid.
pub struct DebyeJob<'a> {
    pub positions: &'a [Vector3D],
    pub adps: Option<&'a [Vector3D]>,
    pub table: &'a ScatterTable,
    pub qgrid: &'a QGrid,
}

/// Contract every backend implements
pub trait DebyeKernels {
    fn label(&self) -> &'static str;

    /// Unordered pair sum per Q bin, without normalization
    fn fq_raw(&self, job: &DebyeJob<'_>) -> Result<Array1<f64>>;

    /// Per-atom derivative of the unordered sum, shape `(n, 3, bins)`
    fn gradient_raw(&self, job: &DebyeJob<'_>) -> Result<Array3<f64>>;
}

/// Routes jobs to the selected backend, opening GPUs on first use
pub struct Dispatcher {
    backend: Backend,
    gpu: Option<GpuPool>,
}

impl Dispatcher {
    pub fn new(backend: Backend) -> Self {
        Dispatcher { backend, gpu: None }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    fn pool(&mut self) -> Result<&GpuPool> {
        match self.gpu {
            Some(ref pool) => Ok(pool),
            None => {
                let pool = GpuPool::new(self.backend == Backend::GpuMulti)?;
                Ok(self.gpu.insert(pool))
            }
        }
    }

    pub fn fq_raw(&mut self, job: &DebyeJob<'_>) -> Result<Array1<f64>> {
        match self.backend {
            Backend::Serial => SerialKernels.fq_raw(job),
            Backend::MultiCore => MultiCoreKernels.fq_raw(job),
            Backend::GpuSingle | Backend::GpuMulti => self.pool()?.fq_raw(job),
        }
    }

    pub fn gradient_raw(&mut self, job: &DebyeJob<'_>) -> Result<Array3<f64>> {
        match self.backend {
            Backend::Serial => SerialKernels.gradient_raw(job),
            Backend::MultiCore => MultiCoreKernels.gradient_raw(job),
            Backend::GpuSingle | Backend::GpuMulti => self.pool()?.gradient_raw(job),
        }
    }
}
