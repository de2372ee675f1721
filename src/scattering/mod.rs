/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! Scatter-factor module
//!
//! This module turns species codes into per-atom, per-Q scattering
//! amplitudes: Cromer-Mann coefficients, the amplitude table consumed by
//! the pairwise kernels, and the explicit cross-call cache that keeps
//! the table alive while geometry changes between evaluations.

pub mod errors;

mod cromer_mann;
mod table;

pub use cromer_mann::{for_species, CromerMann};
pub use errors::{Result, ScatteringError};
pub use table::{ScatterTable, ScatterTableCache};
