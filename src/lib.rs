/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! # debye-rs
//!
//! Pairwise Debye-sum elastic scattering for finite atomic clusters.
//!
//! The crate computes the reduced structure function F(Q) and the pair
//! distribution function G(r) of an atomic configuration, together with
//! the analytic gradients of both and of the Rw / chi² residuals
//! against observed data — the quantities a structure-refinement loop
//! needs at every step.
//!
//! Several numerically agreeing backends evaluate the pair sums: a
//! serial reference, a rayon thread pool, and WGSL compute shaders on
//! one or many f64-capable GPUs. [`engine::DebyeEngine`] is the entry
//! point; backends are selected by configuration.

pub mod atoms;
pub mod backend;
pub mod cli;
pub mod config;
pub mod engine;
pub mod kernels;
pub mod pdf;
pub mod scattering;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

pub use atoms::{AtomicConfig, Vector3D};
pub use backend::Backend;
pub use config::{DebyeConfig, QGrid, RGrid};
pub use engine::DebyeEngine;
pub use pdf::RwReport;
