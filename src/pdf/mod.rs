/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! PDF-space operations
//!
//! Shared host-side stages downstream of every backend: the sine
//! transform from F(Q) to G(r), and the Rw / chi² residuals with their
//! envelope-form gradients.

pub mod residual;
pub mod transform;

pub use residual::RwReport;
