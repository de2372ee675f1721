/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! Atomic configuration module
//!
//! This module provides the immutable snapshot types the scattering
//! engine consumes: 3D vectors, atom positions, species codes, and
//! optional displacement parameters.

pub mod errors;

mod structure;
mod vector;

pub use errors::{AtomError, Result};
pub use structure::AtomicConfig;
pub use vector::Vector3D;
