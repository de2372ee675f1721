/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! Error types for the scattering module

/// Error types for the scattering module
#[derive(Debug, thiserror::Error)]
pub enum ScatteringError {
    #[error("no scatter-factor coefficients tabulated for atomic number {0}")]
    UnknownSpecies(i32),
}

/// Result type for scattering operations
pub type Result<T> = std::result::Result<T, ScatteringError>;
