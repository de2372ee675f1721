/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! Error types for sampling configuration

/// Error types for sampling configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("scattering-vector increment must be positive and finite, got {0}")]
    InvalidQbin(f64),

    #[error("real-space increment must be positive and finite, got {0}")]
    InvalidRstep(f64),

    #[error("scattering-vector range [{qmin}, {qmax}] must be non-negative and ascending")]
    InvalidQRange { qmin: f64, qmax: f64 },

    #[error("real-space range [{rmin}, {rmax}] must be non-negative and ascending")]
    InvalidRRange { rmin: f64, rmax: f64 },
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
