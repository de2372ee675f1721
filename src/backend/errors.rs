/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! Error types for the compute backends

use thiserror::Error;

/// Errors raised while setting up or running a compute backend
#[derive(Error, Debug)]
pub enum BackendError {
    /// No GPU adapter with f64 shader support was found
    #[error("no GPU adapter with SHADER_F64 support")]
    NoAdapter,

    /// GPU device creation failed
    #[error("GPU device creation failed: {0}")]
    DeviceCreation(String),

    /// Reading results back from the GPU failed
    #[error("GPU readback failed: {0}")]
    Readback(String),
}

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, BackendError>;
