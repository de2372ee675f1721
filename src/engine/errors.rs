/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! Error types for the engine module

/// Error types for the engine module
///
/// Aggregates the module-level errors an evaluation can surface, plus
/// the engine's own input checks.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("atom error: {0}")]
    Atom(#[from] crate::atoms::AtomError),

    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("scattering error: {0}")]
    Scattering(#[from] crate::scattering::ScatteringError),

    #[error("backend error: {0}")]
    Backend(#[from] crate::backend::BackendError),

    #[error("observed PDF has {actual} points, expected {expected} for the configured r window")]
    ObservedLengthMismatch { expected: usize, actual: usize },
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
