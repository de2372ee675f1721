/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! Error types for the atoms module

/// Error types for the atoms module
#[derive(Debug, thiserror::Error)]
pub enum AtomError {
    #[error("species count {species} does not match atom count {atoms}")]
    SpeciesCountMismatch { atoms: usize, species: usize },

    #[error("displacement parameter count {adps} does not match atom count {atoms}")]
    AdpCountMismatch { atoms: usize, adps: usize },

    #[error("non-finite coordinate on atom {0}")]
    NonFiniteCoordinate(usize),

    #[error("non-finite displacement parameter on atom {0}")]
    NonFiniteAdp(usize),
}

/// Result type for atom operations
pub type Result<T> = std::result::Result<T, AtomError>;
