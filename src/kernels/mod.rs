/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! Pairwise Debye-sum kernels
//!
//! Two kernel families with one numeric contract:
//!
//! - [`flat`] walks a flat enumeration of unordered pairs in chunks,
//!   which is what the serial, threaded and GPU backends consume.
//! - [`dense`] walks the full NxN partner matrix with plain nested
//!   loops and serves as the reference the other paths are tested
//!   against.
//!
//! Both families return raw sums: the unordered pair total for F(Q)
//! and the one-sided per-atom accumulation for the gradient. The
//! engine applies the ordered-sum doubling and the scatter
//! normalization on top.

pub mod dense;
pub mod flat;
pub mod pairs;

pub use pairs::{pair_count, PairChunk};
