/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! Per-atom, per-Q scatter-factor table and its cross-call cache

use std::collections::HashMap;

use log::debug;
use ndarray::{Array1, Array2};

use super::cromer_mann;
use super::errors::Result;
use crate::config::QGrid;

/// Scattering amplitudes for one configuration's species on one Q grid
///
/// Row i holds the amplitudes of atom i over all Q bins. Rows depend
/// only on species and the Q sampling, never on geometry, so the table
/// survives position updates unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterTable {
    values: Array2<f64>,
    mean_square_norm: Array1<f64>,
}

impl ScatterTable {
    /// Build the table for a species sequence on a Q grid
    ///
    /// Amplitude evaluation is deduplicated per unique species; atoms of
    /// the same element share identical rows.
    pub fn build(species: &[i32], qgrid: &QGrid) -> Result<Self> {
        let n = species.len();
        let bins = qgrid.bins();

        let mut rows: HashMap<i32, Array1<f64>> = HashMap::new();
        for &z in species {
            if !rows.contains_key(&z) {
                let cm = cromer_mann::for_species(z)?;
                let row = Array1::from_shape_fn(bins, |k| cm.amplitude(qgrid.q(k)));
                rows.insert(z, row);
            }
        }

        let mut values = Array2::zeros((n, bins));
        for (i, &z) in species.iter().enumerate() {
            values.row_mut(i).assign(&rows[&z]);
        }

        // Mean of the full NxN normalization field per Q bin, diagonal
        // included: (sum_i f_i)^2 / N^2.
        let mean_square_norm = if n == 0 {
            Array1::zeros(bins)
        } else {
            let total = values.sum_axis(ndarray::Axis(0));
            total.mapv(|t| (t / n as f64).powi(2))
        };

        Ok(Self {
            values,
            mean_square_norm,
        })
    }

    /// Amplitude matrix, one row per atom, one column per Q bin
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Mean-square scatter normalization per Q bin
    ///
    /// Divides both F(Q) and its gradient; zero entries are clamped to a
    /// zero result at the division site.
    pub fn mean_square_norm(&self) -> &Array1<f64> {
        &self.mean_square_norm
    }

    /// Number of atoms (rows)
    pub fn atoms(&self) -> usize {
        self.values.nrows()
    }

    /// Number of Q bins (columns)
    pub fn bins(&self) -> usize {
        self.values.ncols()
    }
}

/// Key identifying one cached table
#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheKey {
    species: Vec<i32>,
    bins: usize,
    qbin_bits: u64,
}

impl CacheKey {
    fn new(species: &[i32], qgrid: &QGrid) -> Self {
        Self {
            species: species.to_vec(),
            bins: qgrid.bins(),
            qbin_bits: qgrid.qbin.to_bits(),
        }
    }
}

/// Single-slot cache for the scatter table
///
/// The table is the only object worth keeping across evaluations: in a
/// refinement loop positions change every step while species and Q
/// sampling almost never do. A key mismatch always rebuilds; a stale
/// table is never reused silently.
#[derive(Debug, Default)]
pub struct ScatterTableCache {
    slot: Option<(CacheKey, ScatterTable)>,
    builds: u64,
}

impl ScatterTableCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the table for this species sequence and Q sampling,
    /// rebuilding on any mismatch
    pub fn get_or_build(&mut self, species: &[i32], qgrid: &QGrid) -> Result<&ScatterTable> {
        let key = CacheKey::new(species, qgrid);
        let hit = matches!(&self.slot, Some((cached, _)) if *cached == key);
        if !hit {
            debug!(
                "rebuilding scatter table: {} atoms, {} q bins",
                species.len(),
                qgrid.bins()
            );
            let table = ScatterTable::build(species, qgrid)?;
            self.builds += 1;
            self.slot = Some((key, table));
        }
        Ok(&self.slot.as_ref().unwrap().1)
    }

    /// Number of table builds performed so far
    ///
    /// Lets tests assert reuse-on-match and rebuild-on-change.
    pub fn builds(&self) -> u64 {
        self.builds
    }
}
