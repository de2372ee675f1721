/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! Immutable atomic-configuration snapshot consumed by the scattering engine

use super::errors::{AtomError, Result};
use super::vector::Vector3D;

/// An ordered snapshot of atom positions and species, with optional
/// per-atom displacement parameters.
///
/// The engine never mutates a configuration; refinement drivers build a
/// fresh snapshot per evaluation. Species are atomic numbers and select
/// the scatter-factor row for each atom.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomicConfig {
    positions: Vec<Vector3D>,
    species: Vec<i32>,
    adps: Option<Vec<Vector3D>>,
}

impl AtomicConfig {
    /// Create a configuration from positions and species codes
    ///
    /// # Arguments
    ///
    /// * `positions` - Atom positions in angstroms
    /// * `species` - Atomic numbers, one per atom
    ///
    /// # Returns
    ///
    /// The validated configuration, or an error if the lengths disagree
    /// or any coordinate is non-finite
    pub fn new(positions: Vec<Vector3D>, species: Vec<i32>) -> Result<Self> {
        if positions.len() != species.len() {
            return Err(AtomError::SpeciesCountMismatch {
                atoms: positions.len(),
                species: species.len(),
            });
        }
        if let Some(bad) = positions.iter().position(|p| !p.is_finite()) {
            return Err(AtomError::NonFiniteCoordinate(bad));
        }
        Ok(Self {
            positions,
            species,
            adps: None,
        })
    }

    /// Create a configuration carrying atomic displacement parameters
    ///
    /// The ADP triple of an atom holds the per-axis displacement
    /// magnitudes used by the thermal-smearing kernel; the kernels take
    /// absolute values, so signs are irrelevant.
    pub fn with_adps(
        positions: Vec<Vector3D>,
        species: Vec<i32>,
        adps: Vec<Vector3D>,
    ) -> Result<Self> {
        if adps.len() != positions.len() {
            return Err(AtomError::AdpCountMismatch {
                atoms: positions.len(),
                adps: adps.len(),
            });
        }
        if let Some(bad) = adps.iter().position(|a| !a.is_finite()) {
            return Err(AtomError::NonFiniteAdp(bad));
        }
        let mut config = Self::new(positions, species)?;
        config.adps = Some(adps);
        Ok(config)
    }

    /// Number of atoms
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the configuration holds no atoms
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Atom positions
    pub fn positions(&self) -> &[Vector3D] {
        &self.positions
    }

    /// Species codes (atomic numbers)
    pub fn species(&self) -> &[i32] {
        &self.species
    }

    /// Displacement parameters, if supplied
    pub fn adps(&self) -> Option<&[Vector3D]> {
        self.adps.as_deref()
    }

    /// Copy of this configuration with one coordinate nudged by `delta`
    ///
    /// Used by finite-difference checks and line searches; axis is
    /// 0 = x, 1 = y, 2 = z.
    pub fn displaced(&self, atom: usize, axis: usize, delta: f64) -> Self {
        let mut out = self.clone();
        match axis {
            0 => out.positions[atom].x += delta,
            1 => out.positions[atom].y += delta,
            2 => out.positions[atom].z += delta,
            _ => panic!("spatial axis index out of range: {axis}"),
        }
        out
    }
}
