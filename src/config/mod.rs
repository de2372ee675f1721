/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! Sampling configuration module
//!
//! This module defines the scattering-vector (Q) and real-space (r)
//! sampling grids shared by every kernel and transform. Grids are value
//! types: the Q axis is sampled at k·qbin for k in 0..bins, the r axis
//! at k·rstep for k in 0..points.

pub mod errors;

use serde::{Deserialize, Serialize};

pub use errors::{ConfigError, Result};

/// Guards bin-count arithmetic against round-off when a range divides
/// its increment evenly.
const GRID_EPS: f64 = 1e-9;

/// Scattering-vector sampling: Q = k·qbin for k in 0..bins
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QGrid {
    /// Lowest Q carried into PDF space; bins below it are zeroed at
    /// transform time
    pub qmin: f64,
    /// Upper bound of the sampled Q range (exclusive)
    pub qmax: f64,
    /// Q increment per bin
    pub qbin: f64,
}

impl QGrid {
    /// Create a validated Q sampling
    pub fn new(qmin: f64, qmax: f64, qbin: f64) -> Result<Self> {
        let grid = Self { qmin, qmax, qbin };
        grid.validate()?;
        Ok(grid)
    }

    /// Check the sampling parameters without constructing
    pub fn validate(&self) -> Result<()> {
        if !self.qbin.is_finite() || self.qbin <= 0.0 {
            return Err(ConfigError::InvalidQbin(self.qbin));
        }
        if !self.qmin.is_finite() || !self.qmax.is_finite() || self.qmin < 0.0 || self.qmax < self.qmin
        {
            return Err(ConfigError::InvalidQRange {
                qmin: self.qmin,
                qmax: self.qmax,
            });
        }
        Ok(())
    }

    /// Number of Q bins, ⌊qmax/qbin⌋
    pub fn bins(&self) -> usize {
        (self.qmax / self.qbin + GRID_EPS).floor().max(0.0) as usize
    }

    /// Q value of bin k
    pub fn q(&self, k: usize) -> f64 {
        k as f64 * self.qbin
    }

    /// First bin at or above qmin; bins below it are zeroed when F(Q)
    /// enters PDF space
    pub fn qmin_bin(&self) -> usize {
        (self.qmin / self.qbin + GRID_EPS).floor().max(0.0) as usize
    }
}

impl Default for QGrid {
    fn default() -> Self {
        Self {
            qmin: 0.0,
            qmax: 25.0,
            qbin: 0.1,
        }
    }
}

/// Real-space sampling: r = k·rstep for k in 0..points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RGrid {
    /// Lowest r retained when comparing against an observed PDF
    pub rmin: f64,
    /// Upper bound of the sampled r range (exclusive)
    pub rmax: f64,
    /// r increment per point
    pub rstep: f64,
}

impl RGrid {
    /// Create a validated r sampling
    pub fn new(rmin: f64, rmax: f64, rstep: f64) -> Result<Self> {
        let grid = Self { rmin, rmax, rstep };
        grid.validate()?;
        Ok(grid)
    }

    /// Check the sampling parameters without constructing
    pub fn validate(&self) -> Result<()> {
        if !self.rstep.is_finite() || self.rstep <= 0.0 {
            return Err(ConfigError::InvalidRstep(self.rstep));
        }
        if !self.rmin.is_finite() || !self.rmax.is_finite() || self.rmin < 0.0 || self.rmax < self.rmin
        {
            return Err(ConfigError::InvalidRRange {
                rmin: self.rmin,
                rmax: self.rmax,
            });
        }
        Ok(())
    }

    /// Number of r points over [0, rmax)
    pub fn points(&self) -> usize {
        (self.rmax / self.rstep - GRID_EPS).ceil().max(0.0) as usize
    }

    /// r value of point k
    pub fn r(&self, k: usize) -> f64 {
        k as f64 * self.rstep
    }

    /// First point at or above rmin; the computed PDF is offset here
    /// before residual comparison
    pub fn rmin_bin(&self) -> usize {
        (self.rmin / self.rstep + GRID_EPS).floor().max(0.0) as usize
    }
}

impl Default for RGrid {
    fn default() -> Self {
        Self {
            rmin: 0.0,
            rmax: 40.0,
            rstep: 0.01,
        }
    }
}

/// Full sampling configuration for one engine instance
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DebyeConfig {
    /// Scattering-vector sampling
    pub qgrid: QGrid,
    /// Real-space sampling
    pub rgrid: RGrid,
}

impl DebyeConfig {
    /// Create a validated configuration
    pub fn new(qgrid: QGrid, rgrid: RGrid) -> Result<Self> {
        qgrid.validate()?;
        rgrid.validate()?;
        Ok(Self { qgrid, rgrid })
    }

    /// Check both samplings
    pub fn validate(&self) -> Result<()> {
        self.qgrid.validate()?;
        self.rgrid.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_bin_counts() {
        let config = DebyeConfig::default();
        assert_eq!(config.qgrid.bins(), 250);
        assert_eq!(config.rgrid.points(), 4000);
        assert_eq!(config.qgrid.qmin_bin(), 0);
        assert_eq!(config.rgrid.rmin_bin(), 0);
    }

    #[test]
    fn test_grid_values() {
        let q = QGrid::new(0.5, 25.0, 0.1).unwrap();
        assert_relative_eq!(q.q(10), 1.0, epsilon = 1e-12);
        assert_eq!(q.qmin_bin(), 5);

        let r = RGrid::new(2.5, 40.0, 0.01).unwrap();
        assert_relative_eq!(r.r(100), 1.0, epsilon = 1e-12);
        assert_eq!(r.rmin_bin(), 250);
    }

    #[test]
    fn test_uneven_range_keeps_partial_bin_out() {
        // 25.05 / 0.1 = 250.5: the half-filled bin is dropped
        let q = QGrid::new(0.0, 25.05, 0.1).unwrap();
        assert_eq!(q.bins(), 250);
        // 1.05 / 0.1 = 10.5: the last r point 1.0 still lies below rmax
        let r = RGrid::new(0.0, 1.05, 0.1).unwrap();
        assert_eq!(r.points(), 11);
    }

    #[test]
    fn test_rejects_bad_increments() {
        assert!(matches!(
            QGrid::new(0.0, 25.0, 0.0),
            Err(ConfigError::InvalidQbin(_))
        ));
        assert!(matches!(
            QGrid::new(0.0, 25.0, -0.1),
            Err(ConfigError::InvalidQbin(_))
        ));
        assert!(matches!(
            RGrid::new(0.0, 40.0, -0.01),
            Err(ConfigError::InvalidRstep(_))
        ));
    }

    #[test]
    fn test_rejects_bad_ranges() {
        assert!(matches!(
            QGrid::new(10.0, 5.0, 0.1),
            Err(ConfigError::InvalidQRange { .. })
        ));
        assert!(matches!(
            RGrid::new(-1.0, 40.0, 0.01),
            Err(ConfigError::InvalidRRange { .. })
        ));
    }

    #[test]
    fn test_serde_round_trip() {
        let config = DebyeConfig::default();
        let text = serde_json::to_string(&config).unwrap();
        let back: DebyeConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
