/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! Command-line driver
//!
//! Builds a demo FCC gold cluster, evaluates F(Q), the PDF, and the Rw
//! residual of a rattled copy against the pristine curve, and reports
//! timings. `--compare-backends` runs the same job on every available
//! backend and checks cross-backend agreement; `--json` exports the
//! results for plotting.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use log::info;
use ndarray::{s, Array1};
use serde::Serialize;

use crate::atoms::{AtomicConfig, Vector3D};
use crate::backend::Backend;
use crate::config::{DebyeConfig, QGrid, RGrid};
use crate::engine::{DebyeEngine, EngineError};

/// Conventional FCC lattice constant of gold in angstroms
const GOLD_LATTICE: f64 = 4.08;

#[derive(Debug, Parser)]
#[command(name = "debye-rs", version, about = "Pairwise Debye-sum elastic scattering")]
pub struct Cli {
    /// Demo cluster size in FCC unit cells per edge (4 atoms per cell)
    #[arg(long, default_value_t = 2)]
    pub cells: usize,

    /// Compute backend
    #[arg(long, value_enum, default_value_t = Backend::Serial)]
    pub backend: Backend,

    /// Lowest Q carried into PDF space
    #[arg(long, default_value_t = 0.0)]
    pub qmin: f64,

    /// Upper bound of the Q range
    #[arg(long, default_value_t = 25.0)]
    pub qmax: f64,

    /// Q bin width
    #[arg(long, default_value_t = 0.1)]
    pub qbin: f64,

    /// Lowest r of the residual comparison window
    #[arg(long, default_value_t = 0.0)]
    pub rmin: f64,

    /// Upper bound of the r range
    #[arg(long, default_value_t = 40.0)]
    pub rmax: f64,

    /// r step
    #[arg(long, default_value_t = 0.01)]
    pub rstep: f64,

    /// Uniform per-axis displacement parameter applied to every atom
    #[arg(long)]
    pub adp: Option<f64>,

    /// Time every backend on the same job and report agreement
    #[arg(long)]
    pub compare_backends: bool,

    /// Write results as JSON
    #[arg(long, value_name = "path")]
    pub json: Option<PathBuf>,
}

impl Cli {
    fn sampling(&self) -> Result<DebyeConfig, crate::config::ConfigError> {
        DebyeConfig::new(
            QGrid::new(self.qmin, self.qmax, self.qbin)?,
            RGrid::new(self.rmin, self.rmax, self.rstep)?,
        )
    }
}

/// FCC gold block of `cells`³ conventional cells
pub fn gold_cluster(cells: usize, adp: Option<f64>) -> anyhow::Result<AtomicConfig> {
    let basis = [
        Vector3D::new(0.0, 0.0, 0.0),
        Vector3D::new(0.5, 0.5, 0.0),
        Vector3D::new(0.5, 0.0, 0.5),
        Vector3D::new(0.0, 0.5, 0.5),
    ];
    let mut positions = Vec::with_capacity(cells * cells * cells * 4);
    for cx in 0..cells {
        for cy in 0..cells {
            for cz in 0..cells {
                for b in &basis {
                    positions.push(Vector3D::new(
                        (cx as f64 + b.x) * GOLD_LATTICE,
                        (cy as f64 + b.y) * GOLD_LATTICE,
                        (cz as f64 + b.z) * GOLD_LATTICE,
                    ));
                }
            }
        }
    }
    let species = vec![79; positions.len()];
    let config = match adp {
        Some(u) => {
            let adps = vec![Vector3D::new(u, u, u); positions.len()];
            AtomicConfig::with_adps(positions, species, adps)?
        }
        None => AtomicConfig::new(positions, species)?,
    };
    Ok(config)
}

/// Deterministic per-atom nudge, so the residual demo has structure
/// to refine against
fn rattled(atoms: &AtomicConfig, amplitude: f64) -> anyhow::Result<AtomicConfig> {
    let positions: Vec<Vector3D> = atoms
        .positions()
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let t = i as f64;
            Vector3D::new(
                p.x + amplitude * (1.3 * t).sin(),
                p.y + amplitude * (2.1 * t + 0.7).sin(),
                p.z + amplitude * (3.7 * t + 1.9).sin(),
            )
        })
        .collect();
    let species = atoms.species().to_vec();
    let config = match atoms.adps() {
        Some(adps) => AtomicConfig::with_adps(positions, species, adps.to_vec())?,
        None => AtomicConfig::new(positions, species)?,
    };
    Ok(config)
}

fn ms(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1e3
}

#[derive(Debug, Serialize)]
struct RunReport {
    backend: Backend,
    atoms: usize,
    q_bins: usize,
    r_points: usize,
    fq_ms: f64,
    pdf_ms: f64,
    rw_ms: f64,
    rw_gradient_ms: f64,
    rw: f64,
    scale: f64,
    max_gradient: f64,
    fq: Vec<f64>,
    pdf: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct BackendTiming {
    backend: Backend,
    fq_ms: f64,
    gradient_ms: f64,
    max_fq_diff: f64,
}

/// Entry point behind `main`
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let sampling = cli.sampling()?;
    let atoms = gold_cluster(cli.cells, cli.adp)?;
    info!(
        "demo cluster: {} atoms, {} q bins, {} r points",
        atoms.len(),
        sampling.qgrid.bins(),
        sampling.rgrid.points()
    );

    if cli.compare_backends {
        return compare_backends(&cli, sampling, &atoms);
    }

    let mut engine = DebyeEngine::new(sampling, cli.backend)?;

    let start = Instant::now();
    let fq = engine.fq(&atoms)?;
    let fq_ms = ms(start.elapsed());

    let start = Instant::now();
    let (pdf, _) = engine.pdf(&atoms)?;
    let pdf_ms = ms(start.elapsed());

    // Residual demo: the pristine curve plays the observed data and a
    // rattled copy is scored against it.
    let gobs = pdf.slice(s![sampling.rgrid.rmin_bin()..]).to_owned();
    let moved = rattled(&atoms, 0.05)?;

    let start = Instant::now();
    let report = engine.rw(&moved, &gobs)?;
    let rw_ms = ms(start.elapsed());

    let start = Instant::now();
    let grad = engine.rw_gradient(&moved, &gobs, Some(&report))?;
    let rw_gradient_ms = ms(start.elapsed());
    let max_gradient = grad.iter().fold(0.0f64, |m, v| m.max(v.abs()));

    println!("backend:      {}", cli.backend);
    println!("atoms:        {}", atoms.len());
    println!("F(Q):         {} bins in {fq_ms:.2} ms", fq.len());
    println!("PDF:          {} points in {pdf_ms:.2} ms", pdf.len());
    println!(
        "Rw (rattled): {:.4} at scale {:.4} in {rw_ms:.2} ms",
        report.rw, report.scale
    );
    println!("dRw/dx:       max |g| = {max_gradient:.3e} in {rw_gradient_ms:.2} ms");

    if let Some(path) = &cli.json {
        let out = RunReport {
            backend: cli.backend,
            atoms: atoms.len(),
            q_bins: sampling.qgrid.bins(),
            r_points: sampling.rgrid.points(),
            fq_ms,
            pdf_ms,
            rw_ms,
            rw_gradient_ms,
            rw: report.rw,
            scale: report.scale,
            max_gradient,
            fq: fq.to_vec(),
            pdf: pdf.to_vec(),
        };
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &out)?;
        println!("wrote {}", path.display());
    }

    Ok(())
}

/// Run the same F(Q) + gradient job on every backend that opens,
/// timing each and checking agreement against the first.
fn compare_backends(
    cli: &Cli,
    sampling: DebyeConfig,
    atoms: &AtomicConfig,
) -> anyhow::Result<()> {
    let candidates = [
        Backend::Serial,
        Backend::MultiCore,
        Backend::GpuSingle,
        Backend::GpuMulti,
    ];
    let mut reference: Option<Array1<f64>> = None;
    let mut rows = Vec::new();

    for backend in candidates {
        let mut engine = DebyeEngine::new(sampling, backend)?;

        let start = Instant::now();
        let fq = match engine.fq(atoms) {
            Ok(fq) => fq,
            Err(EngineError::Backend(err)) => {
                info!("skipping {backend}: {err}");
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        let fq_ms = ms(start.elapsed());

        let start = Instant::now();
        engine.fq_gradient(atoms)?;
        let gradient_ms = ms(start.elapsed());

        let max_fq_diff = match &reference {
            Some(reference) => fq
                .iter()
                .zip(reference.iter())
                .fold(0.0f64, |m, (a, b)| m.max((a - b).abs())),
            None => 0.0,
        };
        if reference.is_none() {
            reference = Some(fq);
        }

        println!(
            "{backend:<12} fq {fq_ms:>9.2} ms   gradient {gradient_ms:>9.2} ms   max diff {max_fq_diff:.3e}"
        );
        rows.push(BackendTiming {
            backend,
            fq_ms,
            gradient_ms,
            max_fq_diff,
        });
    }

    if let Some(path) = &cli.json {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &rows)?;
        println!("wrote {}", path.display());
    }

    Ok(())
}
