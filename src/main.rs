/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! Main executable for debye-rs

use clap::Parser;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    let cli = debye_rs::cli::Cli::parse();
    debye_rs::cli::run(cli)
}
