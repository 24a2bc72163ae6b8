//! # rpd
//!
//! Command-line front end for `.rpd` LC-MS run containers.
//!
//! ## Usage
//!
//! ```bash
//! # Write a synthetic run
//! rpd demo demo_run.rpd
//!
//! # Inspect and check a container
//! rpd info demo_run.rpd
//! rpd validate demo_run.rpd
//!
//! # Chromatogram of the glucose sodium adduct
//! rpd chromatogram demo_run.rpd --mz-lo 203.0 --mz-hi 203.1
//!
//! # Subtract its isotope envelope
//! rpd deisotope demo_run.rpd --target 'C6H12O6[M+Na]+:2.0:0.3:0.05'
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
