use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rpd::codec::{read_run, LoadedRun};
use rpd::deisotope::DeisotopeTarget;
use rpd::extract::ExtractionMode;

mod config;
mod deisotope;
mod demo;
mod extract;
mod info;
mod validate;

pub use config::Config;

/// rpd - LC-MS run container inspection and extraction
#[derive(Parser)]
#[command(name = "rpd")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Load settings from a TOML config file (default: ./rpd.toml if present)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize an .rpd container
    Info {
        /// Container path
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Check container integrity
    Validate {
        /// Container path
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Write a synthetic LC-MS run
    Demo {
        /// Output container path
        #[arg(value_name = "OUTPUT", default_value = "demo_run.rpd")]
        output: PathBuf,

        /// Number of scans
        #[arg(short = 'n', long, default_value_t = 120)]
        scans: usize,

        /// zlib level (0-9; default from config or 6)
        #[arg(short = 'c', long)]
        compression_level: Option<u32>,

        /// Container version to write, e.g. 2.2 (default from config or 2.3)
        #[arg(long)]
        format_version: Option<String>,
    },

    /// Extract a chromatogram over an m/z window as TSV
    Chromatogram {
        /// Container path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Lower m/z bound (inclusive)
        #[arg(long)]
        mz_lo: f64,

        /// Upper m/z bound (inclusive)
        #[arg(long)]
        mz_hi: f64,

        /// Sum whole index bands instead of filtering each value
        #[arg(long)]
        fast: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract an averaged spectrum over an RT window as TSV
    Spectrum {
        /// Container path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Lower retention time (exclusive)
        #[arg(long)]
        rt_lo: f64,

        /// Upper retention time (inclusive)
        #[arg(long)]
        rt_hi: f64,

        /// Average raw columns instead of ranked values
        #[arg(long)]
        fast: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Peak area, height and baseline over an m/z x RT box
    Auc {
        /// Container path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Lower m/z bound
        #[arg(long)]
        mz_lo: f64,

        /// Upper m/z bound
        #[arg(long)]
        mz_hi: f64,

        /// Lower retention time
        #[arg(long)]
        rt_lo: f64,

        /// Upper retention time
        #[arg(long)]
        rt_hi: f64,
    },

    /// Subtract isotope envelopes and report the result
    Deisotope {
        /// Container path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Target as FORMULA:RT:RT_TOL:MZ_TOL; FORMULA is a charged ion
        /// (C6H12O6Na+) or a neutral formula with an adduct (C6H12O6[M+Na]+)
        #[arg(short, long = "target", value_parser = deisotope::parse_target)]
        targets: Vec<DeisotopeTarget>,

        /// Write the before/after chromatogram of each target as TSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Info { file } => info::run(file),
        Commands::Validate { file } => validate::run(file),
        Commands::Demo {
            output,
            scans,
            compression_level,
            format_version,
        } => demo::run(output, scans, compression_level, format_version, &config),
        Commands::Chromatogram {
            file,
            mz_lo,
            mz_hi,
            fast,
            output,
        } => extract::chromatogram(file, mz_lo, mz_hi, config.mode(fast), output),
        Commands::Spectrum {
            file,
            rt_lo,
            rt_hi,
            fast,
            output,
        } => extract::spectrum(file, rt_lo, rt_hi, config.mode(fast), output),
        Commands::Auc {
            file,
            mz_lo,
            mz_hi,
            rt_lo,
            rt_hi,
        } => extract::auc(file, mz_lo, mz_hi, rt_lo, rt_hi),
        Commands::Deisotope {
            file,
            targets,
            output,
        } => deisotope::run(file, targets, output, &config),
    }
}

/// Load a container, surfacing any advisory on stderr
fn load(file: &Path) -> Result<LoadedRun> {
    let loaded = read_run(file).with_context(|| format!("Failed to load {}", file.display()))?;
    if let Some(advisory) = &loaded.advisory {
        eprintln!("note: {advisory}");
    }
    Ok(loaded)
}

/// Tab-separated writer over a file or stdout
fn tsv_writer(output: Option<&Path>) -> Result<csv::Writer<Box<dyn Write>>> {
    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    Ok(csv::WriterBuilder::new().delimiter(b'\t').from_writer(sink))
}

fn mode_label(mode: ExtractionMode) -> &'static str {
    match mode {
        ExtractionMode::Exact => "exact",
        ExtractionMode::Fast => "fast",
    }
}
