//! TOML configuration file.
//!
//! ```toml
//! # rpd.toml
//! [display]
//! fast = true
//!
//! [codec]
//! compression_level = 9
//! version = "2.3"
//!
//! [[deisotope.targets]]
//! formula = "C6H12O6Na+"
//! rt = 2.0
//! rt_tolerance = 0.15
//! mz_tolerance = 0.05
//! ```
//!
//! Command-line flags take precedence over config values.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use rpd::codec::{ContainerVersion, EncodeOptions};
use rpd::deisotope::DeisotopeTarget;
use rpd::extract::ExtractionMode;

/// Looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG: &str = "rpd.toml";

/// Root of `rpd.toml`
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Extraction display settings
    #[serde(default)]
    pub display: DisplayConfig,

    /// Container writing settings
    #[serde(default)]
    pub codec: CodecConfig,

    /// Default isotope subtraction targets
    #[serde(default)]
    pub deisotope: DeisotopeConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplayConfig {
    /// Use the fast extraction path
    pub fast: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodecConfig {
    /// zlib level (0-9)
    pub compression_level: Option<u32>,

    /// Container version to write
    pub version: Option<ContainerVersion>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeisotopeConfig {
    #[serde(default)]
    pub targets: Vec<DeisotopeTarget>,
}

impl Config {
    /// Load `path`, or `rpd.toml` from the working directory if it exists,
    /// or defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG).is_file() => {
                log::info!("Using {}", DEFAULT_CONFIG);
                Self::from_file(Path::new(DEFAULT_CONFIG))
            }
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Extraction mode: the `--fast` flag, else `[display] fast`
    pub fn mode(&self, fast_flag: bool) -> ExtractionMode {
        if fast_flag || self.display.fast.unwrap_or(false) {
            ExtractionMode::Fast
        } else {
            ExtractionMode::Exact
        }
    }

    /// Encoding options with flag overrides applied
    pub fn encode_options(&self, level: Option<u32>, version: Option<ContainerVersion>) -> EncodeOptions {
        let mut options = EncodeOptions::default();
        if let Some(version) = version.or(self.codec.version) {
            options = options.with_version(version);
        }
        if let Some(level) = level.or(self.codec.compression_level) {
            options = options.with_compression_level(level);
        }
        options
    }
}
