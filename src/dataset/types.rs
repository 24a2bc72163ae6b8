use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the instrument reported each scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpectrumKind {
    /// Centroided peaks, drawn as sticks
    Discrete,
    /// Sampled profile, drawn as a connected trace
    Continuous,
}

impl SpectrumKind {
    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            SpectrumKind::Discrete => "discrete",
            SpectrumKind::Continuous => "continuous",
        }
    }
}

impl fmt::Display for SpectrumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpectrumKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "discrete" => Ok(SpectrumKind::Discrete),
            "continuous" => Ok(SpectrumKind::Continuous),
            other => Err(format!("unknown spectrum kind: {other}")),
        }
    }
}

/// Unit of the retention-time axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RtUnit {
    /// Minutes (`TimeInMinutes`)
    #[default]
    #[serde(rename = "TimeInMinutes")]
    Minutes,
    /// Seconds (`TimeInSeconds`)
    #[serde(rename = "TimeInSeconds")]
    Seconds,
}

impl RtUnit {
    /// Short unit symbol for axis labels
    pub fn symbol(&self) -> &'static str {
        match self {
            RtUnit::Minutes => "min",
            RtUnit::Seconds => "s",
        }
    }
}

impl fmt::Display for RtUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Ion source and mass analyzer descriptors of the acquiring instrument
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentInfo {
    /// Ionization type, e.g. `Esi`
    pub ionization: String,
    /// Analyzer type, e.g. `TimeOfFlight`
    pub analyzer: String,
}

impl InstrumentInfo {
    /// Create instrument descriptors
    pub fn new(ionization: impl Into<String>, analyzer: impl Into<String>) -> Self {
        Self {
            ionization: ionization.into(),
            analyzer: analyzer.into(),
        }
    }
}

/// Well-known scan setting keys
pub mod setting_keys {
    /// Ion polarity (`Positive` / `Negative`)
    pub const POLARITY: &str = "Polarity";
    /// Scan mode, e.g. `Scan` or `SIM`
    pub const SCAN_MODE: &str = "ScanMode";
}

/// Run-level acquisition settings.
///
/// Key/value pairs are kept in a sorted map so that serialized metadata is
/// byte-stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSettings {
    entries: BTreeMap<String, String>,
    instrument: InstrumentInfo,
}

impl ScanSettings {
    /// Empty settings for the given instrument
    pub fn new(instrument: InstrumentInfo) -> Self {
        Self {
            entries: BTreeMap::new(),
            instrument,
        }
    }

    /// Settings from an existing key/value map
    pub fn from_entries(entries: BTreeMap<String, String>, instrument: InstrumentInfo) -> Self {
        Self {
            entries,
            instrument,
        }
    }

    /// Add a key/value pair (builder style)
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Look up a setting
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// All settings in key order
    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    /// Instrument descriptors
    pub fn instrument(&self) -> &InstrumentInfo {
        &self.instrument
    }

    /// Ion polarity, if recorded
    pub fn polarity(&self) -> Option<&str> {
        self.get(setting_keys::POLARITY)
    }

    /// Scan mode, if recorded
    pub fn scan_mode(&self) -> Option<&str> {
        self.get(setting_keys::SCAN_MODE)
    }

    /// Compact label such as `ESI+ TOF SCAN`
    pub fn short_label(&self) -> String {
        let ionization = self.instrument.ionization.to_uppercase();
        let polarity = match self.polarity() {
            Some("Positive") => "+",
            Some("Negative") => "-",
            Some(other) => other,
            None => "",
        };
        let analyzer = match self.instrument.analyzer.as_str() {
            "TimeOfFlight" => "TOF",
            other => other,
        };
        let scan_mode = self.scan_mode().unwrap_or("").to_uppercase();
        format!("{ionization}{polarity} {analyzer} {scan_mode}")
            .trim()
            .to_string()
    }

    /// Label with the raw, unabbreviated descriptors
    pub fn full_label(&self) -> String {
        format!(
            "{}{} {} {}",
            self.instrument.ionization,
            self.polarity().unwrap_or(""),
            self.instrument.analyzer,
            self.scan_mode().unwrap_or("")
        )
        .trim()
        .to_string()
    }
}
