//! # rpd - Rapid LC-MS Run Containers
//!
//! `rpd` stores one LC-MS run as padded m/z and intensity grids and answers
//! the questions an analyst asks of it interactively: the chromatogram of an
//! m/z window, the averaged spectrum of an RT window, and the area of a peak.
//!
//! ## Key Features
//!
//! - **Band index**: per-column search brackets anchored on a fully populated
//!   reference scan, so window queries binary-search a few columns instead
//!   of every value.
//!
//! - **Exact and fast extraction**: every query filters values exactly, or
//!   trusts the index band when the scans share an m/z grid.
//!
//! - **Isotope subtraction**: removes the heavier isotopes of known compounds
//!   and keeps what it removed, so extraction can show before and after.
//!
//! - **Compact containers**: delta-coded, zlib-compressed `.rpd` files with a
//!   SHA-256 identity hash over the body.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rpd::codec::{read_run, write_run, EncodeOptions};
//! use rpd::dataset::{RunDatasetBuilder, SpectrumKind};
//! use rpd::extract::{ExtractionMode, Extractor};
//!
//! let mut dataset = RunDatasetBuilder::new(SpectrumKind::Continuous)
//!     .add_scan(0.0, vec![100.0, 150.0, 200.0], vec![10.0, 20.0, 30.0])
//!     .add_scan(0.5, vec![100.0, 150.0, 200.0], vec![15.0, 25.0, 35.0])
//!     .build()?;
//!
//! let hash = write_run(&mut dataset, "run.rpd", &EncodeOptions::default())?;
//! let loaded = read_run("run.rpd")?;
//! assert_eq!(loaded.dataset.identity_hash(), Some(hash.as_str()));
//!
//! let xic = Extractor::new(&loaded.dataset).chromatogram(149.5, 150.5, ExtractionMode::Exact);
//! println!("{:?}", xic.current.intensity);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`dataset`]: padded run grids, construction and validation
//! - [`index`]: the band index over m/z columns
//! - [`extract`]: chromatogram, spectrum, AUC and intensity-window queries
//! - [`deisotope`]: isotope subtraction over an injected envelope provider
//! - [`overlay`]: the record of subtracted signal
//! - [`chemistry`]: formula parsing and natural-abundance isotope envelopes
//! - [`codec`]: the `.rpd` container format
//! - [`validator`]: integrity reports over `.rpd` files
//! - [`workspace`]: a set of open runs deduplicated by identity hash

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![allow(clippy::too_many_arguments)]

pub mod chemistry;
pub mod codec;
pub mod dataset;
pub mod deisotope;
pub mod extract;
pub mod index;
pub mod numeric;
pub mod overlay;
pub mod validator;
pub mod workspace;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::chemistry::{Adduct, Formula, NaturalAbundanceProvider};
    pub use crate::codec::{
        decode, encode, peek_container, read_run, write_run, CodecError, ContainerVersion,
        EncodeOptions, LoadedRun,
    };
    pub use crate::dataset::{
        DatasetError, InstrumentInfo, RtUnit, RunDataset, RunDatasetBuilder, Scan, ScanSettings,
        SpectrumKind,
    };
    pub use crate::deisotope::{
        DeisotopeError, DeisotopeReport, DeisotopeTarget, EnvelopeProvider, IsotopeEnvelope,
        IsotopeSubtractor,
    };
    pub use crate::extract::{
        AucOptions, Chromatogram, ExtractionMode, Extractor, PeakMetrics, Spectrum,
    };
    pub use crate::index::ExtractionIndex;
    pub use crate::overlay::Overlay;
    pub use crate::validator::{validate_rpd_file, ValidationReport};
    pub use crate::workspace::{OpenOutcome, Workspace};
}
