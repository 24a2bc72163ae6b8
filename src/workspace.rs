//! # Workspace
//!
//! Ordered set of open runs, deduplicated by container identity hash, with
//! sequential batch operations.
//!
//! Batch operations process runs one after another in insertion order and
//! call `progress(done, total)` after each run. There is no cancellation:
//! a caller that wants to stop simply stops issuing calls.

use std::path::Path;

use crate::codec::{self, CodecError};
use crate::dataset::RunDataset;
use crate::deisotope::{DeisotopeError, DeisotopeReport, DeisotopeTarget, EnvelopeProvider, IsotopeSubtractor};
use crate::extract::{ChromatogramExtraction, ExtractionMode, Extractor};

/// Result of adding a run to the workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// Newly added at `index`
    Opened {
        /// Position in the workspace
        index: usize,
        /// Non-fatal notice from loading (legacy container)
        advisory: Option<String>,
    },
    /// A run with the same identity hash was already open at `index`
    AlreadyOpen {
        /// Position of the existing run
        index: usize,
    },
}

impl OpenOutcome {
    /// Position of the run in the workspace
    pub fn index(&self) -> usize {
        match self {
            OpenOutcome::Opened { index, .. } | OpenOutcome::AlreadyOpen { index } => *index,
        }
    }
}

/// Open runs in insertion order
#[derive(Debug, Default)]
pub struct Workspace {
    runs: Vec<RunDataset>,
}

impl Workspace {
    /// Empty workspace
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open runs
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Whether no run is open
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Run at `index`
    pub fn get(&self, index: usize) -> Option<&RunDataset> {
        self.runs.get(index)
    }

    /// Mutable run at `index`
    pub fn get_mut(&mut self, index: usize) -> Option<&mut RunDataset> {
        self.runs.get_mut(index)
    }

    /// Open runs in order
    pub fn runs(&self) -> &[RunDataset] {
        &self.runs
    }

    /// Position of the run with `identity_hash`
    pub fn position(&self, identity_hash: &str) -> Option<usize> {
        self.runs
            .iter()
            .position(|run| run.identity_hash() == Some(identity_hash))
    }

    /// Close the run at `index`
    pub fn remove(&mut self, index: usize) -> Option<RunDataset> {
        (index < self.runs.len()).then(|| self.runs.remove(index))
    }

    /// Open a container unless a run with its identity hash is already open.
    ///
    /// Only the preamble is read for the duplicate check; a new file is then
    /// fully loaded and verified.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<OpenOutcome, CodecError> {
        let path = path.as_ref();
        let info = codec::peek_container(path)?;
        if let Some(index) = self.position(&info.identity_hash) {
            log::info!("{} is already open at position {}", path.display(), index);
            return Ok(OpenOutcome::AlreadyOpen { index });
        }
        let loaded = codec::read_run(path)?;
        let advisory = loaded.advisory;
        match self.insert(loaded.dataset) {
            OpenOutcome::Opened { index, .. } => Ok(OpenOutcome::Opened { index, advisory }),
            existing => Ok(existing),
        }
    }

    /// Add an in-memory run. Runs without an identity hash are always
    /// added; others are skipped when their hash is already present.
    pub fn insert(&mut self, dataset: RunDataset) -> OpenOutcome {
        if let Some(index) = dataset.identity_hash().and_then(|hash| self.position(hash)) {
            return OpenOutcome::AlreadyOpen { index };
        }
        self.runs.push(dataset);
        OpenOutcome::Opened {
            index: self.runs.len() - 1,
            advisory: None,
        }
    }

    /// Open several containers in order. A failing file does not stop the
    /// batch; its error is returned in its slot.
    pub fn open_many<P, F>(&mut self, paths: &[P], mut progress: F) -> Vec<Result<OpenOutcome, CodecError>>
    where
        P: AsRef<Path>,
        F: FnMut(usize, usize),
    {
        let total = paths.len();
        let mut outcomes = Vec::with_capacity(total);
        for (done, path) in paths.iter().enumerate() {
            let outcome = self.open(path);
            if let Err(e) = &outcome {
                log::warn!("Failed to open {}: {}", path.as_ref().display(), e);
            }
            outcomes.push(outcome);
            progress(done + 1, total);
        }
        outcomes
    }

    /// Chromatogram over `[mz_lo, mz_hi]` for every open run, in order
    pub fn extract_chromatograms<F>(
        &self,
        mz_lo: f64,
        mz_hi: f64,
        mode: ExtractionMode,
        mut progress: F,
    ) -> Vec<ChromatogramExtraction>
    where
        F: FnMut(usize, usize),
    {
        let total = self.runs.len();
        self.runs
            .iter()
            .enumerate()
            .map(|(done, run)| {
                let extraction = Extractor::new(run).chromatogram(mz_lo, mz_hi, mode);
                progress(done + 1, total);
                extraction
            })
            .collect()
    }

    /// Apply isotope subtraction to every open run, in order.
    ///
    /// Targets are resolved once up front, so a bad target fails before
    /// any run is modified.
    pub fn apply_deisotoping<P, F>(
        &mut self,
        subtractor: &IsotopeSubtractor<P>,
        targets: &[DeisotopeTarget],
        mut progress: F,
    ) -> Result<Vec<DeisotopeReport>, DeisotopeError>
    where
        P: EnvelopeProvider,
        F: FnMut(usize, usize),
    {
        let resolved = subtractor.resolve(targets)?;
        let total = self.runs.len();
        let mut reports = Vec::with_capacity(total);
        for (done, run) in self.runs.iter_mut().enumerate() {
            reports.push(subtractor.apply_resolved(run, &resolved));
            progress(done + 1, total);
        }
        Ok(reports)
    }
}
