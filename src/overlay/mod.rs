//! # Subtraction Overlay
//!
//! Sparse per-scan record of the signal removed by isotope subtraction.
//!
//! The dataset's intensity grid is the single source of truth for corrected
//! values; the overlay only keeps, for each touched column, the intensity
//! seen before the first subtraction and the total amount removed since.
//! For every recorded entry `current + removed == original`.


/// One touched column of one scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayEntry {
    /// Column in the padded grid
    pub column: usize,
    /// m/z at that column
    pub mz: f64,
    /// Intensity before any subtraction
    pub original: f64,
    /// Intensity removed so far, summed over passes
    pub removed: f64,
}

/// Subtraction record of one scan, entries sorted by column
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRecord {
    rt: f64,
    entries: Vec<OverlayEntry>,
}

impl ScanRecord {
    fn new(rt: f64) -> Self {
        Self {
            rt,
            entries: Vec::new(),
        }
    }

    /// Retention time of the scan
    pub fn rt(&self) -> f64 {
        self.rt
    }

    /// Touched columns in ascending order
    pub fn entries(&self) -> &[OverlayEntry] {
        &self.entries
    }

    /// Runs of adjacent columns; a gap in column indices starts a new block
    pub fn blocks(&self) -> Vec<&[OverlayEntry]> {
        let mut blocks = Vec::new();
        let mut start = 0;
        for i in 1..=self.entries.len() {
            let split = i == self.entries.len()
                || self.entries[i].column != self.entries[i - 1].column + 1;
            if split {
                blocks.push(&self.entries[start..i]);
                start = i;
            }
        }
        blocks
    }

    /// Lowest and highest recorded m/z
    pub fn mz_span(&self) -> Option<(f64, f64)> {
        match (self.entries.first(), self.entries.last()) {
            (Some(first), Some(last)) => Some((first.mz, last.mz)),
            _ => None,
        }
    }

    /// Total removed intensity at m/z inside `[mz_lo, mz_hi]`, or `None`
    /// when no recorded entry lies in the range.
    pub fn removed_in_range(&self, mz_lo: f64, mz_hi: f64) -> Option<f64> {
        let mut hit = false;
        let mut total = 0.0;
        for entry in &self.entries {
            if entry.mz >= mz_lo && entry.mz <= mz_hi {
                hit = true;
                total += entry.removed;
            }
        }
        hit.then_some(total)
    }

    /// Total removed intensity of the scan
    pub fn total_removed(&self) -> f64 {
        self.entries.iter().map(|e| e.removed).sum()
    }

    fn merge(&mut self, first_col: usize, mz: &[f64], original: &[f64], removed: &[f64]) {
        for (k, ((&m, &o), &r)) in mz.iter().zip(original).zip(removed).enumerate() {
            let column = first_col + k;
            match self.entries.binary_search_by_key(&column, |e| e.column) {
                Ok(pos) => self.entries[pos].removed += r,
                Err(pos) => self.entries.insert(
                    pos,
                    OverlayEntry {
                        column,
                        mz: m,
                        original: o,
                        removed: r,
                    },
                ),
            }
        }
    }
}

/// Per-scan subtraction records of one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    records: Vec<Option<ScanRecord>>,
}

impl Overlay {
    /// Empty overlay for a run with `scans` scans
    pub fn new(scans: usize) -> Self {
        Self {
            records: vec![None; scans],
        }
    }

    /// Whether no scan has been touched
    pub fn is_empty(&self) -> bool {
        self.records.iter().all(Option::is_none)
    }

    /// Record of one scan, if touched
    pub fn record(&self, row: usize) -> Option<&ScanRecord> {
        self.records.get(row).and_then(Option::as_ref)
    }

    /// All touched scans in row order
    pub fn records(&self) -> impl Iterator<Item = (usize, &ScanRecord)> {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(row, record)| record.as_ref().map(|r| (row, r)))
    }

    /// Number of touched scans
    pub fn touched_scans(&self) -> usize {
        self.records.iter().filter(|r| r.is_some()).count()
    }

    /// Number of recorded entries over all scans
    pub fn entry_count(&self) -> usize {
        self.records().map(|(_, r)| r.entries.len()).sum()
    }

    /// Total intensity removed over all scans
    pub fn total_removed(&self) -> f64 {
        self.records().map(|(_, r)| r.total_removed()).sum()
    }

    /// Merge one subtraction pass over columns `first_col..` of `row`.
    ///
    /// Existing columns accumulate `removed` and keep their first-seen
    /// original; new columns are inserted in column order.
    pub(crate) fn merge(
        &mut self,
        row: usize,
        rt: f64,
        first_col: usize,
        mz: &[f64],
        original: &[f64],
        removed: &[f64],
    ) {
        if row >= self.records.len() {
            self.records.resize(row + 1, None);
        }
        self.records[row]
            .get_or_insert_with(|| ScanRecord::new(rt))
            .merge(first_col, mz, original, removed);
    }

    /// Write every original intensity back into a row-major grid and drop
    /// all records. Returns the number of restored entries.
    pub(crate) fn restore_into(&mut self, intensity: &mut [f64], width: usize) -> usize {
        let mut restored = 0;
        for (row, record) in self.records.iter_mut().enumerate() {
            if let Some(record) = record.take() {
                for entry in &record.entries {
                    if let Some(slot) = intensity.get_mut(row * width + entry.column) {
                        *slot = entry.original;
                        restored += 1;
                    }
                }
            }
        }
        restored
    }

    /// Drop all records without touching intensities
    pub fn clear(&mut self) {
        for record in &mut self.records {
            *record = None;
        }
    }
}
