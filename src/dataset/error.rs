/// Shape and ordering invariants violated while assembling a run dataset.
///
/// Every variant is fatal: construction aborts and no dataset is produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DatasetError {
    /// A padded buffer does not hold `scan_count * width` values
    #[error("{array} array holds {actual} values, expected {scans} scans x {width} columns")]
    ShapeMismatch {
        /// Which array is malformed (`mz` or `intensity`)
        array: &'static str,
        /// Number of scans declared
        scans: usize,
        /// Number of columns declared
        width: usize,
        /// Number of values found
        actual: usize,
    },

    /// A scan's m/z and intensity lists have different lengths
    #[error("scan {scan}: {mz_len} m/z values but {intensity_len} intensities")]
    PeakArrayMismatch {
        /// Scan index
        scan: usize,
        /// m/z list length
        mz_len: usize,
        /// Intensity list length
        intensity_len: usize,
    },

    /// Retention-time axis length differs from the scan count
    #[error("retention time axis has {actual} entries for {expected} scans")]
    RetentionTimeLength {
        /// Scan count
        expected: usize,
        /// Axis length
        actual: usize,
    },

    /// Retention-time value is NaN or infinite
    #[error("retention time at scan {index} is not finite")]
    NonFiniteRetentionTime {
        /// Scan index
        index: usize,
    },

    /// Retention time decreases between consecutive scans
    #[error("retention time decreases at scan {index}: {previous} -> {current}")]
    RetentionTimeNotMonotonic {
        /// Scan index of the offending value
        index: usize,
        /// Preceding value
        previous: f64,
        /// Offending value
        current: f64,
    },

    /// A populated m/z value follows a sentinel in the same row
    #[error("scan {row}: m/z value at column {col} follows padding")]
    PaddingNotTrailing {
        /// Scan index
        row: usize,
        /// Column of the stray value
        col: usize,
    },

    /// Populated m/z values are not strictly ascending (or not finite)
    #[error("scan {row}: m/z values not strictly ascending at column {col}")]
    UnsortedRow {
        /// Scan index
        row: usize,
        /// Column where ordering breaks
        col: usize,
    },

    /// A padded intensity slot holds a non-zero value
    #[error("scan {row}: padded intensity at column {col} is non-zero")]
    NonZeroPaddingIntensity {
        /// Scan index
        row: usize,
        /// Column of the padded slot
        col: usize,
    },

    /// No fully populated scan exists to anchor the extraction index
    #[error("no fully populated scan among {scans} scans; cannot choose a reference row")]
    NoReferenceRow {
        /// Number of scans inspected
        scans: usize,
    },

    /// A supplied band index does not fit this dataset
    #[error("band index does not match dataset: {0}")]
    BandIndexMismatch(String),
}
