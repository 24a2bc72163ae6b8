use std::path::PathBuf;

use crate::dataset::DatasetError;

/// Errors raised while reading or writing `.rpd` containers
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The temporary file could not be moved over the destination
    #[error("failed to persist container: {0}")]
    Persist(#[from] tempfile::PersistError),

    /// Header or metadata record is not valid JSON for its schema
    #[error("invalid record: {0}")]
    Json(#[from] serde_json::Error),

    /// The file does not start with the container magic
    #[error("not an rpd container: bad magic bytes {found:02x?}")]
    BadMagic {
        /// First bytes of the file
        found: Vec<u8>,
    },

    /// Container version this build cannot read or write
    #[error("container version {found} is {relation} supported {supported}")]
    UnsupportedVersion {
        /// Version found in the file (`major.minor`)
        found: String,
        /// `newer than` or `older than`
        relation: &'static str,
        /// Versions this build understands
        supported: String,
    },

    /// Stored identity hash does not match the container contents
    #[error("identity hash mismatch: stored {stored}, computed {computed}")]
    HashMismatch {
        /// Hash stored in the preamble
        stored: String,
        /// Hash of the bytes actually present
        computed: String,
    },

    /// A section extends past the end of the data
    #[error("truncated {section}: needed {needed} bytes, {available} available")]
    Truncated {
        /// Section being read
        section: &'static str,
        /// Bytes required
        needed: usize,
        /// Bytes remaining
        available: usize,
    },

    /// Structurally invalid payload
    #[error("malformed container: {0}")]
    Malformed(String),

    /// Decoded arrays violate dataset invariants
    #[error("decoded run is invalid: {0}")]
    Dataset(#[from] DatasetError),

    /// Error tied to a specific file
    #[error("{}: {source}", path.display())]
    File {
        /// Container path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: Box<CodecError>,
    },
}

impl CodecError {
    /// Attach a file path for user-facing messages
    pub fn at(self, path: impl Into<PathBuf>) -> Self {
        match self {
            CodecError::File { .. } => self,
            other => CodecError::File {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    /// Whether the error means the bytes are not a valid container, as
    /// opposed to an I/O failure
    pub fn is_format_error(&self) -> bool {
        match self {
            CodecError::Io(_) | CodecError::Persist(_) => false,
            CodecError::File { source, .. } => source.is_format_error(),
            _ => true,
        }
    }

    /// Innermost error, skipping the file-path wrapper
    pub fn root(&self) -> &CodecError {
        match self {
            CodecError::File { source, .. } => source.root(),
            other => other,
        }
    }
}
