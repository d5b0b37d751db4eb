use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::random::EntropyError;

/// Result type alias for shred operations.
pub type Result<T> = std::result::Result<T, ShredError>;

/// Every way a shred can fail. None of these are retried.
#[derive(Debug, Error)]
pub enum ShredError {
    /// Target file missing, inaccessible, or otherwise unopenable
    #[error("Error opening file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Size query on an open handle failed
    #[error("Error getting file statistics: {0}")]
    Stat(#[source] io::Error),

    /// The secure random source could not produce the requested bytes
    #[error("Error generating random bytes: {0}")]
    Entropy(#[from] EntropyError),

    /// A pass's write did not complete
    #[error("Error writing random bytes to stream (pass {pass}): {source}")]
    Write {
        pass: usize,
        #[source]
        source: io::Error,
    },

    /// A pass's durability flush failed
    #[error("Error syncing stream (pass {pass}): {source}")]
    Sync {
        pass: usize,
        #[source]
        source: io::Error,
    },

    /// Repositioning between passes failed
    #[error("Error seeking stream (pass {pass}): {source}")]
    Seek {
        pass: usize,
        #[source]
        source: io::Error,
    },

    /// The destination cannot be repositioned at all
    #[error("Stream does not support seeking")]
    Unseekable,

    /// Target does not fit in a single in-memory buffer
    #[error("Target length {length} exceeds addressable memory")]
    TargetTooLarge { length: u64 },
}

impl ShredError {
    pub fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    /// Short name of the stage that failed, for log fields.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Open { .. } => "open",
            Self::Stat(_) => "stat",
            Self::Entropy(_) => "entropy",
            Self::Write { .. } => "write",
            Self::Sync { .. } => "sync",
            Self::Seek { .. } => "seek",
            Self::Unseekable => "seek-capability",
            Self::TargetTooLarge { .. } => "length",
        }
    }
}
