//! Error type for cut configuration I/O.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Failure while loading cut configuration from an external source.
#[derive(Debug)]
pub enum CutError {
    /// A run-mask file could not be opened.
    Open {
        /// The path that was requested.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// Reading a run-mask source failed part way.
    Io(io::Error),
}

impl fmt::Display for CutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "can't read run mask file {}: {source}", path.display())
            }
            Self::Io(e) => write!(f, "I/O error reading run mask: {e}"),
        }
    }
}

impl Error for CutError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for CutError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
