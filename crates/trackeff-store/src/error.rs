//! Error types for the store.

use std::fmt;
use std::io;

/// Errors that can occur while writing or reading a store file.
#[derive(Debug)]
pub enum StoreError {
    /// An I/O error occurred during read or write.
    Io(io::Error),
    /// The stream does not start with the expected `b"TEFF"` magic bytes.
    BadMagic,
    /// The format version is not supported by this build.
    UnsupportedVersion {
        /// The version found in the stream.
        found: u8,
    },
    /// A record could not be decoded (truncated or corrupt data).
    Malformed {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// The stored output was produced with a different axis configuration.
    ConfigMismatch {
        /// Hash from the file header.
        recorded: u64,
        /// Hash computed from the current configuration.
        current: u64,
    },
}

impl StoreError {
    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        Self::Malformed {
            detail: detail.into(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::BadMagic => write!(f, "invalid magic bytes (expected b\"TEFF\")"),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported format version {found}")
            }
            Self::Malformed { detail } => write!(f, "malformed record: {detail}"),
            Self::ConfigMismatch { recorded, current } => write!(
                f,
                "config hash mismatch: recorded={recorded:#018x}, current={current:#018x}"
            ),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
