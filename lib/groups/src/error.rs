//! Error types for the groups crate.
//!
//! Failures of individual group operations during reconciliation are not
//! errors here: they are collected into [`SyncReport`](crate::SyncReport).

use std::fmt;
use std::path::PathBuf;

/// Errors from group configuration and the reverse-lookup cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupError {
    /// The naming configuration cannot produce valid group names.
    InvalidConfig { reason: String },
    /// The cache file could not be read, locked or written.
    CacheIo { path: PathBuf, details: String },
    /// The cache file does not contain a JSON object of strings.
    CacheFormat { path: PathBuf, details: String },
}

impl fmt::Display for GroupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { reason } => {
                write!(f, "invalid group configuration: {reason}")
            }
            Self::CacheIo { path, details } => {
                write!(
                    f,
                    "group cache I/O failed for '{}': {details}",
                    path.display()
                )
            }
            Self::CacheFormat { path, details } => {
                write!(
                    f,
                    "group cache '{}' is not valid: {details}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for GroupError {}
