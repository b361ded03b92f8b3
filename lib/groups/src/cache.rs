//! Persistent reverse lookup from canonical group names to original names.
//!
//! The cache is diagnostic only: nothing in reconciliation reads it. Entries
//! are appended as groups are canonicalized and written back with
//! [`ReverseLookupCache::flush`], which merges them over whatever other
//! processes have persisted in the meantime.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use forum_bridge_core::Result;
use fs2::FileExt;
use rootcause::Report;
use tracing::{debug, warn};

use crate::error::GroupError;

/// Canonical-to-original group name map, optionally backed by a JSON file.
#[derive(Debug)]
pub struct ReverseLookupCache {
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, String>>,
}

/// Exclusive advisory lock on the cache file, released on drop.
struct CacheLock<'a> {
    file: &'a File,
}

impl<'a> CacheLock<'a> {
    fn acquire(file: &'a File) -> io::Result<Self> {
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for CacheLock<'_> {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl ReverseLookupCache {
    /// Loads the cache persisted at `path`. A missing file is an empty cache.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, GroupError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) => parse_entries(&path, &contents)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(Report::new(GroupError::CacheIo {
                    path,
                    details: e.to_string(),
                }));
            }
        };

        debug!(path = %path.display(), entries = entries.len(), "Loaded group cache");

        Ok(Self {
            path: Some(path),
            entries: Mutex::new(entries),
        })
    }

    /// Creates a cache that is never persisted.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Records that `canonical` was derived from `original`.
    pub fn record(&self, canonical: &str, original: &str) {
        let mut entries = self.entries();
        if let Some(previous) = entries.insert(canonical.to_string(), original.to_string())
            && previous != original
        {
            debug!(
                canonical,
                previous = %previous,
                original,
                "Group name collision in cache, keeping latest"
            );
        }
    }

    /// Returns the original name recorded for `canonical`.
    #[must_use]
    pub fn original_name(&self, canonical: &str) -> Option<String> {
        self.entries().get(canonical).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Writes the cache back to its file.
    ///
    /// The file is locked exclusively for the whole read-merge-write cycle.
    /// In-memory entries win over those on disk. Does nothing for an
    /// in-memory cache.
    pub fn flush(&self) -> Result<(), GroupError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        let io_error = |e: io::Error| GroupError::CacheIo {
            path: path.to_path_buf(),
            details: e.to_string(),
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(io_error)?;
        let _lock = CacheLock::acquire(&file).map_err(io_error)?;
        let mut handle = &file;

        let mut contents = String::new();
        handle.read_to_string(&mut contents).map_err(io_error)?;
        let mut merged = match parse_entries(path, &contents) {
            Ok(on_disk) => on_disk,
            Err(report) => {
                warn!(error = %report, "Replacing unreadable group cache");
                BTreeMap::new()
            }
        };

        let mut entries = self.entries();
        merged.extend(entries.iter().map(|(k, v)| (k.clone(), v.clone())));

        let json = serde_json::to_vec_pretty(&merged).map_err(|e| GroupError::CacheFormat {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;
        file.set_len(0).map_err(io_error)?;
        handle.seek(SeekFrom::Start(0)).map_err(io_error)?;
        handle.write_all(&json).map_err(io_error)?;
        handle.flush().map_err(io_error)?;

        debug!(path = %path.display(), entries = merged.len(), "Flushed group cache");
        *entries = merged;

        Ok(())
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn parse_entries(
    path: &Path,
    contents: &str,
) -> Result<BTreeMap<String, String>, GroupError> {
    if contents.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(contents).map_err(|e| {
        Report::new(GroupError::CacheFormat {
            path: path.to_path_buf(),
            details: e.to_string(),
        })
    })
}
