//! Group naming settings.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// How identity-provider group names are turned into forum group names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingStrategy {
    /// Fixed-length names: alphanumerics, then an MD2 suffix filling the rest.
    Short,
    /// Readable names, hashed only when they would exceed the maximum length.
    #[default]
    Long,
}

/// Configuration for forum group naming and the reverse-lookup cache.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupConfig {
    /// Namespace prefix marking groups managed by the bridge.
    prefix: String,
    #[serde(default)]
    strategy: NamingStrategy,
    /// Maximum length of a forum group name.
    #[serde(default = "default_max_length")]
    max_length: usize,
    /// Length the canonical portion is cut to before the hash suffix.
    #[serde(default = "default_truncate_length")]
    truncate_length: usize,
    /// Where the reverse-lookup cache is persisted. In memory only if unset.
    #[serde(default)]
    cache_path: Option<PathBuf>,
}

fn default_max_length() -> usize {
    20
}

fn default_truncate_length() -> usize {
    12
}

impl GroupConfig {
    /// Creates a configuration with the default lengths and no cache file.
    #[must_use]
    pub fn new(prefix: impl Into<String>, strategy: NamingStrategy) -> Self {
        Self {
            prefix: prefix.into(),
            strategy,
            max_length: default_max_length(),
            truncate_length: default_truncate_length(),
            cache_path: None,
        }
    }

    #[must_use]
    pub fn with_lengths(mut self, max_length: usize, truncate_length: usize) -> Self {
        self.max_length = max_length;
        self.truncate_length = truncate_length;
        self
    }

    #[must_use]
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn strategy(&self) -> NamingStrategy {
        self.strategy
    }

    #[must_use]
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    #[must_use]
    pub fn truncate_length(&self) -> usize {
        self.truncate_length
    }

    #[must_use]
    pub fn cache_path(&self) -> Option<&Path> {
        self.cache_path.as_deref()
    }
}
