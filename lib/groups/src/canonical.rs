//! Deterministic mapping from identity-provider group names to forum group
//! names.
//!
//! A forum group is found again on every login by recomputing its name, so
//! the mapping must never depend on anything but the input name and the
//! configuration.

use std::sync::Arc;

use md2::Md2;
use md5::{Digest, Md5};
use rootcause::Report;

use crate::cache::ReverseLookupCache;
use crate::config::{GroupConfig, NamingStrategy};
use crate::error::GroupError;

/// Hex length of both digests in use.
const DIGEST_HEX_LEN: usize = 32;

/// Maps group names under a configured prefix and records every mapping in
/// the reverse-lookup cache.
#[derive(Debug, Clone)]
pub struct GroupNameCanonicalizer {
    prefix: String,
    strategy: NamingStrategy,
    max_length: usize,
    truncate_length: usize,
    cache: Arc<ReverseLookupCache>,
}

impl GroupNameCanonicalizer {
    /// Builds a canonicalizer, rejecting lengths that leave no room for the
    /// hash suffix or ask for more than a digest provides.
    pub fn new(
        config: &GroupConfig,
        cache: Arc<ReverseLookupCache>,
    ) -> Result<Self, Report<GroupError>> {
        let prefix = config.prefix();
        if !prefix.is_ascii() {
            return Err(invalid_config(format!(
                "prefix '{prefix}' must be ASCII"
            )));
        }

        let fixed = prefix.len() + config.truncate_length();
        let (min_suffix, max_suffix) = match config.strategy() {
            // The suffix grows when the alphanumerics are shorter than the
            // truncate length, up to everything after the prefix.
            NamingStrategy::Short => (
                config.max_length().checked_sub(fixed),
                config.max_length().checked_sub(prefix.len()),
            ),
            NamingStrategy::Long => {
                let suffix = config
                    .max_length()
                    .checked_sub(fixed)
                    .and_then(|rest| rest.checked_sub(1));
                (suffix, suffix)
            }
        };

        match (min_suffix, max_suffix) {
            (Some(min), Some(max)) if min >= 1 && max <= DIGEST_HEX_LEN => {}
            _ => {
                return Err(invalid_config(format!(
                    "max length {} with prefix '{prefix}' and truncate length {} leaves \
                     no valid hash suffix length (1 to {DIGEST_HEX_LEN})",
                    config.max_length(),
                    config.truncate_length(),
                )));
            }
        }

        Ok(Self {
            prefix: prefix.to_string(),
            strategy: config.strategy(),
            max_length: config.max_length(),
            truncate_length: config.truncate_length(),
            cache,
        })
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Canonicalizes `name` and records the mapping in the cache.
    pub fn canonicalize(&self, name: &str) -> String {
        let canonical = self.canonical_name(name);
        self.cache.record(&canonical, name);
        canonical
    }

    /// Canonicalizes `name` without touching the cache.
    #[must_use]
    pub fn canonical_name(&self, name: &str) -> String {
        match self.strategy {
            NamingStrategy::Short => self.short_name(name),
            NamingStrategy::Long => self.long_name(name),
        }
    }

    fn short_name(&self, name: &str) -> String {
        let mut prefixed = self.prefix.clone();
        prefixed.extend(
            name.chars()
                .filter(char::is_ascii_alphanumeric)
                .take(self.truncate_length),
        );

        let digest = hex::encode(Md2::digest(name.as_bytes()));
        let suffix_len = self.max_length - prefixed.len();
        prefixed.push_str(&digest[..suffix_len]);
        prefixed
    }

    fn long_name(&self, name: &str) -> String {
        let canon: String = name
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                c => c.to_ascii_lowercase(),
            })
            .filter(|c| c.is_ascii_digit() || c.is_ascii_lowercase() || *c == '_')
            .collect();

        if self.prefix.len() + canon.len() <= self.max_length {
            return format!("{}{canon}", self.prefix);
        }

        // The digest covers only the kept portion.
        let kept = &canon[..self.truncate_length];
        let digest = hex::encode(Md5::digest(kept.as_bytes()));
        let suffix_len = self.max_length - self.prefix.len() - self.truncate_length - 1;
        format!("{}{kept}_{}", self.prefix, &digest[..suffix_len])
    }
}

fn invalid_config(reason: String) -> Report<GroupError> {
    Report::new(GroupError::InvalidConfig { reason })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn short(prefix: &str, max_length: usize, truncate_length: usize) -> GroupNameCanonicalizer {
        let config = GroupConfig::new(prefix, NamingStrategy::Short)
            .with_lengths(max_length, truncate_length);
        GroupNameCanonicalizer::new(&config, Arc::new(ReverseLookupCache::in_memory()))
            .expect("valid config")
    }

    fn long(prefix: &str) -> GroupNameCanonicalizer {
        let config = GroupConfig::new(prefix, NamingStrategy::Long);
        GroupNameCanonicalizer::new(&config, Arc::new(ReverseLookupCache::in_memory()))
            .expect("valid config")
    }

    #[test]
    fn md2_matches_reference_digests() {
        assert_eq!(
            hex::encode(Md2::digest(b"")),
            "8350e5a3e24c153df2275c9f80692773"
        );
        assert_eq!(
            hex::encode(Md2::digest(b"abc")),
            "da853b0d3f88d99b30283a69e6ded6bb"
        );
    }

    #[test]
    fn short_strategy_fills_max_length() {
        let canon = short("grp_", 15, 8);
        let name = canon.canonical_name("Reference & Instruction Services");
        assert_eq!(name, "grp_Referenc8c1");
        assert_eq!(name.len(), 15);
    }

    #[test]
    fn short_strategy_hash_distinguishes_shared_prefix() {
        let canon = short("grp_", 15, 8);
        let services = canon.canonical_name("Reference & Instruction Services");
        let desk = canon.canonical_name("Reference & Instruction Desk");
        assert_eq!(desk, "grp_Referenc183");
        assert_ne!(services, desk);
    }

    #[test]
    fn short_strategy_pads_short_names_with_hash() {
        let canon = short("grp_", 15, 8);
        assert_eq!(canon.canonical_name("IT"), "grp_ITc416b7b9f");
        assert_eq!(canon.canonical_name("Library Staff"), "grp_LibraryS1ea");
    }

    #[test]
    fn long_strategy_keeps_names_that_fit() {
        let canon = long("grp_");
        assert_eq!(canon.canonical_name("Library Staff"), "grp_library_staff");
        assert_eq!(canon.canonical_name("IT"), "grp_it");
        assert_eq!(canon.canonical_name("Co-Op Team"), "grp_co_op_team");
    }

    #[test]
    fn long_strategy_hashes_truncated_portion() {
        let canon = long("grp_");
        let services = canon.canonical_name("Reference & Instruction Services");
        let expected_suffix = &hex::encode(Md5::digest(b"reference__i"))[..3];
        assert_eq!(services, format!("grp_reference__i_{expected_suffix}"));
        assert_eq!(services, "grp_reference__i_3a8");
        assert_eq!(services.len(), 20);
    }

    #[test]
    fn long_strategy_names_sharing_kept_portion_collide() {
        let canon = long("grp_");
        assert_eq!(
            canon.canonical_name("Reference & Instruction Services"),
            canon.canonical_name("Reference & Instruction Desk")
        );
    }

    #[test]
    fn long_strategy_drops_non_ascii() {
        let canon = long("grp_");
        assert_eq!(canon.canonical_name("Équipe Café"), "grp_quipe_caf");
    }

    #[test]
    fn canonicalize_records_in_cache() {
        let cache = Arc::new(ReverseLookupCache::in_memory());
        let config = GroupConfig::new("grp_", NamingStrategy::Long);
        let canon = GroupNameCanonicalizer::new(&config, Arc::clone(&cache)).expect("valid");

        let name = canon.canonicalize("Library Staff");
        assert_eq!(cache.original_name(&name).as_deref(), Some("Library Staff"));
    }

    #[test]
    fn canonical_name_does_not_record() {
        let cache = Arc::new(ReverseLookupCache::in_memory());
        let config = GroupConfig::new("grp_", NamingStrategy::Long);
        let canon = GroupNameCanonicalizer::new(&config, Arc::clone(&cache)).expect("valid");

        let _ = canon.canonical_name("Library Staff");
        assert!(cache.is_empty());
    }

    #[test]
    fn rejects_non_ascii_prefix() {
        let config = GroupConfig::new("grüppe_", NamingStrategy::Long);
        let report = GroupNameCanonicalizer::new(&config, Arc::new(ReverseLookupCache::in_memory()))
            .unwrap_err();
        assert!(matches!(
            report.current_context(),
            GroupError::InvalidConfig { .. }
        ));
    }

    #[test]
    fn rejects_lengths_without_room_for_hash() {
        for strategy in [NamingStrategy::Short, NamingStrategy::Long] {
            let config = GroupConfig::new("grp_", strategy).with_lengths(16, 12);
            assert!(
                GroupNameCanonicalizer::new(&config, Arc::new(ReverseLookupCache::in_memory()))
                    .is_err(),
                "{strategy:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_suffix_longer_than_digest() {
        let config = GroupConfig::new("grp_", NamingStrategy::Long).with_lengths(60, 12);
        assert!(
            GroupNameCanonicalizer::new(&config, Arc::new(ReverseLookupCache::in_memory()))
                .is_err()
        );

        // A short name could need everything after the prefix.
        let config = GroupConfig::new("grp_", NamingStrategy::Short).with_lengths(40, 12);
        assert!(
            GroupNameCanonicalizer::new(&config, Arc::new(ReverseLookupCache::in_memory()))
                .is_err()
        );
    }

    proptest! {
        #[test]
        fn short_names_have_exact_length(name in "\\PC{0,64}") {
            let canon = short("grp_", 15, 8);
            let result = canon.canonical_name(&name);
            prop_assert_eq!(result.len(), 15);
            prop_assert!(result.starts_with("grp_"));
            prop_assert!(result.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        }

        #[test]
        fn long_names_fit_and_are_stable(name in "\\PC{0,64}") {
            let canon = long("grp_");
            let first = canon.canonical_name(&name);
            prop_assert!(first.len() <= 20);
            prop_assert!(first.starts_with("grp_"));
            prop_assert!(first.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase() || c == '_'));
            prop_assert_eq!(first, canon.canonical_name(&name));
        }

        #[test]
        fn canonicalize_is_deterministic(name in "[A-Za-z &-]{0,40}") {
            let canon = short("grp_", 15, 8);
            prop_assert_eq!(canon.canonicalize(&name), canon.canonicalize(&name));
        }
    }
}
