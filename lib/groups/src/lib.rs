//! Forum group management for the forum SSO bridge.
//!
//! Identity-provider groups are mirrored onto the forum under a namespace
//! prefix. This crate provides:
//! - `GroupNameCanonicalizer`, the deterministic mapping from an
//!   identity-provider group name to a forum group name
//! - `ReverseLookupCache`, the persistent canonical-to-original name map
//! - `GroupSynchronizer`, which diffs and reconciles a user's memberships
//!
//! Forum groups without the prefix are never inspected or modified.

pub mod cache;
pub mod canonical;
pub mod config;
pub mod error;
pub mod sync;

pub use cache::ReverseLookupCache;
pub use canonical::GroupNameCanonicalizer;
pub use config::{GroupConfig, NamingStrategy};
pub use error::GroupError;
pub use sync::{GroupFailure, GroupOperation, GroupSynchronizer, MembershipDiff, SyncReport};
