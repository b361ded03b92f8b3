//! Forum access for the forum SSO bridge.
//!
//! The forum receives synchronized users and group memberships. This crate
//! provides:
//! - The `ForumApi` trait the synchronizer and orchestrator depend on
//! - The forum's user and group types
//! - `RestForumClient`, a client for the forum's admin REST API

pub mod api;
pub mod client;
pub mod config;
pub mod error;

pub use api::{ForumApi, ForumGroup, ForumUser, GroupCreation, GroupRef};
pub use client::RestForumClient;
pub use config::ForumConfig;
pub use error::ForumError;
