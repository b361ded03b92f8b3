//! Identity provider access for the forum SSO bridge.
//!
//! The identity provider owns the login session (a browser cookie) and the
//! user and group directory. This crate provides:
//! - The `IdentityProvider` trait the orchestrator depends on
//! - `RequestContext`, the per-request inputs to session validation
//! - `RestIdentityClient`, a client for the provider's user-management REST API

pub mod client;
pub mod config;
pub mod error;
pub mod provider;

pub use client::RestIdentityClient;
pub use config::IdentityConfig;
pub use error::IdentityError;
pub use provider::{IdentityProvider, RequestContext, UserProfile};
