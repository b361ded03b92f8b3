//! Shared foundations for the forum SSO bridge.
//!
//! The bridge is split into one crate per concern (payload codec, identity
//! provider, forum, group synchronization, orchestration). This crate holds
//! the pieces every one of them agrees on.

pub mod error;

pub use error::Result;
