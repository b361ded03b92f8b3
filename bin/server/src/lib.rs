//! HTTP entry point of the forum SSO bridge.
//!
//! The forum sends browsers here to log in. The router dispatches on the
//! query string to the request or response phase of
//! [`AuthOrchestrator`](forum_bridge_auth::AuthOrchestrator) and turns its
//! outcome into a redirect.

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
