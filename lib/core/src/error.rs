//! Result alias shared by the forum SSO bridge crates.
//!
//! Errors are plain enums owned by the crate that raises them (`SsoError`,
//! `GroupError`, ...). They travel as `rootcause` reports so the login flow
//! can name the step that failed on top of the upstream cause.

use rootcause::Report;

/// `Result` whose error is a report with a typed context `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
