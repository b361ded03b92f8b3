//! Error types for the SSO payload crate.
//!
//! Every variant is fatal to the login flow. Callers wrap these reports with
//! their own context instead of inspecting the inner details.

use std::fmt;

/// Errors from parsing, verifying or accessing an SSO payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SsoError {
    /// A required part of the payload is missing or cannot be decoded.
    MalformedPayload { reason: String },
    /// The supplied signature does not match the payload body.
    SignatureMismatch,
    /// A key outside the fixed attributes and the custom-field namespace.
    InvalidAttribute { key: String },
}

impl fmt::Display for SsoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedPayload { reason } => {
                write!(f, "malformed SSO payload: {reason}")
            }
            Self::SignatureMismatch => {
                write!(f, "bad signature for SSO payload")
            }
            Self::InvalidAttribute { key } => {
                write!(f, "invalid SSO attribute: {key}")
            }
        }
    }
}

impl std::error::Error for SsoError {}
