//! Error types for the identity crate.
//!
//! A missing or expired session is not an error; it is reported as `None`
//! by [`IdentityProvider::authenticate_cookie`](crate::IdentityProvider).

use std::fmt;

/// Errors from identity provider operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Client configuration is unusable.
    Configuration { reason: String },
    /// The request could not be sent or the connection failed.
    RequestFailed { endpoint: String, details: String },
    /// The provider answered with a status the client does not handle.
    UnexpectedStatus { endpoint: String, status: u16 },
    /// The provider returned a session for a different token.
    ///
    /// Only redacted hints of the tokens are kept, see [`token_hint`].
    TokenMismatch { presented: String, returned: String },
    /// The response body could not be decoded.
    InvalidResponse { endpoint: String, details: String },
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { reason } => {
                write!(f, "identity client configuration error: {reason}")
            }
            Self::RequestFailed { endpoint, details } => {
                write!(f, "identity request to '{endpoint}' failed: {details}")
            }
            Self::UnexpectedStatus { endpoint, status } => {
                write!(f, "identity endpoint '{endpoint}' returned status {status}")
            }
            Self::TokenMismatch { presented, returned } => {
                write!(f, "returned token mismatch, '{presented}' <> '{returned}'")
            }
            Self::InvalidResponse { endpoint, details } => {
                write!(f, "invalid response from identity endpoint '{endpoint}': {details}")
            }
        }
    }
}

impl std::error::Error for IdentityError {}

/// Characters of a session token kept in errors and logs.
const TOKEN_HINT_LEN: usize = 4;

/// Shortens a session token to a prefix safe to log.
#[must_use]
pub fn token_hint(token: &str) -> String {
    let mut hint: String = token.chars().take(TOKEN_HINT_LEN).collect();
    hint.push_str("...");
    hint
}
