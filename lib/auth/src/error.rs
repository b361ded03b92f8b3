//! Error types for the auth crate.
//!
//! These wrap the reports of the lower crates as context, naming the step
//! of the login that failed. A missing identity-provider session is not an
//! error: it is an [`AuthOutcome`](crate::AuthOutcome).

use std::fmt;

/// Errors that abort a login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The inbound payload is malformed or its signature does not match.
    InvalidPayload,
    /// The identity provider could not validate the session.
    SessionLookup,
    /// The user's profile could not be fetched.
    ProfileFetch { username: String },
    /// The forum rejected the user synchronization.
    UserSync { username: String },
    /// The user's identity-provider groups could not be fetched.
    GroupLookup { username: String },
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPayload => {
                write!(f, "invalid SSO payload")
            }
            Self::SessionLookup => {
                write!(f, "identity provider session lookup failed")
            }
            Self::ProfileFetch { username } => {
                write!(f, "failed to fetch profile for '{username}'")
            }
            Self::UserSync { username } => {
                write!(f, "failed to synchronize '{username}' to the forum")
            }
            Self::GroupLookup { username } => {
                write!(f, "failed to fetch groups for '{username}'")
            }
        }
    }
}

impl std::error::Error for AuthError {}
