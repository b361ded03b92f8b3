//! Error types for the forum crate.
//!
//! A group that already exists is not an error here: `create_group` reports
//! it as [`GroupCreation::AlreadyExists`](crate::GroupCreation).

use std::fmt;

/// Errors from forum operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForumError {
    /// Client configuration is unusable.
    Configuration { reason: String },
    /// The request could not be sent or the connection failed.
    RequestFailed { endpoint: String, details: String },
    /// The forum answered with a status the client does not handle.
    UnexpectedStatus { endpoint: String, status: u16 },
    /// The response body could not be decoded.
    InvalidResponse { endpoint: String, details: String },
    /// A group could not be found, even after creating it.
    GroupNotFound { name: String },
}

impl fmt::Display for ForumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { reason } => {
                write!(f, "forum client configuration error: {reason}")
            }
            Self::RequestFailed { endpoint, details } => {
                write!(f, "forum request to '{endpoint}' failed: {details}")
            }
            Self::UnexpectedStatus { endpoint, status } => {
                write!(f, "forum endpoint '{endpoint}' returned status {status}")
            }
            Self::InvalidResponse { endpoint, details } => {
                write!(f, "invalid response from forum endpoint '{endpoint}': {details}")
            }
            Self::GroupNotFound { name } => {
                write!(f, "the group '{name}' was not found on the forum")
            }
        }
    }
}

impl std::error::Error for ForumError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_not_found_display() {
        let err = ForumError::GroupNotFound {
            name: "grp_library".to_string(),
        };
        assert!(err.to_string().contains("grp_library"));
    }

    #[test]
    fn unexpected_status_display() {
        let err = ForumError::UnexpectedStatus {
            endpoint: "admin/groups".to_string(),
            status: 500,
        };
        assert_eq!(
            err.to_string(),
            "forum endpoint 'admin/groups' returned status 500"
        );
    }
}
