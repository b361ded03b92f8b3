//! Error types for the server.
//!
//! Nothing about a failed login reaches the browser beyond a fixed message;
//! the report goes to the operational log.

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use forum_bridge_auth::AuthError;
use rootcause::Report;

/// Shown for every login that fails with an error.
pub const LOGIN_ERROR_MESSAGE: &str = "Error occurred during authentication. Please try again or \
     contact an administrator, if the problem persists";

/// Shown when the query string matches neither login phase.
pub const UNEXPECTED_REQUEST_MESSAGE: &str = "Unexpected authentication request";

/// Shown when the browser returns from the login portal without a session.
pub const REJECTED_MESSAGE: &str = "Authentication failed";

/// Errors that stop the server from starting or serving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerError {
    /// The configured collaborators could not be set up.
    Setup { component: String },
    /// The listener could not bind.
    Bind { addr: String, details: String },
    /// The server stopped with an I/O error.
    Serve { details: String },
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup { component } => write!(f, "failed to set up {component}"),
            Self::Bind { addr, details } => {
                write!(f, "failed to bind to '{addr}': {details}")
            }
            Self::Serve { details } => write!(f, "server error: {details}"),
        }
    }
}

impl std::error::Error for ServerError {}

/// A login that failed with an error, as an HTTP response.
#[derive(Debug)]
pub struct LoginError(pub Report<AuthError>);

impl From<Report<AuthError>> for LoginError {
    fn from(report: Report<AuthError>) -> Self {
        Self(report)
    }
}

impl IntoResponse for LoginError {
    fn into_response(self) -> Response {
        tracing::error!("Login failed: {}", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, LOGIN_ERROR_MESSAGE).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_error_hides_details() {
        let report = Report::new(AuthError::ProfileFetch {
            username: "jdoe".to_string(),
        });
        let response = LoginError::from(report).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn bind_display() {
        let err = ServerError::Bind {
            addr: "127.0.0.1:8080".to_string(),
            details: "address in use".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to bind to '127.0.0.1:8080': address in use"
        );
    }
}
