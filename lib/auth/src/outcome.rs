//! How a login step ends when nothing went wrong.

/// Result of processing one phase of a login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// No session yet: send the browser to the identity provider's login page.
    LoginRequired { location: String },
    /// The user was synchronized: send the browser back to the forum.
    LoggedIn {
        location: String,
        forum_username: String,
    },
    /// The browser returned from the login page still without a session.
    Rejected,
}

impl AuthOutcome {
    /// Returns the redirect target, if this outcome redirects.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::LoginRequired { location } | Self::LoggedIn { location, .. } => Some(location),
            Self::Rejected => None,
        }
    }
}
