//! The identity provider contract.

use std::collections::HashMap;
use std::net::IpAddr;

use async_trait::async_trait;
use rootcause::Report;
use serde::Deserialize;

use crate::error::IdentityError;

/// Inputs from the inbound HTTP request that session validation needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    cookies: HashMap<String, String>,
    remote_address: Option<IpAddr>,
}

impl RequestContext {
    /// Creates a context from the request's cookies and client address.
    #[must_use]
    pub fn new(cookies: HashMap<String, String>, remote_address: Option<IpAddr>) -> Self {
        Self {
            cookies,
            remote_address,
        }
    }

    /// Adds a cookie.
    #[must_use]
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Returns the value of the named cookie.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Returns the client address, if known.
    #[must_use]
    pub fn remote_address(&self) -> Option<IpAddr> {
        self.remote_address
    }
}

/// A user's profile as stored by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub email: String,
    #[serde(rename = "first-name", default)]
    pub first_name: String,
    #[serde(rename = "last-name", default)]
    pub last_name: String,
}

/// Access to the identity provider's sessions and directory.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Validates the session cookie carried by the request.
    ///
    /// Returns the session's username, or `None` when the cookie is missing,
    /// expired, or bound to a different client address.
    ///
    /// # Errors
    ///
    /// Returns an error for any other provider response.
    async fn authenticate_cookie(
        &self,
        request: &RequestContext,
    ) -> Result<Option<String>, Report<IdentityError>>;

    /// Fetches the profile of `username`.
    async fn get_user(&self, username: &str) -> Result<UserProfile, Report<IdentityError>>;

    /// Fetches the names of all groups `username` belongs to, nested ones included.
    async fn get_user_groups(&self, username: &str)
    -> Result<Vec<String>, Report<IdentityError>>;
}
