//! Identity provider connection settings.

use serde::Deserialize;

/// Configuration for the identity provider's REST API and login portal.
///
/// Fields with defaults can be omitted when loading from environment variables.
#[derive(Clone, Deserialize)]
pub struct IdentityConfig {
    /// Base URL of the provider (e.g., "https://crowd.example.com/crowd").
    base_url: String,
    /// Application name used for HTTP basic authentication.
    application: String,
    /// Application password used for HTTP basic authentication.
    password: String,
    /// Login portal that accepts a `redirectTo` parameter.
    login_url: String,
    /// Whether session validation sends the client address as a validation factor.
    /// Default: true
    #[serde(default = "default_remote_address_validation")]
    remote_address_validation: bool,
}

fn default_remote_address_validation() -> bool {
    true
}

impl IdentityConfig {
    /// Creates a configuration with defaults for optional fields.
    #[must_use]
    pub fn new(base_url: String, application: String, password: String, login_url: String) -> Self {
        Self {
            base_url,
            application,
            password,
            login_url,
            remote_address_validation: default_remote_address_validation(),
        }
    }

    /// Enables or disables the client address validation factor.
    #[must_use]
    pub fn with_remote_address_validation(mut self, enabled: bool) -> Self {
        self.remote_address_validation = enabled;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn application(&self) -> &str {
        &self.application
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    #[must_use]
    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    #[must_use]
    pub fn remote_address_validation(&self) -> bool {
        self.remote_address_validation
    }
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("base_url", &self.base_url)
            .field("application", &self.application)
            .field("password", &"..")
            .field("login_url", &self.login_url)
            .field("remote_address_validation", &self.remote_address_validation)
            .finish()
    }
}
