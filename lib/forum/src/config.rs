//! Forum connection settings.

use serde::Deserialize;

/// Configuration for the forum's admin REST API.
#[derive(Clone, Deserialize)]
pub struct ForumConfig {
    /// Base URL of the forum (e.g., "https://forum.example.com").
    base_url: String,
    /// Username the API key acts as.
    api_username: String,
    /// Admin API key.
    api_key: String,
}

impl ForumConfig {
    #[must_use]
    pub fn new(base_url: String, api_username: String, api_key: String) -> Self {
        Self {
            base_url,
            api_username,
            api_key,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn api_username(&self) -> &str {
        &self.api_username
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl std::fmt::Debug for ForumConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForumConfig")
            .field("base_url", &self.base_url)
            .field("api_username", &self.api_username)
            .field("api_key", &"..")
            .finish()
    }
}
