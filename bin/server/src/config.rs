//! Centralized server configuration.
//!
//! Loaded via the `config` crate from an optional file named by
//! `FORUM_BRIDGE_CONFIG`, overlaid by environment variables with `__` as
//! the nesting separator (e.g. `SSO__SECRET`, `GROUPS__PREFIX`).
//!
//! See [`IdentityConfig`], [`ForumConfig`] and [`GroupConfig`] for the
//! settings of each collaborator.

use std::path::{Path, PathBuf};

use forum_bridge_forum::ForumConfig;
use forum_bridge_groups::GroupConfig;
use forum_bridge_identity::IdentityConfig;
use forum_bridge_sso::SsoSecret;
use serde::Deserialize;

/// Environment variable naming the optional configuration file.
pub const CONFIG_FILE_VAR: &str = "FORUM_BRIDGE_CONFIG";

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// SSO secret and the URLs of the login flow.
    pub sso: SsoConfig,

    /// Identity provider configuration.
    pub identity: IdentityConfig,

    /// Forum admin API configuration.
    pub forum: ForumConfig,

    /// Group naming and reverse-lookup cache configuration.
    pub groups: GroupConfig,
}

/// SSO settings shared with the forum.
#[derive(Debug, Clone, Deserialize)]
pub struct SsoConfig {
    /// Secret the forum signs payloads with.
    pub secret: SsoSecret,
    /// Where this service is reachable, for the return from the login portal.
    pub public_url: String,
    /// The forum's SSO callback (e.g. `https://forum.example.com/session/sso_login`).
    pub callback_url: String,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

impl ServerConfig {
    /// Loads configuration from the optional file and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn load() -> Result<Self, config::ConfigError> {
        let file = std::env::var_os(CONFIG_FILE_VAR).map(PathBuf::from);
        Self::from_sources(
            file.as_deref(),
            config::Environment::default()
                .separator("__")
                .try_parsing(true),
        )
    }

    fn from_sources(
        file: Option<&Path>,
        environment: config::Environment,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path));
        }
        builder.add_source(environment).build()?.try_deserialize()
    }
}
