//! REST client for the identity provider's user-management API.

use std::net::IpAddr;

use async_trait::async_trait;
use forum_bridge_core::Result;
use reqwest::{StatusCode, header::ACCEPT};
use rootcause::Report;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::sync::OnceCell;
use tracing::{debug, instrument};
use url::Url;

use crate::config::IdentityConfig;
use crate::error::{IdentityError, token_hint};
use crate::provider::{IdentityProvider, RequestContext, UserProfile};

/// Path of the user-management API below the provider's base URL.
const API_PATH: &str = "rest/usermanagement/1/";

/// Validation factor carrying the client address.
const REMOTE_ADDRESS_FACTOR: &str = "remote_address";

#[derive(Debug, Deserialize)]
struct CookieConfig {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GroupList {
    #[serde(default)]
    groups: Vec<GroupEntry>,
}

#[derive(Debug, Deserialize)]
struct GroupEntry {
    name: String,
}

#[derive(Debug, Serialize)]
struct SessionValidation {
    #[serde(rename = "validationFactors")]
    validation_factors: Vec<ValidationFactor>,
}

#[derive(Debug, Serialize)]
struct ValidationFactor {
    name: &'static str,
    value: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    token: String,
    user: SessionUser,
}

#[derive(Debug, Deserialize)]
struct SessionUser {
    name: String,
}

/// Identity provider client authenticating as an application over HTTP basic auth.
pub struct RestIdentityClient {
    http: reqwest::Client,
    api_base: Url,
    application: String,
    password: String,
    remote_address_validation: bool,
    /// Session cookie name, fetched from the provider on first use.
    cookie_name: OnceCell<String>,
}

impl RestIdentityClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let api_base = Url::parse(&format!("{}/", config.base_url().trim_end_matches('/')))
            .and_then(|base| base.join(API_PATH))
            .map_err(|e| IdentityError::Configuration {
                reason: format!("invalid base URL: {e}"),
            })?;

        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| IdentityError::Configuration {
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            api_base,
            application: config.application().to_string(),
            password: config.password().to_string(),
            remote_address_validation: config.remote_address_validation(),
            cookie_name: OnceCell::new(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, IdentityError> {
        self.api_base.join(path).map_err(|e| {
            IdentityError::Configuration {
                reason: format!("invalid endpoint '{path}': {e}"),
            }
            .into()
        })
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .basic_auth(&self.application, Some(&self.password))
            .header(ACCEPT, "application/json")
    }

    async fn send(
        &self,
        path: &str,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, IdentityError> {
        builder.send().await.map_err(|e| {
            IdentityError::RequestFailed {
                endpoint: path.to_string(),
                details: e.to_string(),
            }
            .into()
        })
    }

    async fn decode<T: DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, IdentityError> {
        let status = response.status();
        if !status.is_success() {
            return Err(IdentityError::UnexpectedStatus {
                endpoint: path.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        response.json::<T>().await.map_err(|e| {
            IdentityError::InvalidResponse {
                endpoint: path.to_string(),
                details: e.to_string(),
            }
            .into()
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, IdentityError> {
        let url = self.endpoint(path)?;
        let response = self
            .send(path, self.request(reqwest::Method::GET, url).query(query))
            .await?;
        Self::decode(path, response).await
    }

    /// Returns the name of the provider's session cookie.
    async fn cookie_name(&self) -> Result<&str, IdentityError> {
        let name = self
            .cookie_name
            .get_or_try_init(|| async {
                let config: CookieConfig = self.get_json("config/cookie", &[]).await?;
                debug!(cookie = %config.name, "loaded session cookie settings");
                Ok::<_, Report<IdentityError>>(config.name)
            })
            .await?;
        Ok(name.as_str())
    }

    async fn validate_session(
        &self,
        token: &str,
        remote_address: Option<IpAddr>,
    ) -> Result<Option<String>, IdentityError> {
        let path = format!("session/{}", urlencoding::encode(token));
        let url = self.endpoint(&path)?;

        let validation_factors = match remote_address {
            Some(address) if self.remote_address_validation => vec![ValidationFactor {
                name: REMOTE_ADDRESS_FACTOR,
                value: address.to_string(),
            }],
            _ => Vec::new(),
        };

        let response = self
            .send(
                "session",
                self.request(reqwest::Method::POST, url)
                    .json(&SessionValidation { validation_factors }),
            )
            .await?;

        // 400 means the address validation failed, 404 means the token expired.
        if matches!(
            response.status(),
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND
        ) {
            debug!(status = %response.status(), "session rejected by identity provider");
            return Ok(None);
        }

        let session: SessionResponse = Self::decode("session", response).await?;
        if session.token != token {
            return Err(IdentityError::TokenMismatch {
                presented: token_hint(token),
                returned: token_hint(&session.token),
            }
            .into());
        }

        Ok(Some(session.user.name))
    }
}

#[async_trait]
impl IdentityProvider for RestIdentityClient {
    #[instrument(skip(self, request))]
    async fn authenticate_cookie(
        &self,
        request: &RequestContext,
    ) -> Result<Option<String>, IdentityError> {
        let cookie_name = self.cookie_name().await?;

        let Some(token) = request.cookie(cookie_name) else {
            debug!(cookie = %cookie_name, "no session cookie present");
            return Ok(None);
        };

        self.validate_session(token, request.remote_address()).await
    }

    #[instrument(skip(self))]
    async fn get_user(&self, username: &str) -> Result<UserProfile, IdentityError> {
        self.get_json("user", &[("username", username)]).await
    }

    #[instrument(skip(self))]
    async fn get_user_groups(
        &self,
        username: &str,
    ) -> Result<Vec<String>, IdentityError> {
        let list: GroupList = self
            .get_json("user/group/nested", &[("username", username)])
            .await?;
        Ok(list.groups.into_iter().map(|group| group.name).collect())
    }
}
