//! REST client for the forum's admin API.

use async_trait::async_trait;
use forum_bridge_core::Result;
use forum_bridge_sso::{Attribute, SsoPayload, codec};
use reqwest::{
    StatusCode,
    header::{ACCEPT, HeaderName},
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use tracing::{debug, instrument};
use url::Url;

use crate::api::{ForumApi, ForumUser, GroupCreation, GroupRef};
use crate::config::ForumConfig;
use crate::error::ForumError;

const API_KEY_HEADER: HeaderName = HeaderName::from_static("api-key");
const API_USERNAME_HEADER: HeaderName = HeaderName::from_static("api-username");

/// Attributes forwarded to the forum's user synchronization endpoint.
const SYNCED_ATTRIBUTES: [Attribute; 4] = [
    Attribute::Name,
    Attribute::Username,
    Attribute::Email,
    Attribute::ExternalId,
];

#[derive(Debug, Deserialize)]
struct CreatedGroup {
    basic_group: GroupRef,
}

/// Older forums answer with a bare array, newer ones wrap it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GroupListing {
    Bare(Vec<GroupRef>),
    Wrapped { groups: Vec<GroupRef> },
}

impl From<GroupListing> for Vec<GroupRef> {
    fn from(listing: GroupListing) -> Self {
        match listing {
            GroupListing::Bare(groups) | GroupListing::Wrapped { groups } => groups,
        }
    }
}

/// Forum client authenticating with an admin API key.
pub struct RestForumClient {
    http: reqwest::Client,
    base_url: Url,
    api_username: String,
    api_key: String,
}

impl RestForumClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(config: &ForumConfig) -> Result<Self, ForumError> {
        let base_url = Url::parse(&format!("{}/", config.base_url().trim_end_matches('/')))
            .map_err(|e| ForumError::Configuration {
                reason: format!("invalid base URL: {e}"),
            })?;

        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ForumError::Configuration {
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url,
            api_username: config.api_username().to_string(),
            api_key: config.api_key().to_string(),
        })
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> Result<reqwest::RequestBuilder, ForumError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ForumError::Configuration {
                reason: format!("invalid endpoint '{path}': {e}"),
            })?;

        Ok(self
            .http
            .request(method, url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(API_USERNAME_HEADER, &self.api_username)
            .header(ACCEPT, "application/json"))
    }

    async fn send(
        path: &str,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ForumError> {
        builder.send().await.map_err(|e| {
            ForumError::RequestFailed {
                endpoint: path.to_string(),
                details: e.to_string(),
            }
            .into()
        })
    }

    fn check_status(path: &str, response: &reqwest::Response) -> Result<(), ForumError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ForumError::UnexpectedStatus {
                endpoint: path.to_string(),
                status: status.as_u16(),
            }
            .into())
        }
    }

    async fn decode<T: DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, ForumError> {
        Self::check_status(path, &response)?;
        response.json::<T>().await.map_err(|e| {
            ForumError::InvalidResponse {
                endpoint: path.to_string(),
                details: e.to_string(),
            }
            .into()
        })
    }

    fn members_path(group_id: u64) -> String {
        format!("admin/groups/{group_id}/members.json")
    }
}

#[async_trait]
impl ForumApi for RestForumClient {
    #[instrument(skip(self, payload))]
    async fn sync_user(&self, payload: &SsoPayload) -> Result<ForumUser, ForumError> {
        let path = "admin/users/sync_sso";

        let mut outbound = SsoPayload::new(payload.secret().clone());
        for attribute in SYNCED_ATTRIBUTES {
            if let Some(value) = payload.get(attribute) {
                outbound.set(attribute, value.clone());
            }
        }
        let signed = codec::sign_payload(&outbound);

        let builder = self
            .request(reqwest::Method::POST, path)?
            .json(&json!({ "sso": signed.sso, "sig": signed.sig }));
        let user: ForumUser = Self::decode(path, Self::send(path, builder).await?).await?;

        debug!(username = %user.username, groups = user.groups.len(), "synchronized forum user");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn list_groups(&self) -> Result<Vec<GroupRef>, ForumError> {
        let path = "admin/groups.json";
        let builder = self.request(reqwest::Method::GET, path)?;
        let listing: GroupListing = Self::decode(path, Self::send(path, builder).await?).await?;
        Ok(listing.into())
    }

    #[instrument(skip(self))]
    async fn create_group(&self, name: &str) -> Result<GroupCreation, ForumError> {
        let path = "admin/groups";
        let builder = self
            .request(reqwest::Method::POST, path)?
            .json(&json!({ "group": { "name": name } }));
        let response = Self::send(path, builder).await?;

        // 422 is how the forum reports a name that is already taken.
        if response.status() == StatusCode::UNPROCESSABLE_ENTITY {
            debug!(group = %name, "group already exists");
            return Ok(GroupCreation::AlreadyExists);
        }

        let created: CreatedGroup = Self::decode(path, response).await?;
        Ok(GroupCreation::Created(created.basic_group))
    }

    #[instrument(skip(self))]
    async fn add_group_member(
        &self,
        group_id: u64,
        username: &str,
    ) -> Result<(), ForumError> {
        let path = Self::members_path(group_id);
        let builder = self
            .request(reqwest::Method::PUT, &path)?
            .json(&json!({ "usernames": username }));
        Self::check_status(&path, &Self::send(&path, builder).await?)
    }

    #[instrument(skip(self))]
    async fn remove_group_member(
        &self,
        group_id: u64,
        username: &str,
    ) -> Result<(), ForumError> {
        let path = Self::members_path(group_id);
        let builder = self
            .request(reqwest::Method::DELETE, &path)?
            .query(&[("username", username)]);
        Self::check_status(&path, &Self::send(&path, builder).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forum_bridge_sso::SsoSecret;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn client(server: &MockServer) -> RestForumClient {
        let config = ForumConfig::new(server.uri(), "system".to_string(), "key123".to_string());
        RestForumClient::new(&config).expect("valid config")
    }

    #[tokio::test]
    async fn sync_user_posts_signed_subset_of_payload() {
        let server = MockServer::start().await;
        let secret = SsoSecret::new("sso-secret");

        Mock::given(method("POST"))
            .and(path("/admin/users/sync_sso"))
            .and(header("Api-Key", "key123"))
            .and(header("Api-Username", "system"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "username": "John",
                "groups": [{"name": "grp_library"}, {"name": "staff"}]
            })))
            .mount(&server)
            .await;

        let mut payload = SsoPayload::new(secret.clone());
        payload.set(Attribute::Nonce, "n");
        payload.set(Attribute::Name, "John Doe");
        payload.set(Attribute::Username, "John");
        payload.set(Attribute::Email, "john@example.com");
        payload.set(Attribute::ExternalId, "jdoe");
        payload.set(Attribute::ReturnSsoUrl, "https://forum.example.com/session/sso_login");

        let user = client(&server).sync_user(&payload).await.expect("sync");
        assert_eq!(user.username, "John");
        assert_eq!(user.groups.len(), 2);

        let requests: Vec<Request> = server.received_requests().await.unwrap_or_default();
        let body: serde_json::Value = requests[0].body_json().expect("json body");
        let sso = body["sso"].as_str().expect("sso");
        let sig = body["sig"].as_str().expect("sig");
        assert_eq!(codec::sign(sso, &secret), sig);

        let raw = codec::query_string([("sso", sso), ("sig", sig)]);
        let sent = codec::parse_signed(&raw, &secret).expect("valid signature");
        assert_eq!(sent.text(Attribute::ExternalId), Some("jdoe"));
        assert_eq!(sent.text(Attribute::Name), Some("John Doe"));
        assert!(!sent.is_set(Attribute::Nonce));
        assert!(!sent.is_set(Attribute::ReturnSsoUrl));
    }

    #[tokio::test]
    async fn list_groups_accepts_bare_and_wrapped_listings() {
        for body in [
            json!([{"id": 1, "name": "staff"}]),
            json!({"groups": [{"id": 1, "name": "staff"}], "total_rows_groups": 1}),
        ] {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/admin/groups.json"))
                .respond_with(ResponseTemplate::new(200).set_body_json(body))
                .mount(&server)
                .await;

            let groups = client(&server).list_groups().await.expect("groups");
            assert_eq!(
                groups,
                vec![GroupRef {
                    id: 1,
                    name: "staff".to_string()
                }]
            );
        }
    }

    #[tokio::test]
    async fn create_group_returns_created_reference() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/groups"))
            .and(body_json(json!({"group": {"name": "grp_library"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "basic_group": {"id": 42, "name": "grp_library"}
            })))
            .mount(&server)
            .await;

        let creation = client(&server)
            .create_group("grp_library")
            .await
            .expect("create");
        assert_eq!(
            creation,
            GroupCreation::Created(GroupRef {
                id: 42,
                name: "grp_library".to_string()
            })
        );
    }

    #[tokio::test]
    async fn create_group_conflict_is_already_exists() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/groups"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "errors": ["Name has already been taken"]
            })))
            .mount(&server)
            .await;

        let creation = client(&server)
            .create_group("grp_library")
            .await
            .expect("conflict is not an error");
        assert_eq!(creation, GroupCreation::AlreadyExists);
    }

    #[tokio::test]
    async fn create_group_other_failures_are_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/groups"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = client(&server)
            .create_group("grp_library")
            .await
            .expect_err("forbidden");
        assert!(matches!(
            err.current_context(),
            ForumError::UnexpectedStatus { status: 403, .. }
        ));
    }

    #[tokio::test]
    async fn membership_changes_use_group_id() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/admin/groups/42/members.json"))
            .and(body_json(json!({"usernames": "John"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": "OK"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/admin/groups/42/members.json"))
            .and(query_param("username", "John"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": "OK"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        client.add_group_member(42, "John").await.expect("add");
        client.remove_group_member(42, "John").await.expect("remove");
    }
}
