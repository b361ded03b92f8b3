//! Application state, router and server lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get};
use forum_bridge_auth::{AuthOrchestrator, AuthSettings};
use forum_bridge_forum::RestForumClient;
use forum_bridge_groups::{GroupConfig, GroupNameCanonicalizer, ReverseLookupCache};
use forum_bridge_identity::RestIdentityClient;
use rootcause::prelude::{Report, ResultExt};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::routes;

/// Shared application state.
pub struct AppState {
    pub orchestrator: AuthOrchestrator,
}

impl AppState {
    #[must_use]
    pub fn new(orchestrator: AuthOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Builds the REST clients and the orchestrator from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a client or the group naming cannot be set up.
    pub fn from_config(
        config: &ServerConfig,
        cache: Arc<ReverseLookupCache>,
    ) -> Result<Self, Report<ServerError>> {
        let identity = RestIdentityClient::new(&config.identity).context(ServerError::Setup {
            component: "identity provider client".to_string(),
        })?;
        let forum = RestForumClient::new(&config.forum).context(ServerError::Setup {
            component: "forum client".to_string(),
        })?;
        let canonicalizer =
            GroupNameCanonicalizer::new(&config.groups, cache).context(ServerError::Setup {
                component: "group naming".to_string(),
            })?;
        let settings = AuthSettings::new(
            config.sso.secret.clone(),
            config.sso.public_url.clone(),
            config.sso.callback_url.clone(),
            config.identity.login_url(),
        );

        Ok(Self::new(AuthOrchestrator::new(
            Arc::new(identity),
            Arc::new(forum),
            canonicalizer,
            settings,
        )))
    }
}

/// Builds the router serving both login phases.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::authenticate))
        .route("/auth", get(routes::authenticate))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Opens the reverse-lookup cache configured for `groups`.
///
/// # Errors
///
/// Returns an error if the cache file exists but cannot be read.
pub fn open_cache(groups: &GroupConfig) -> Result<Arc<ReverseLookupCache>, Report<ServerError>> {
    let cache = match groups.cache_path() {
        Some(path) => ReverseLookupCache::open(path).context(ServerError::Setup {
            component: "group cache".to_string(),
        })?,
        None => ReverseLookupCache::in_memory(),
    };
    Ok(Arc::new(cache))
}

/// Serves logins until shutdown, then flushes the group cache.
///
/// # Errors
///
/// Returns an error if setup fails, the listener cannot bind, or serving
/// stops with an error.
pub async fn run(config: ServerConfig) -> Result<(), Report<ServerError>> {
    let cache = open_cache(&config.groups)?;
    let state = Arc::new(AppState::from_config(&config, Arc::clone(&cache))?);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| ServerError::Bind {
            addr: config.listen_addr.clone(),
            details: e.to_string(),
        })?;

    info!("listening on http://{}", config.listen_addr);

    let served = axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;

    if let Err(report) = cache.flush() {
        error!("Failed to flush group cache: {report}");
    }

    served.map_err(|e| ServerError::Serve {
        details: e.to_string(),
    })?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LOGIN_ERROR_MESSAGE, UNEXPECTED_REQUEST_MESSAGE};
    use async_trait::async_trait;
    use axum::{
        body::{self, Body},
        extract::connect_info::MockConnectInfo,
        http::{Request, StatusCode, header},
    };
    use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
    use forum_bridge_forum::{ForumApi, ForumError, ForumUser, GroupCreation, GroupRef};
    use forum_bridge_groups::NamingStrategy;
    use forum_bridge_identity::{IdentityError, IdentityProvider, RequestContext, UserProfile};
    use forum_bridge_sso::{Attribute, SsoPayload, SsoSecret, codec};
    use tower::ServiceExt;

    const SECRET: &str = "d836444a9e4084d5b224a60c208dce14";
    const SESSION_COOKIE: &str = "crowd.token_key";

    /// Has a session for whoever presents the expected cookie.
    struct CookieIdentity {
        fail_profile: bool,
    }

    #[async_trait]
    impl IdentityProvider for CookieIdentity {
        async fn authenticate_cookie(
            &self,
            request: &RequestContext,
        ) -> Result<Option<String>, Report<IdentityError>> {
            Ok((request.cookie(SESSION_COOKIE) == Some("valid")).then(|| "jdoe".to_string()))
        }

        async fn get_user(&self, _username: &str) -> Result<UserProfile, Report<IdentityError>> {
            if self.fail_profile {
                return Err(Report::new(IdentityError::RequestFailed {
                    endpoint: "user".to_string(),
                    details: "connection refused".to_string(),
                }));
            }
            Ok(UserProfile {
                email: "jane@example.com".to_string(),
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
            })
        }

        async fn get_user_groups(
            &self,
            _username: &str,
        ) -> Result<Vec<String>, Report<IdentityError>> {
            Ok(Vec::new())
        }
    }

    struct QuietForum;

    #[async_trait]
    impl ForumApi for QuietForum {
        async fn sync_user(&self, payload: &SsoPayload) -> Result<ForumUser, Report<ForumError>> {
            Ok(ForumUser {
                username: payload
                    .text(Attribute::Username)
                    .unwrap_or_default()
                    .to_string(),
                groups: Vec::new(),
            })
        }

        async fn list_groups(&self) -> Result<Vec<GroupRef>, Report<ForumError>> {
            Ok(Vec::new())
        }

        async fn create_group(&self, _name: &str) -> Result<GroupCreation, Report<ForumError>> {
            Ok(GroupCreation::AlreadyExists)
        }

        async fn add_group_member(
            &self,
            _group_id: u64,
            _username: &str,
        ) -> Result<(), Report<ForumError>> {
            Ok(())
        }

        async fn remove_group_member(
            &self,
            _group_id: u64,
            _username: &str,
        ) -> Result<(), Report<ForumError>> {
            Ok(())
        }
    }

    fn app(fail_profile: bool) -> Router {
        let canonicalizer = GroupNameCanonicalizer::new(
            &GroupConfig::new("grp_", NamingStrategy::Long),
            Arc::new(ReverseLookupCache::in_memory()),
        )
        .expect("valid group config");
        let orchestrator = AuthOrchestrator::new(
            Arc::new(CookieIdentity { fail_profile }),
            Arc::new(QuietForum),
            canonicalizer,
            AuthSettings::new(
                SsoSecret::new(SECRET),
                "https://bridge.example.com/auth",
                "https://forum.example.com/session/sso_login",
                "https://id.example.com/login",
            ),
        );
        router(Arc::new(AppState::new(orchestrator)))
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))))
    }

    fn signed_query() -> String {
        let mut payload = SsoPayload::new(SsoSecret::new(SECRET));
        payload.set(Attribute::Nonce, "cb68251eefb5211e58c00ff1395f0c0b");
        codec::encode_signed(&payload)
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = cookie {
            builder = builder.header(header::COOKIE, format!("{SESSION_COOKIE}={value}"));
        }
        builder.body(Body::empty()).expect("request")
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf-8")
    }

    fn location(response: &axum::response::Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .expect("location header")
            .to_str()
            .expect("ascii location")
    }

    #[tokio::test]
    async fn request_without_session_redirects_to_portal() {
        let response = app(false)
            .oneshot(get(&format!("/?{}", signed_query()), None))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::FOUND);
        assert!(location(&response).starts_with("https://id.example.com/login?redirectTo="));
    }

    #[tokio::test]
    async fn request_with_session_redirects_to_forum() {
        let response = app(false)
            .oneshot(get(&format!("/auth?{}", signed_query()), Some("valid")))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::FOUND);
        assert!(
            location(&response).starts_with("https://forum.example.com/session/sso_login?sso=")
        );
    }

    #[tokio::test]
    async fn response_without_session_is_unauthorized() {
        let sso_payload = BASE64.encode(signed_query());
        let uri = format!(
            "/?{}",
            codec::query_string([("ssoPayload", sso_payload.as_str())])
        );
        let response = app(false).oneshot(get(&uri, None)).await.expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unexpected_request_is_bad_request() {
        let response = app(false)
            .oneshot(get("/?sso=only", None))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, UNEXPECTED_REQUEST_MESSAGE);
    }

    #[tokio::test]
    async fn forged_signature_gets_generic_error() {
        let uri = format!("/?sso=bm9uY2U9YWJj&sig={}", "0".repeat(64));
        let response = app(false).oneshot(get(&uri, Some("valid"))).await.expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, LOGIN_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn upstream_failure_gets_generic_error() {
        let response = app(true)
            .oneshot(get(&format!("/?{}", signed_query()), Some("valid")))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_text(response).await;
        assert_eq!(body, LOGIN_ERROR_MESSAGE);
        assert!(!body.contains("connection refused"));
    }

    #[test]
    fn open_cache_without_path_is_in_memory() {
        let cache = open_cache(&GroupConfig::new("grp_", NamingStrategy::Long)).expect("cache");
        assert!(cache.path().is_none());
    }

    #[test]
    fn open_cache_with_path_reads_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("groups.json");
        std::fs::write(&path, r#"{"grp_it": "IT"}"#).expect("seed");

        let config = GroupConfig::new("grp_", NamingStrategy::Long).with_cache_path(&path);
        let cache = open_cache(&config).expect("cache");
        assert_eq!(cache.original_name("grp_it").as_deref(), Some("IT"));
    }
}
