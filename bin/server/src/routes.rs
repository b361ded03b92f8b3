//! The login route.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use forum_bridge_auth::AuthOutcome;
use forum_bridge_identity::RequestContext;
use serde::Deserialize;

use crate::app::AppState;
use crate::error::{LoginError, REJECTED_MESSAGE, UNEXPECTED_REQUEST_MESSAGE};

/// Query parameters of both login phases.
#[derive(Debug, Default, Deserialize)]
pub struct AuthQuery {
    sso: Option<String>,
    sig: Option<String>,
    #[serde(rename = "ssoPayload")]
    sso_payload: Option<String>,
}

/// Dispatches to the request phase (`sso` + `sig`) or the response phase
/// (`ssoPayload`) of a login.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    ConnectInfo(client): ConnectInfo<SocketAddr>,
    Query(query): Query<AuthQuery>,
    jar: CookieJar,
) -> Result<Response, LoginError> {
    let request = request_context(&jar, client);

    let outcome = match query {
        AuthQuery {
            sso: Some(sso),
            sig: Some(sig),
            ..
        } => {
            state
                .orchestrator
                .process_request(&sso, &sig, &request)
                .await?
        }
        AuthQuery {
            sso_payload: Some(sso_payload),
            ..
        } => {
            state
                .orchestrator
                .process_response(&sso_payload, &request)
                .await?
        }
        _ => {
            tracing::debug!(%client, "Unexpected authentication request");
            return Ok((StatusCode::BAD_REQUEST, UNEXPECTED_REQUEST_MESSAGE).into_response());
        }
    };

    Ok(outcome_response(outcome))
}

fn request_context(jar: &CookieJar, client: SocketAddr) -> RequestContext {
    let cookies = jar
        .iter()
        .map(|cookie| (cookie.name().to_string(), cookie.value().to_string()))
        .collect();
    RequestContext::new(cookies, Some(client.ip()))
}

fn outcome_response(outcome: AuthOutcome) -> Response {
    match outcome {
        AuthOutcome::LoginRequired { location } | AuthOutcome::LoggedIn { location, .. } => {
            (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
        }
        AuthOutcome::Rejected => (StatusCode::UNAUTHORIZED, REJECTED_MESSAGE).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirects_use_found() {
        let response = outcome_response(AuthOutcome::LoginRequired {
            location: "https://id.example.com/login?redirectTo=x".to_string(),
        });
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).map(|v| v.as_bytes()),
            Some(b"https://id.example.com/login?redirectTo=x".as_slice())
        );
    }

    #[test]
    fn rejected_is_unauthorized() {
        let response = outcome_response(AuthOutcome::Rejected);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::LOCATION).is_none());
    }

    #[test]
    fn request_context_carries_cookies_and_address() {
        let jar = CookieJar::new().add(axum_extra::extract::cookie::Cookie::new(
            "crowd.token_key",
            "abc123",
        ));
        let context = request_context(&jar, SocketAddr::from(([192, 0, 2, 7], 51000)));
        assert_eq!(context.cookie("crowd.token_key"), Some("abc123"));
        assert_eq!(
            context.remote_address(),
            Some(std::net::IpAddr::from([192, 0, 2, 7]))
        );
    }
}
