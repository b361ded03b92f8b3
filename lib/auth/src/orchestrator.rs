//! The two-phase login flow.

use std::collections::BTreeSet;
use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use forum_bridge_forum::ForumApi;
use forum_bridge_groups::{GroupNameCanonicalizer, GroupSynchronizer};
use forum_bridge_identity::{IdentityProvider, RequestContext};
use forum_bridge_sso::{SignedPayload, SsoError, SsoPayload, SsoSecret, codec};
use rootcause::prelude::{Report, ResultExt};
use tracing::{info, instrument, warn};

use crate::error::AuthError;
use crate::outcome::AuthOutcome;
use crate::profile::{apply_profile, strip_privileges};

/// Query key carrying the verified payload through the identity provider's
/// login page.
pub const SSO_PAYLOAD_KEY: &str = "ssoPayload";

/// Query key the identity provider's login page redirects back to.
const REDIRECT_TO_KEY: &str = "redirectTo";

/// Secret and URLs the login flow needs.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    secret: SsoSecret,
    /// Where this service is reachable, for the return from the login page.
    public_url: String,
    /// The forum's SSO callback.
    callback_url: String,
    /// The identity provider's login page.
    login_url: String,
}

impl AuthSettings {
    #[must_use]
    pub fn new(
        secret: SsoSecret,
        public_url: impl Into<String>,
        callback_url: impl Into<String>,
        login_url: impl Into<String>,
    ) -> Self {
        Self {
            secret,
            public_url: public_url.into(),
            callback_url: callback_url.into(),
            login_url: login_url.into(),
        }
    }
}

/// Runs logins against the identity provider and the forum.
pub struct AuthOrchestrator {
    identity: Arc<dyn IdentityProvider>,
    forum: Arc<dyn ForumApi>,
    canonicalizer: GroupNameCanonicalizer,
    settings: AuthSettings,
}

impl AuthOrchestrator {
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        forum: Arc<dyn ForumApi>,
        canonicalizer: GroupNameCanonicalizer,
        settings: AuthSettings,
    ) -> Self {
        Self {
            identity,
            forum,
            canonicalizer,
            settings,
        }
    }

    /// Handles the forum's redirect carrying a signed `sso`/`sig` pair.
    ///
    /// Logs the user in if the identity provider already has a session for
    /// them, and otherwise redirects to the login page with the verified
    /// payload attached so the flow can resume afterwards.
    ///
    /// # Errors
    ///
    /// Fails on a malformed or forged payload and on any identity-provider
    /// or forum error.
    #[instrument(skip_all, fields(client = ?request.remote_address()))]
    pub async fn process_request(
        &self,
        sso: &str,
        sig: &str,
        request: &RequestContext,
    ) -> Result<AuthOutcome, Report<AuthError>> {
        info!("Received authentication request");

        let raw = SignedPayload {
            sso: sso.to_string(),
            sig: sig.to_string(),
        }
        .to_query();
        let payload =
            codec::parse_signed(&raw, &self.settings.secret).context(AuthError::InvalidPayload)?;

        if let Some(username) = self.session_user(request).await? {
            return self.login_user(&username, payload).await;
        }

        let resumable = BASE64.encode(codec::encode_signed(&payload));
        let return_url = with_query(
            &self.settings.public_url,
            &codec::query_string([(SSO_PAYLOAD_KEY, resumable.as_str())]),
        );
        let location = with_query(
            &self.settings.login_url,
            &codec::query_string([(REDIRECT_TO_KEY, return_url.as_str())]),
        );

        info!("Redirecting to authentication portal");
        Ok(AuthOutcome::LoginRequired { location })
    }

    /// Handles the return from the identity provider's login page.
    ///
    /// # Errors
    ///
    /// Fails on a malformed or forged payload and on any identity-provider
    /// or forum error.
    #[instrument(skip_all, fields(client = ?request.remote_address()))]
    pub async fn process_response(
        &self,
        sso_payload: &str,
        request: &RequestContext,
    ) -> Result<AuthOutcome, Report<AuthError>> {
        info!("Received authentication response");

        let raw = decode_sso_payload(sso_payload).context(AuthError::InvalidPayload)?;
        let payload =
            codec::parse_signed(&raw, &self.settings.secret).context(AuthError::InvalidPayload)?;

        match self.session_user(request).await? {
            Some(username) => self.login_user(&username, payload).await,
            None => {
                warn!("Authentication failed, no identity provider session");
                Ok(AuthOutcome::Rejected)
            }
        }
    }

    async fn session_user(
        &self,
        request: &RequestContext,
    ) -> Result<Option<String>, Report<AuthError>> {
        self.identity
            .authenticate_cookie(request)
            .await
            .context(AuthError::SessionLookup)
    }

    async fn login_user(
        &self,
        username: &str,
        mut payload: SsoPayload,
    ) -> Result<AuthOutcome, Report<AuthError>> {
        let profile = self
            .identity
            .get_user(username)
            .await
            .context(AuthError::ProfileFetch {
                username: username.to_string(),
            })?;

        strip_privileges(&mut payload);
        apply_profile(&mut payload, username, &profile);

        let forum_user = self
            .forum
            .sync_user(&payload)
            .await
            .context(AuthError::UserSync {
                username: username.to_string(),
            })?;
        info!(
            username,
            forum_username = %forum_user.username,
            "Authenticated user to forum"
        );

        let identity_groups = self
            .identity
            .get_user_groups(username)
            .await
            .context(AuthError::GroupLookup {
                username: username.to_string(),
            })?;
        let desired: BTreeSet<String> = identity_groups
            .iter()
            .map(|group| self.canonicalizer.canonicalize(group))
            .collect();

        let mut synchronizer =
            GroupSynchronizer::new(self.forum.as_ref(), self.canonicalizer.prefix());
        let current = synchronizer.filter_managed(forum_user.group_names());
        let report = synchronizer
            .reconcile(&forum_user.username, &desired, &current)
            .await;

        for failure in &report.failures {
            warn!(
                forum_username = %forum_user.username,
                group = %failure.group,
                operation = %failure.operation,
                error = %failure.message,
                "Group membership change failed"
            );
        }

        let location = with_query(&self.settings.callback_url, &codec::encode_signed(&payload));
        Ok(AuthOutcome::LoggedIn {
            location,
            forum_username: forum_user.username,
        })
    }
}

fn decode_sso_payload(sso_payload: &str) -> Result<String, Report<SsoError>> {
    let bytes = BASE64
        .decode(sso_payload.trim())
        .map_err(|e| SsoError::MalformedPayload {
            reason: format!("{SSO_PAYLOAD_KEY} is not base64: {e}"),
        })?;
    Ok(String::from_utf8(bytes).map_err(|e| SsoError::MalformedPayload {
        reason: format!("{SSO_PAYLOAD_KEY} is not UTF-8: {e}"),
    })?)
}

/// Appends `query` to `base`, which may already carry a query string.
fn with_query(base: &str, query: &str) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}{query}")
}
