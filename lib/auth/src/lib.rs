//! Login orchestration for the forum SSO bridge.
//!
//! A login arrives in one of two phases:
//! - Request phase: the forum redirects the browser here with a signed
//!   `sso`/`sig` pair. With a live identity-provider session the user is
//!   logged in straight away; otherwise the browser is sent to the
//!   identity provider's login page, carrying the verified payload along.
//! - Response phase: the browser comes back from the login page with that
//!   payload in `ssoPayload`, and the session is checked once more.
//!
//! Logging in overwrites the payload with the identity provider's profile,
//! synchronizes the user to the forum, reconciles managed group
//! memberships and redirects back to the forum with a re-signed payload.
//!
//! # Example
//!
//! ```
//! use forum_bridge_auth::display_name;
//!
//! assert_eq!(display_name("Jane", "Doe"), "Jane Doe");
//! assert_eq!(display_name("Jane Doe", "Doe"), "Jane Doe");
//! ```

pub mod error;
pub mod orchestrator;
pub mod outcome;
pub mod profile;

pub use error::AuthError;
pub use orchestrator::{AuthOrchestrator, AuthSettings, SSO_PAYLOAD_KEY};
pub use outcome::AuthOutcome;
pub use profile::{apply_profile, display_name, strip_privileges};
