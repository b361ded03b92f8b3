//! Merging the identity provider's view of a user into an SSO payload.

use forum_bridge_identity::UserProfile;
use forum_bridge_sso::{Attribute, SsoPayload};

/// Clears the forum privilege flags.
///
/// Whoever holds the shared secret could sign a payload granting admin or
/// moderator rights, so these never pass through to the forum.
pub fn strip_privileges(payload: &mut SsoPayload) {
    payload.unset(Attribute::Admin);
    payload.unset(Attribute::Moderator);
}

/// Composes a display name from first and last name.
///
/// Some directories already store the full name in the first-name field;
/// the last name is left out when the first name already ends with it.
#[must_use]
pub fn display_name(first_name: &str, last_name: &str) -> String {
    let first = first_name.trim();
    let last = last_name.trim();

    if last.is_empty() || first.to_lowercase().ends_with(&last.to_lowercase()) {
        first.to_string()
    } else {
        format!("{first} {last}").trim().to_string()
    }
}

/// Overwrites the identity attributes of `payload` from the profile of
/// `username`.
pub fn apply_profile(payload: &mut SsoPayload, username: &str, profile: &UserProfile) {
    payload.set(Attribute::ExternalId, username);
    payload.set(Attribute::Email, profile.email.as_str());
    payload.set(Attribute::Username, profile.first_name.as_str());
    payload.set(
        Attribute::Name,
        display_name(&profile.first_name, &profile.last_name),
    );
}
