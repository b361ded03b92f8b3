//! The closed set of SSO attributes and their typed values.

use std::fmt;
use std::str::FromStr;

use rootcause::Report;

use crate::error::SsoError;

/// A fixed SSO payload attribute.
///
/// Variants are declared in wire order; the derived `Ord` is what keeps
/// serialization stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Attribute {
    Nonce,
    Name,
    Username,
    Email,
    AvatarUrl,
    AvatarForceUpdate,
    AboutMe,
    ExternalId,
    ReturnSsoUrl,
    Admin,
    Moderator,
}

impl Attribute {
    /// All attributes in wire order.
    pub const ALL: [Attribute; 11] = [
        Self::Nonce,
        Self::Name,
        Self::Username,
        Self::Email,
        Self::AvatarUrl,
        Self::AvatarForceUpdate,
        Self::AboutMe,
        Self::ExternalId,
        Self::ReturnSsoUrl,
        Self::Admin,
        Self::Moderator,
    ];

    /// Returns the wire name of the attribute.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nonce => "nonce",
            Self::Name => "name",
            Self::Username => "username",
            Self::Email => "email",
            Self::AvatarUrl => "avatar_url",
            Self::AvatarForceUpdate => "avatar_force_update",
            Self::AboutMe => "about_me",
            Self::ExternalId => "external_id",
            Self::ReturnSsoUrl => "return_sso_url",
            Self::Admin => "admin",
            Self::Moderator => "moderator",
        }
    }

    /// Returns true for attributes carried as `"true"`/`"false"` on the wire.
    #[must_use]
    pub fn is_flag(&self) -> bool {
        matches!(self, Self::AvatarForceUpdate | Self::Admin | Self::Moderator)
    }

    /// Looks up an attribute by its wire name.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|attribute| attribute.as_str() == key)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Attribute {
    type Err = Report<SsoError>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| {
            SsoError::InvalidAttribute { key: s.to_string() }.into()
        })
    }
}

/// The value of a present attribute. Absence is modelled as `None` by the
/// payload, never as a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Text(String),
    Flag(bool),
}

impl AttributeValue {
    /// Decodes a raw transport string for `attribute`.
    ///
    /// Flag attributes only accept the exact strings `"true"` and `"false"`;
    /// anything else is unrecognized and yields `None`, which the payload
    /// treats as an absent attribute.
    #[must_use]
    pub fn decode(attribute: Attribute, raw: &str) -> Option<Self> {
        if !attribute.is_flag() {
            return Some(Self::Text(raw.to_string()));
        }

        match raw {
            "true" => Some(Self::Flag(true)),
            "false" => Some(Self::Flag(false)),
            _ => None,
        }
    }

    /// Fits the value to the kind `attribute` carries.
    ///
    /// Text for a flag attribute is decoded like a transport value, so an
    /// unrecognized string yields `None`. A flag for a text attribute becomes
    /// its literal.
    #[must_use]
    pub fn coerce(self, attribute: Attribute) -> Option<Self> {
        match (attribute.is_flag(), self) {
            (true, Self::Text(raw)) => Self::decode(attribute, &raw),
            (false, flag @ Self::Flag(_)) => Some(Self::Text(flag.to_transport().to_string())),
            (_, value) => Some(value),
        }
    }

    /// Renders the value as it travels on the wire.
    #[must_use]
    pub fn to_transport(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Flag(true) => "true",
            Self::Flag(false) => "false",
        }
    }

    /// Returns the text, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Flag(_) => None,
        }
    }

    /// Returns the flag, if this is a boolean value.
    #[must_use]
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(flag) => Some(*flag),
            Self::Text(_) => None,
        }
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        Self::Flag(b)
    }
}
