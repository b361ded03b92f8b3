//! The SSO payload record and its signing secret.

use std::collections::BTreeMap;
use std::fmt;

use forum_bridge_core::Result;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::attribute::{Attribute, AttributeValue};
use crate::error::SsoError;

/// Wire prefix marking a key as a custom field.
pub const CUSTOM_FIELD_PREFIX: &str = "custom.";

/// Shared secret used to sign and verify payloads.
///
/// The secret is never printed; `Debug` is redacted.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SsoSecret(String);

impl SsoSecret {
    /// Creates a secret from its textual form.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Returns the raw key bytes for signing.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for SsoSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SsoSecret(..)")
    }
}

/// A key addressing either a fixed attribute or a custom field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadKey {
    Fixed(Attribute),
    Custom(String),
}

impl PayloadKey {
    /// Resolves a wire key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAttribute` for keys that are neither a fixed attribute
    /// nor prefixed with [`CUSTOM_FIELD_PREFIX`].
    pub fn parse(key: &str) -> Result<Self, SsoError> {
        if let Some(field) = key.strip_prefix(CUSTOM_FIELD_PREFIX) {
            return Ok(Self::Custom(field.to_string()));
        }

        Ok(Self::Fixed(key.parse()?))
    }
}

/// A single-sign-on payload bound to its signing secret.
///
/// Fixed attributes are stored in wire order. Custom fields keep insertion
/// order and are stored without their `custom.` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsoPayload {
    secret: SsoSecret,
    values: BTreeMap<Attribute, AttributeValue>,
    custom_fields: IndexMap<String, String>,
}

impl SsoPayload {
    /// Creates an empty payload signed with `secret`.
    #[must_use]
    pub fn new(secret: SsoSecret) -> Self {
        Self {
            secret,
            values: BTreeMap::new(),
            custom_fields: IndexMap::new(),
        }
    }

    /// Returns the secret this payload is signed with.
    #[must_use]
    pub fn secret(&self) -> &SsoSecret {
        &self.secret
    }

    #[must_use]
    pub fn get(&self, attribute: Attribute) -> Option<&AttributeValue> {
        self.values.get(&attribute)
    }

    /// Returns the attribute as text. Flag values are not text.
    #[must_use]
    pub fn text(&self, attribute: Attribute) -> Option<&str> {
        self.get(attribute).and_then(AttributeValue::as_text)
    }

    /// Returns the attribute as a boolean. Text values are not flags.
    #[must_use]
    pub fn flag(&self, attribute: Attribute) -> Option<bool> {
        self.get(attribute).and_then(AttributeValue::as_flag)
    }

    #[must_use]
    pub fn is_set(&self, attribute: Attribute) -> bool {
        self.values.contains_key(&attribute)
    }

    /// Sets an attribute, fitting the value to the attribute's kind.
    ///
    /// Text given for a flag attribute must be `"true"` or `"false"`; any
    /// other text leaves the attribute absent, as it would after decoding.
    pub fn set(&mut self, attribute: Attribute, value: impl Into<AttributeValue>) {
        match value.into().coerce(attribute) {
            Some(value) => {
                self.values.insert(attribute, value);
            }
            None => self.unset(attribute),
        }
    }

    /// Makes the attribute absent.
    pub fn unset(&mut self, attribute: Attribute) {
        self.values.remove(&attribute);
    }

    /// Iterates over present attributes in wire order.
    pub fn attributes(&self) -> impl Iterator<Item = (Attribute, &AttributeValue)> {
        self.values.iter().map(|(attribute, value)| (*attribute, value))
    }

    #[must_use]
    pub fn custom_field(&self, name: &str) -> Option<&str> {
        self.custom_fields.get(name).map(String::as_str)
    }

    /// Sets a custom field. `name` excludes the `custom.` prefix.
    pub fn set_custom_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.custom_fields.insert(name.into(), value.into());
    }

    /// Iterates over custom fields in insertion order.
    pub fn custom_fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.custom_fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Reads a value by wire key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAttribute` if the key is outside the fixed attributes
    /// and the custom-field namespace.
    pub fn lookup(&self, key: &str) -> Result<Option<AttributeValue>, SsoError> {
        Ok(match PayloadKey::parse(key)? {
            PayloadKey::Fixed(attribute) => self.get(attribute).cloned(),
            PayloadKey::Custom(field) => self
                .custom_field(&field)
                .map(|value| AttributeValue::Text(value.to_string())),
        })
    }

    /// Writes a raw transport value by wire key.
    ///
    /// Flag attributes go through [`AttributeValue::decode`]; an unrecognized
    /// flag value leaves the attribute absent.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAttribute` for keys outside both namespaces.
    pub fn assign(&mut self, key: &str, raw: &str) -> Result<(), SsoError> {
        match PayloadKey::parse(key)? {
            PayloadKey::Fixed(attribute) => self.set(attribute, raw),
            PayloadKey::Custom(field) => self.set_custom_field(field, raw),
        }
        Ok(())
    }

    /// Removes a value by wire key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAttribute` for keys outside both namespaces.
    pub fn remove(&mut self, key: &str) -> Result<(), SsoError> {
        match PayloadKey::parse(key)? {
            PayloadKey::Fixed(attribute) => self.unset(attribute),
            PayloadKey::Custom(field) => {
                self.custom_fields.shift_remove(&field);
            }
        }
        Ok(())
    }
}
