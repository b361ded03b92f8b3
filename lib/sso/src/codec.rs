//! Signing, verification and wire encoding of SSO payloads.
//!
//! The unsigned body is an RFC 3986 query string of the present fixed
//! attributes in wire order followed by `custom.`-prefixed fields in
//! insertion order. Flags are rendered as `"true"`/`"false"`. The body is
//! base64 encoded and signed with HMAC-SHA256 over the base64 text.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use indexmap::IndexMap;
use rootcause::Report;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::attribute::{Attribute, AttributeValue};
use crate::error::SsoError;
use crate::payload::{CUSTOM_FIELD_PREFIX, SsoPayload, SsoSecret};

type HmacSha256 = Hmac<Sha256>;

/// Query key carrying the base64 payload body.
pub const SSO_KEY: &str = "sso";

/// Query key carrying the hex signature.
pub const SIG_KEY: &str = "sig";

/// A payload body together with its signature, as carried in a query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayload {
    /// Base64 encoded payload body.
    pub sso: String,
    /// Lowercase hex HMAC-SHA256 of `sso`.
    pub sig: String,
}

impl SignedPayload {
    /// Extracts the `sso` and `sig` values from a query string.
    ///
    /// # Errors
    ///
    /// Returns `MalformedPayload` if either key is absent.
    pub fn from_query(raw: &str) -> Result<Self, Report<SsoError>> {
        let mut sso = None;
        let mut sig = None;

        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                SSO_KEY => sso = Some(value.into_owned()),
                SIG_KEY => sig = Some(value.into_owned()),
                _ => {}
            }
        }

        match (sso, sig) {
            (Some(sso), Some(sig)) => Ok(Self { sso, sig }),
            (None, _) => Err(missing(SSO_KEY)),
            (_, None) => Err(missing(SIG_KEY)),
        }
    }

    /// Renders `sso=<base64>&sig=<hex>`, percent-encoding both values.
    #[must_use]
    pub fn to_query(&self) -> String {
        query_string([(SSO_KEY, self.sso.as_str()), (SIG_KEY, self.sig.as_str())])
    }

    /// Checks the signature against `secret`.
    ///
    /// # Errors
    ///
    /// Returns `SignatureMismatch` unless the supplied signature is
    /// byte-for-byte the expected one.
    pub fn verify(&self, secret: &SsoSecret) -> Result<(), Report<SsoError>> {
        let expected = sign(&self.sso, secret);
        if bool::from(expected.as_bytes().ct_eq(self.sig.as_bytes())) {
            Ok(())
        } else {
            Err(SsoError::SignatureMismatch.into())
        }
    }
}

fn missing(key: &str) -> Report<SsoError> {
    SsoError::MalformedPayload {
        reason: format!("missing '{key}' parameter"),
    }
    .into()
}

/// Computes the hex HMAC-SHA256 of `body` under `secret`.
#[must_use]
pub fn sign(body: &str, secret: &SsoSecret) -> String {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(body.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Builds an RFC 3986 query string from ordered pairs.
///
/// Everything except unreserved characters is percent-encoded, so spaces
/// become `%20` rather than `+`.
pub fn query_string<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .into_iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Serializes the payload body without signing it.
#[must_use]
pub fn unsigned_payload(payload: &SsoPayload) -> String {
    let custom: Vec<(String, &str)> = payload
        .custom_fields()
        .map(|(name, value)| (format!("{CUSTOM_FIELD_PREFIX}{name}"), value))
        .collect();

    let mut pairs: Vec<(&str, &str)> = payload
        .attributes()
        .map(|(attribute, value)| (attribute.as_str(), value.to_transport()))
        .collect();
    pairs.extend(custom.iter().map(|(key, value)| (key.as_str(), *value)));

    query_string(pairs)
}

/// Encodes and signs the payload with its own secret.
#[must_use]
pub fn sign_payload(payload: &SsoPayload) -> SignedPayload {
    let sso = BASE64.encode(unsigned_payload(payload));
    let sig = sign(&sso, payload.secret());
    SignedPayload { sso, sig }
}

/// Encodes and signs the payload as `sso=<base64>&sig=<hex>`.
#[must_use]
pub fn encode_signed(payload: &SsoPayload) -> String {
    sign_payload(payload).to_query()
}

/// Verifies and decodes a signed query string.
///
/// The signature is checked before anything inside the body is read.
///
/// # Errors
///
/// - `MalformedPayload` if `sso`/`sig` are absent or the body is not base64
/// - `SignatureMismatch` if the signature does not match
pub fn parse_signed(raw: &str, secret: &SsoSecret) -> Result<SsoPayload, Report<SsoError>> {
    let signed = SignedPayload::from_query(raw)?;
    signed.verify(secret)?;
    decode_body(&signed.sso, secret)
}

fn decode_body(sso: &str, secret: &SsoSecret) -> Result<SsoPayload, Report<SsoError>> {
    // Some encoders wrap base64 output at 60 columns.
    let compact: String = sso.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let body = BASE64
        .decode(compact)
        .map_err(|e| SsoError::MalformedPayload {
            reason: format!("payload is not base64: {e}"),
        })?;

    // Later duplicates win, matching common query-string parsers.
    let mut fields: IndexMap<String, String> = IndexMap::new();
    for (key, value) in url::form_urlencoded::parse(&body) {
        fields.insert(key.into_owned(), value.into_owned());
    }

    let mut payload = SsoPayload::new(secret.clone());

    for attribute in Attribute::ALL {
        let Some(raw) = fields.get(attribute.as_str()) else {
            continue;
        };
        match AttributeValue::decode(attribute, raw) {
            Some(value) => payload.set(attribute, value),
            None => debug!(%attribute, "ignoring unrecognized flag value"),
        }
    }

    for (key, value) in &fields {
        if let Some(field) = key.strip_prefix(CUSTOM_FIELD_PREFIX) {
            payload.set_custom_field(field, value.as_str());
        }
    }

    Ok(payload)
}
