//! Signed single-sign-on payloads exchanged with the forum.
//!
//! This crate provides:
//! - The payload data model (`SsoPayload`, `Attribute`, `AttributeValue`)
//! - The signing secret wrapper (`SsoSecret`)
//! - The wire codec: HMAC-SHA256 signing, base64 + query-string encoding,
//!   and verification of inbound payloads
//!
//! # Wire format
//!
//! A signed payload travels as `sso=<base64>&sig=<hex>`. The base64 body
//! decodes to a query string of attributes; the signature is the
//! HMAC-SHA256 of the base64 text, hex encoded.
//!
//! # Example
//!
//! ```
//! use forum_bridge_sso::{Attribute, SsoPayload, SsoSecret, codec};
//!
//! let secret = SsoSecret::new("d836444a9e4084d5b224a60c208dce14");
//! let mut payload = SsoPayload::new(secret.clone());
//! payload.set(Attribute::Nonce, "cb68251eefb5211e58c00ff1395f0c0b");
//! payload.set(Attribute::Admin, false);
//!
//! let query = codec::encode_signed(&payload);
//! let parsed = codec::parse_signed(&query, &secret).expect("valid signature");
//!
//! assert_eq!(parsed.text(Attribute::Nonce), Some("cb68251eefb5211e58c00ff1395f0c0b"));
//! assert_eq!(parsed.flag(Attribute::Admin), Some(false));
//! ```

pub mod attribute;
pub mod codec;
pub mod error;
pub mod payload;

pub use attribute::{Attribute, AttributeValue};
pub use codec::SignedPayload;
pub use error::SsoError;
pub use payload::{CUSTOM_FIELD_PREFIX, PayloadKey, SsoPayload, SsoSecret};
