//! Master-key request signing.
//!
//! Every request carries an `authorization` header holding an HMAC-SHA256
//! signature over the verb, resource type, resource link and `x-ms-date`,
//! keyed with the base64-decoded account key:
//!
//! ```text
//! type=master&ver=1.0&sig=<base64(hmac(key, "{verb}\n{type}\n{link}\n{date}\n\n"))>
//! ```
//!
//! The whole token is URL-encoded. Resource tokens are sent as-is (encoded).
//!
//! # Example
//!
//! ```rust
//! use cosmos_client::pipeline::auth::{decode_master_key, master_key_token};
//!
//! let key = decode_master_key("c2VjcmV0LWtleQ==").unwrap();
//! let token = master_key_token(&key, "get", "dbs", "dbs/db1", "Tue, 01 Nov 1994 08:12:31 GMT");
//! assert!(token.starts_with("type%3Dmaster%26ver%3D1.0%26sig%3D"));
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::ConfigError;

type HmacSha256 = Hmac<Sha256>;

/// Decodes a base64 master key.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidAuthKey`] if the key is not valid base64.
pub fn decode_master_key(key: &str) -> Result<Vec<u8>, ConfigError> {
    STANDARD
        .decode(key.trim())
        .map_err(|_| ConfigError::InvalidAuthKey)
}

/// Builds the string the signature is computed over.
#[must_use]
pub fn string_to_sign(verb: &str, resource_type: &str, resource_link: &str, date: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}\n\n",
        verb.to_lowercase(),
        resource_type.to_lowercase(),
        resource_link,
        date.to_lowercase()
    )
}

/// Computes the base64 HMAC-SHA256 signature of `payload`.
#[must_use]
#[allow(clippy::missing_panics_doc)] // HMAC accepts any key size, so this never panics
pub fn compute_signature(key: &[u8], payload: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Builds the URL-encoded `authorization` header value for a master key.
#[must_use]
pub fn master_key_token(
    key: &[u8],
    verb: &str,
    resource_type: &str,
    resource_link: &str,
    date: &str,
) -> String {
    let signature = compute_signature(key, &string_to_sign(verb, resource_type, resource_link, date));
    urlencoding::encode(&format!("type=master&ver=1.0&sig={signature}")).into_owned()
}

/// Builds the URL-encoded `authorization` header value for a resource token.
#[must_use]
pub fn resource_token(token: &str) -> String {
    urlencoding::encode(token).into_owned()
}
