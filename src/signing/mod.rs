//! Request signing: canonical string construction and HMAC-SHA256 signatures.
//!
//! The same algorithm authenticates outbound API calls and validates inbound
//! callbacks, so both sides go through [`CanonicalRequest`].
//!
//! ```text
//! StringToSign = METHOD \n
//!                Base64(MD5(body)) \n      (empty for an empty body)
//!                Content-Type \n
//!                "x-timestamp:" X-Timestamp \n
//!                path
//! Signature    = Base64(HMAC-SHA256(Base64Decode(secret), StringToSign))
//! ```

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::domain::{ApplicationKey, ApplicationSecret, ValidationError, decode_secret};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the request timestamp that takes part in the signature.
pub const TIMESTAMP_HEADER: &str = "x-timestamp";

/// Scheme prefix of the `Authorization` header value.
pub const AUTHORIZATION_SCHEME: &str = "Application";

/// Inputs of one signature. Only these fields take part; query strings and other
/// headers never do.
#[derive(Debug, Clone, Copy)]
pub struct CanonicalRequest<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub content_type: &'a str,
    pub timestamp: &'a str,
    pub body: &'a [u8],
}

impl CanonicalRequest<'_> {
    /// Base64 of the MD5 digest of the raw body, or an empty string for an empty body.
    pub fn body_hash(&self) -> String {
        if self.body.is_empty() {
            return String::new();
        }
        STANDARD.encode(Md5::digest(self.body))
    }

    /// The newline-joined string that is actually signed.
    pub fn string_to_sign(&self) -> String {
        [
            self.method.to_ascii_uppercase(),
            self.body_hash(),
            self.content_type.to_owned(),
            format!("{TIMESTAMP_HEADER}:{}", self.timestamp),
            self.path.to_owned(),
        ]
        .join("\n")
    }

    /// Compute the signature with the decoded application secret.
    pub fn sign(&self, secret: &ApplicationSecret) -> Result<Signature, ValidationError> {
        self.sign_with_key(secret.key_bytes())
    }

    fn sign_with_key(&self, key: &[u8]) -> Result<Signature, ValidationError> {
        let mut mac = HmacSha256::new_from_slice(key).map_err(|_| {
            ValidationError::InvalidSecret {
                field: ApplicationSecret::FIELD,
            }
        })?;
        mac.update(self.string_to_sign().as_bytes());
        Ok(Signature(STANDARD.encode(mac.finalize().into_bytes())))
    }
}

/// Base64-encoded HMAC-SHA256 digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(String);

impl Signature {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sign a request given the secret in its issued base64 form.
///
/// Fails with [`ValidationError::InvalidSecret`] only when the secret does not decode.
/// Unlike [`ApplicationSecret::new`], an empty secret is accepted and signs with an
/// empty key.
pub fn sign(
    method: &str,
    path: &str,
    content_type: &str,
    timestamp: &str,
    body: &[u8],
    secret_base64: &str,
) -> Result<String, ValidationError> {
    let key = decode_secret(secret_base64)?;
    let signature = CanonicalRequest {
        method,
        path,
        content_type,
        timestamp,
        body,
    }
    .sign_with_key(&key)?;
    Ok(signature.0)
}

/// Format an instant the way `X-Timestamp` carries it: RFC3339 in UTC, whole seconds.
pub fn format_timestamp(at: OffsetDateTime) -> Result<String, time::error::Format> {
    at.to_offset(UtcOffset::UTC)
        .format(format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z"))
}

/// A fresh `X-Timestamp` value for an outbound request.
pub fn format_timestamp_now() -> Result<String, time::error::Format> {
    format_timestamp(OffsetDateTime::now_utc())
}

/// `Application {key}:{signature}`.
pub fn authorization_header(key: &ApplicationKey, signature: &Signature) -> String {
    format!("{AUTHORIZATION_SCHEME} {}:{}", key.as_str(), signature.as_str())
}

/// Compare two `Authorization` values without leaking the position of the first mismatch.
pub fn verify_authorization(expected: &str, presented: &str) -> bool {
    expected.as_bytes().ct_eq(presented.as_bytes()).into()
}
