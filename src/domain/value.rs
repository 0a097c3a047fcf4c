use std::fmt;

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::domain::validation::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Sinch application key (public identifier, sent in the `Authorization` header).
///
/// Invariant: non-empty after trimming.
pub struct ApplicationKey(String);

impl ApplicationKey {
    /// Field name used in validation errors (`key`).
    pub const FIELD: &'static str = "key";

    /// Create a validated [`ApplicationKey`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the validated key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Standard alphabet with required padding. Non-zero trailing bits are accepted, so
/// secrets that other base64 decoders take are not rejected here.
const SECRET_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireCanonical),
);

/// Decode a base64 application secret into HMAC key bytes.
///
/// Line breaks are skipped; any other whitespace makes the secret invalid. An empty
/// input decodes to an empty key.
pub(crate) fn decode_secret(encoded: &str) -> Result<Vec<u8>, ValidationError> {
    let compact: String = encoded
        .chars()
        .filter(|ch| !matches!(ch, '\r' | '\n'))
        .collect();
    SECRET_ENGINE
        .decode(compact)
        .map_err(|_| ValidationError::InvalidSecret {
            field: ApplicationSecret::FIELD,
        })
}

#[derive(Clone)]
/// Sinch application secret.
///
/// Invariant: the provided value is non-blank and decodes as standard base64. The
/// decoded bytes are kept alongside, since they are the HMAC key for every signature.
pub struct ApplicationSecret {
    encoded: String,
    key: Vec<u8>,
}

impl ApplicationSecret {
    /// Field name used in validation errors (`secret`).
    pub const FIELD: &'static str = "secret";

    /// Create a validated [`ApplicationSecret`] from its base64 form.
    ///
    /// The value is not trimmed: surrounding spaces are a decode error, while line
    /// breaks are ignored.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let encoded = value.into();
        if encoded.trim().is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        let key = decode_secret(&encoded)?;
        Ok(Self { encoded, key })
    }

    /// Borrow the secret in the base64 form it was issued in.
    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    /// Decoded key material.
    pub fn key_bytes(&self) -> &[u8] {
        &self.key
    }
}

impl fmt::Debug for ApplicationSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationSecret")
            .field("encoded", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Sender shown to the recipient (`from`): a phone number or an alphanumeric string.
///
/// Invariant: non-empty after trimming.
pub struct SenderId(String);

impl SenderId {
    /// JSON field name used by Sinch (`from`).
    pub const FIELD: &'static str = "from";

    /// Create a validated [`SenderId`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the validated sender id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// SMS message text (`message`).
///
/// Invariant: non-empty after trimming. The original value (including whitespace) is preserved.
pub struct MessageText(String);

impl MessageText {
    /// JSON field name used by Sinch (`message`).
    pub const FIELD: &'static str = "message";

    /// Create validated message text.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(value))
    }

    /// Borrow the message text as provided.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Numeric message id assigned by Sinch when a message is accepted.
pub struct MessageId(i64);

impl MessageId {
    /// Wrap a message id.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the underlying id.
    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Recipient address as placed in the request path (`/v1/sms/{to}`).
///
/// Invariant: non-empty after trimming and free of characters that would change the URL
/// structure (`/`, `?`, `#`, whitespace). The address is sent as given, without
/// normalization.
pub struct RawPhoneNumber(String);

impl RawPhoneNumber {
    /// Field name used in validation errors (`to`).
    pub const FIELD: &'static str = "to";

    /// Create a validated raw phone number.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        if trimmed
            .chars()
            .any(|ch| matches!(ch, '/' | '?' | '#') || ch.is_whitespace())
        {
            return Err(ValidationError::InvalidPathSegment {
                field: Self::FIELD,
                input: trimmed.to_owned(),
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Raw (trimmed) value as sent to Sinch.
    pub fn raw(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Delivery status string returned by `GET /v1/sms/{id}`.
///
/// The value is preserved as-is even when it is unknown to this crate.
pub struct DeliveryStatus(String);

impl DeliveryStatus {
    /// Wrap a status string as returned by Sinch.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the status string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Map this status to a known variant, if one exists.
    pub fn known_kind(&self) -> Option<KnownDeliveryStatus> {
        KnownDeliveryStatus::from_status(&self.0)
    }

    /// Returns `true` while the message is still waiting for a delivery report.
    pub fn is_pending(&self) -> bool {
        self.known_kind() == Some(KnownDeliveryStatus::Pending)
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
/// Delivery statuses documented by Sinch.
pub enum KnownDeliveryStatus {
    Pending,
    Successful,
    Delivered,
    Faulted,
    Failed,
    Unknown,
}

impl KnownDeliveryStatus {
    /// Convert a raw status string (case-insensitive) into a known variant.
    pub fn from_status(status: &str) -> Option<Self> {
        let status = status.trim();
        Some(match status.to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "successful" => Self::Successful,
            "delivered" => Self::Delivered,
            "faulted" => Self::Faulted,
            "failed" => Self::Failed,
            "unknown" => Self::Unknown,
            _ => return None,
        })
    }
}
