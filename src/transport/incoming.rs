use serde::Deserialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::domain::{Identity, IncomingSms};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid timestamp {value:?}: {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: time::error::Parse,
    },
}

#[derive(Debug, Clone, Deserialize)]
struct IncomingSmsJson {
    #[serde(default)]
    event: String,
    #[serde(default)]
    to: IdentityJson,
    #[serde(default)]
    from: IdentityJson,
    #[serde(default)]
    message: String,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    version: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct IdentityJson {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    endpoint: String,
}

impl From<IdentityJson> for Identity {
    fn from(value: IdentityJson) -> Self {
        Self {
            kind: value.kind,
            endpoint: value.endpoint,
        }
    }
}

/// Decode an inbound callback body. The event type is not checked here.
pub fn decode_incoming_sms_json(body: &[u8]) -> Result<IncomingSms, TransportError> {
    let parsed: IncomingSmsJson = serde_json::from_slice(body)?;
    let timestamp = parsed
        .timestamp
        .map(|value| {
            OffsetDateTime::parse(&value, &Rfc3339)
                .map_err(|source| TransportError::InvalidTimestamp { value, source })
        })
        .transpose()?;

    Ok(IncomingSms {
        event: parsed.event,
        to: parsed.to.into(),
        from: parsed.from.into(),
        message: parsed.message,
        timestamp,
        version: parsed.version,
    })
}
