use serde::{Deserialize, Serialize};

use crate::domain::{MessageId, SendSms, SenderId};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct SendSmsJsonBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<&'a str>,
    message: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct SendSmsJsonResponse {
    #[serde(rename = "messageId", alias = "MessageId", alias = "MessageID")]
    message_id: i64,
}

/// Serialize the request body; `from` is left out entirely when no sender is set.
pub fn encode_send_sms_body(request: &SendSms) -> Result<Vec<u8>, TransportError> {
    let body = SendSmsJsonBody {
        from: request.from().map(SenderId::as_str),
        message: request.message().as_str(),
    };
    Ok(serde_json::to_vec(&body)?)
}

pub fn decode_send_sms_json_response(json: &str) -> Result<MessageId, TransportError> {
    let parsed: SendSmsJsonResponse = serde_json::from_str(json)?;
    Ok(MessageId::new(parsed.message_id))
}
