use time::OffsetDateTime;

/// Event name carried by every valid inbound SMS callback.
pub const INCOMING_SMS_EVENT: &str = "incomingSms";

/// Structured error body returned by Sinch on non-200 responses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("[{code}] {message}")]
pub struct ApiError {
    pub code: i64,
    pub message: String,
    pub reference: Option<String>,
}

/// Endpoint type and address of a message party, e.g. `("number", "+46700000000")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub kind: String,
    pub endpoint: String,
}

/// Mobile-originated SMS delivered by the inbound callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingSms {
    pub event: String,
    pub to: Identity,
    pub from: Identity,
    pub message: String,
    /// Time Sinch received the message; `None` when the payload omits it.
    pub timestamp: Option<OffsetDateTime>,
    pub version: i32,
}

impl IncomingSms {
    /// Returns `true` when the event type is [`INCOMING_SMS_EVENT`].
    pub fn is_incoming_sms(&self) -> bool {
        self.event == INCOMING_SMS_EVENT
    }
}
