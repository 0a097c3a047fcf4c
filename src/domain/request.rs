use crate::domain::value::{MessageText, RawPhoneNumber, SenderId};

/// `POST /v1/sms/{to}` request.
#[derive(Debug, Clone)]
pub struct SendSms {
    to: RawPhoneNumber,
    message: MessageText,
    from: Option<SenderId>,
}

impl SendSms {
    /// Send `message` to `to` using the sender configured for the Sinch application.
    pub fn new(to: RawPhoneNumber, message: MessageText) -> Self {
        Self {
            to,
            message,
            from: None,
        }
    }

    /// Override the sender shown to the recipient.
    pub fn with_from(mut self, from: SenderId) -> Self {
        self.from = Some(from);
        self
    }

    pub fn to(&self) -> &RawPhoneNumber {
        &self.to
    }

    pub fn message(&self) -> &MessageText {
        &self.message
    }

    pub fn from(&self) -> Option<&SenderId> {
        self.from.as_ref()
    }
}
