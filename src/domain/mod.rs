//! Domain layer: strong types with validation and invariants (no I/O).

mod request;
mod response;
mod validation;
mod value;

pub use request::SendSms;
pub use response::{ApiError, INCOMING_SMS_EVENT, Identity, IncomingSms};
pub use validation::ValidationError;
pub use value::{
    ApplicationKey, ApplicationSecret, DeliveryStatus, KnownDeliveryStatus, MessageId,
    MessageText, RawPhoneNumber, SenderId,
};
pub(crate) use value::decode_secret;
