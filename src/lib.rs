//! Typed Rust client and webhook receiver for the Sinch SMS Messaging API.
//!
//! The crate keeps the same three layers throughout: a domain layer of strong types, a
//! transport layer for wire-format details, and small client/receiver layers that sign
//! every request with the application credentials (see [`signing`]).
//!
//! ```rust,no_run
//! use sinch_sms::{Credentials, SinchClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sinch_sms::SinchError> {
//!     let credentials = Credentials::new("application-key", "c2VjcmV0LWJhc2U2NA==")?;
//!     let client = SinchClient::new(credentials)?;
//!     let id = client.send("", "+46700000000", "Hello world").await?;
//!     let status = client.check_status(id).await?;
//!     println!("{id}: {status}");
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]

pub mod client;
pub mod domain;
pub mod metrics;
pub mod signing;
mod transport;
pub mod webhook;

pub use client::{Credentials, DEFAULT_USER_AGENT, SinchClient, SinchClientBuilder, SinchError};
pub use domain::{
    ApiError, ApplicationKey, ApplicationSecret, DeliveryStatus, INCOMING_SMS_EVENT, Identity,
    IncomingSms, KnownDeliveryStatus, MessageId, MessageText, RawPhoneNumber, SendSms, SenderId,
    ValidationError,
};
pub use metrics::SmsMetrics;
pub use webhook::{
    MessageHandler, WebhookReceiver, WebhookReceiverBuilder, WebhookRejection, WebhookResponse,
};
