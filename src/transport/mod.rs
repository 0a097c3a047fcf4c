//! Transport layer: HTTP and wire-format details (serialization/deserialization).

mod api_error;
mod check_status;
mod incoming;
mod send_sms;

pub use api_error::decode_api_error_json;
pub use check_status::decode_check_status_json_response;
pub use incoming::decode_incoming_sms_json;
pub use send_sms::{decode_send_sms_json_response, encode_send_sms_body};
