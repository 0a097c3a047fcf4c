use serde::Deserialize;

use crate::domain::DeliveryStatus;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
struct CheckStatusJsonResponse {
    #[serde(alias = "Status")]
    status: String,
}

pub fn decode_check_status_json_response(json: &str) -> Result<DeliveryStatus, TransportError> {
    let parsed: CheckStatusJsonResponse = serde_json::from_str(json)?;
    Ok(DeliveryStatus::new(parsed.status))
}
