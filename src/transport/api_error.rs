use serde::Deserialize;

use crate::domain::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid JSON error body: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
struct ApiErrorJsonBody {
    #[serde(default, rename = "errorCode")]
    error_code: i64,
    #[serde(default, alias = "Message")]
    message: String,
    #[serde(default, alias = "Reference")]
    reference: Option<String>,
}

/// Decode the structured body Sinch sends with non-200 statuses.
///
/// Missing fields take their zero value; only a body that is not a JSON object fails.
pub fn decode_api_error_json(json: &str) -> Result<ApiError, TransportError> {
    let parsed: ApiErrorJsonBody = serde_json::from_str(json)?;
    Ok(ApiError {
        code: parsed.error_code,
        message: parsed.message,
        reference: parsed.reference.filter(|reference| !reference.is_empty()),
    })
}
