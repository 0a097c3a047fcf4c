//! Inbound SMS callbacks.
//!
//! When a mobile-originated SMS reaches a Sinch number, Sinch POSTs a JSON event to the
//! callback URL configured for the application. [`WebhookReceiver`] validates that request
//! (method, content type, payload, event type, signature, timestamp age) and hands the
//! parsed [`IncomingSms`] to the registered handler.
//!
//! The receiver is framework-agnostic; the `axum` feature adds a ready-made router.

#[cfg(feature = "axum")]
pub mod axum;

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use http::{Method, StatusCode};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::client::Credentials;
use crate::domain::IncomingSms;
use crate::metrics::SmsMetrics;
use crate::signing::{self, CanonicalRequest, TIMESTAMP_HEADER};

const DEFAULT_TIMESTAMP_TOLERANCE: Duration = Duration::from_secs(5 * 60);
const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Callback invoked with every accepted message.
pub type MessageHandler = Arc<dyn Fn(IncomingSms) + Send + Sync>;

#[derive(Debug, thiserror::Error)]
/// Reasons an inbound callback is rejected. Nothing is dispatched for a rejected request.
pub enum WebhookRejection {
    #[error("Method Not Allowed")]
    MethodNotAllowed { method: String },

    #[error("unsupported content type: {content_type:?}")]
    UnsupportedContentType { content_type: String },

    #[error("request body could not be read: {reason}")]
    UnreadableBody { reason: String },

    #[error("invalid payload: {0}")]
    InvalidPayload(#[source] Box<dyn StdError + Send + Sync>),

    #[error("not an 'incomingSms' event: {event:?}")]
    UnexpectedEvent { event: String },

    #[error("Bad signature")]
    BadSignature,

    #[error("stale or missing timestamp: {timestamp:?}")]
    StaleTimestamp { timestamp: String },
}

impl WebhookRejection {
    /// HTTP status answered for this rejection.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Framework-agnostic HTTP answer to a callback request.
#[derive(Debug, Clone)]
pub struct WebhookResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl WebhookResponse {
    fn accepted() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            headers: HeaderMap::new(),
            body: String::new(),
        }
    }
}

impl From<WebhookRejection> for WebhookResponse {
    fn from(rejection: WebhookRejection) -> Self {
        let mut headers = HeaderMap::new();
        if matches!(rejection, WebhookRejection::MethodNotAllowed { .. }) {
            headers.insert(
                HeaderName::from_static("allowed"),
                HeaderValue::from_static("POST"),
            );
        }
        Self {
            status: rejection.status(),
            headers,
            body: rejection.to_string(),
        }
    }
}

/// Builder for [`WebhookReceiver`].
#[derive(Clone)]
pub struct WebhookReceiverBuilder {
    credentials: Credentials,
    on_message: Option<MessageHandler>,
    timestamp_tolerance: Option<Duration>,
    body_limit: usize,
    metrics: Option<SmsMetrics>,
}

impl WebhookReceiverBuilder {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            on_message: None,
            timestamp_tolerance: Some(DEFAULT_TIMESTAMP_TOLERANCE),
            body_limit: DEFAULT_BODY_LIMIT,
            metrics: None,
        }
    }

    /// Register the handler for accepted messages.
    ///
    /// The handler runs before the response is written, so slow work should be moved off
    /// the request path (e.g. onto a channel).
    pub fn on_message<F>(mut self, handler: F) -> Self
    where
        F: Fn(IncomingSms) + Send + Sync + 'static,
    {
        self.on_message = Some(Arc::new(handler));
        self
    }

    /// Maximum allowed distance between `X-Timestamp` and the local clock (default 5 minutes).
    ///
    /// `None` turns the check off; the timestamp is then only protected by the signature.
    pub fn timestamp_tolerance(mut self, tolerance: Option<Duration>) -> Self {
        self.timestamp_tolerance = tolerance;
        self
    }

    /// Maximum body size read by the framework adapters (default 1 MiB).
    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Count POST callbacks in `metrics`, whether or not they are accepted.
    pub fn metrics(mut self, metrics: SmsMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> WebhookReceiver {
        WebhookReceiver {
            credentials: self.credentials,
            on_message: self.on_message,
            timestamp_tolerance: self.timestamp_tolerance,
            body_limit: self.body_limit,
            metrics: self.metrics,
        }
    }
}

/// Validates inbound callbacks and dispatches accepted messages.
///
/// Holds only read-only configuration; one instance can serve concurrent requests.
#[derive(Clone)]
pub struct WebhookReceiver {
    credentials: Credentials,
    on_message: Option<MessageHandler>,
    timestamp_tolerance: Option<Duration>,
    body_limit: usize,
    metrics: Option<SmsMetrics>,
}

impl fmt::Debug for WebhookReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookReceiver")
            .field("key", &self.credentials.key())
            .field("has_handler", &self.on_message.is_some())
            .field("timestamp_tolerance", &self.timestamp_tolerance)
            .field("body_limit", &self.body_limit)
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl WebhookReceiver {
    /// Receiver with default settings and no handler: valid messages are accepted and dropped.
    pub fn new(credentials: Credentials) -> Self {
        WebhookReceiverBuilder::new(credentials).build()
    }

    pub fn builder(credentials: Credentials) -> WebhookReceiverBuilder {
        WebhookReceiverBuilder::new(credentials)
    }

    pub fn body_limit(&self) -> usize {
        self.body_limit
    }

    pub fn metrics(&self) -> Option<&SmsMetrics> {
        self.metrics.as_ref()
    }

    /// Checks that only need the request head: method and content type.
    pub fn check_head(&self, method: &Method, headers: &HeaderMap) -> Result<(), WebhookRejection> {
        if *method != Method::POST {
            return Err(WebhookRejection::MethodNotAllowed {
                method: method.to_string(),
            });
        }

        let content_type = header_str(headers, CONTENT_TYPE.as_str());
        if !content_type.starts_with("application/json") {
            return Err(WebhookRejection::UnsupportedContentType {
                content_type: content_type.to_owned(),
            });
        }
        Ok(())
    }

    /// Run every check on a fully read request without dispatching it.
    pub fn verify(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<IncomingSms, WebhookRejection> {
        self.verify_at(method, path, headers, body, OffsetDateTime::now_utc())
    }

    fn verify_at(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        body: &[u8],
        now: OffsetDateTime,
    ) -> Result<IncomingSms, WebhookRejection> {
        self.check_head(method, headers)?;

        let sms = crate::transport::decode_incoming_sms_json(body)
            .map_err(|err| WebhookRejection::InvalidPayload(Box::new(err)))?;
        if !sms.is_incoming_sms() {
            return Err(WebhookRejection::UnexpectedEvent { event: sms.event });
        }

        let timestamp = header_str(headers, TIMESTAMP_HEADER);
        let expected = self
            .credentials
            .authorization(&CanonicalRequest {
                method: Method::POST.as_str(),
                path,
                content_type: header_str(headers, CONTENT_TYPE.as_str()),
                timestamp,
                body,
            })
            .map_err(|_| WebhookRejection::BadSignature)?;
        let presented = header_str(headers, AUTHORIZATION.as_str());
        if !signing::verify_authorization(&expected, presented) {
            return Err(WebhookRejection::BadSignature);
        }

        if let Some(tolerance) = self.timestamp_tolerance {
            let fresh = OffsetDateTime::parse(timestamp, &Rfc3339)
                .map(|sent| (now - sent).whole_seconds().unsigned_abs() <= tolerance.as_secs())
                .unwrap_or(false);
            if !fresh {
                return Err(WebhookRejection::StaleTimestamp {
                    timestamp: timestamp.to_owned(),
                });
            }
        }

        Ok(sms)
    }

    /// Validate a fully read request, dispatch it to the handler and build the answer.
    pub fn handle(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> WebhookResponse {
        self.handle_at(method, path, headers, body, OffsetDateTime::now_utc())
    }

    fn handle_at(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        body: &[u8],
        now: OffsetDateTime,
    ) -> WebhookResponse {
        match self.verify_at(method, path, headers, body, now) {
            Ok(sms) => {
                self.record_received(method);
                tracing::debug!(
                    from = %sms.from.endpoint,
                    to = %sms.to.endpoint,
                    "accepted incoming SMS"
                );
                match &self.on_message {
                    Some(handler) => handler(sms),
                    None => tracing::debug!("no message handler registered; incoming SMS dropped"),
                }
                WebhookResponse::accepted()
            }
            Err(rejection) => self.reject(method, path, rejection),
        }
    }

    /// Answer a request that failed a check, e.g. when a framework adapter could not
    /// read the body.
    pub fn reject(
        &self,
        method: &Method,
        path: &str,
        rejection: WebhookRejection,
    ) -> WebhookResponse {
        self.record_received(method);
        tracing::warn!(%method, path, reason = %rejection, "rejected incoming SMS callback");
        rejection.into()
    }

    fn record_received(&self, method: &Method) {
        if *method != Method::POST {
            return;
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_received();
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}
