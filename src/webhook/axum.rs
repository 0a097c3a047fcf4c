//! axum adapter: mounts a [`WebhookReceiver`] on a route.
//!
//! ```rust,no_run
//! use sinch_sms::{Credentials, WebhookReceiver};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let receiver = WebhookReceiver::builder(Credentials::new("key", "c2VjcmV0")?)
//!     .on_message(|sms| println!("{}: {}", sms.from.endpoint, sms.message))
//!     .build();
//! let app = sinch_sms::webhook::axum::router(receiver, "/incoming");
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

use ::axum::Router;
use ::axum::body::to_bytes;
use ::axum::extract::{OriginalUri, Request, State};
use ::axum::response::{IntoResponse, Response};
use ::axum::routing::any;

use super::{WebhookReceiver, WebhookRejection, WebhookResponse};

/// Router answering every method on `path`, so non-POST requests get the 405 answer.
pub fn router(receiver: WebhookReceiver, path: &str) -> Router {
    Router::new()
        .route(path, any(incoming_sms))
        .with_state(receiver)
}

/// Handler usable in an existing router with a [`WebhookReceiver`] state.
pub async fn incoming_sms(State(receiver): State<WebhookReceiver>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    // Nested routers strip their prefix from `parts.uri`; the signature covers the full path.
    let path = parts
        .extensions
        .get::<OriginalUri>()
        .map(|uri| uri.0.path())
        .unwrap_or_else(|| parts.uri.path());

    if let Err(rejection) = receiver.check_head(&parts.method, &parts.headers) {
        return receiver
            .reject(&parts.method, path, rejection)
            .into_response();
    }

    let body = match to_bytes(body, receiver.body_limit()).await {
        Ok(body) => body,
        Err(err) => {
            let rejection = WebhookRejection::UnreadableBody {
                reason: err.to_string(),
            };
            return receiver
                .reject(&parts.method, path, rejection)
                .into_response();
        }
    };

    receiver
        .handle(&parts.method, path, &parts.headers, &body)
        .into_response()
}

impl IntoResponse for WebhookResponse {
    fn into_response(self) -> Response {
        (self.status, self.headers, self.body).into_response()
    }
}
