use axum::http::header::CONTENT_TYPE;
use axum::routing::get;
use prometheus::{Encoder, Registry, TextEncoder};
use sinch_sms::{SmsMetrics, WebhookReceiver};

mod env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env::init_tracing();

    let listen = env::optional("SINCH_LISTEN", "0.0.0.0:8080");
    let path = env::optional("SINCH_WEBHOOK_PATH", "/incoming");

    let registry = Registry::new();
    let metrics = SmsMetrics::new()?;
    metrics.register(&registry)?;

    let receiver = WebhookReceiver::builder(env::credentials()?)
        .metrics(metrics)
        .on_message(|sms| {
            tracing::info!(
                from = %sms.from.endpoint,
                to = %sms.to.endpoint,
                timestamp = ?sms.timestamp,
                message = %sms.message,
                "incoming SMS"
            );
        })
        .build();

    let app = sinch_sms::webhook::axum::router(receiver, &path).route(
        "/metrics",
        get(move || {
            let registry = registry.clone();
            async move { render_metrics(&registry) }
        }),
    );
    let listener = tokio::net::TcpListener::bind(&listen).await?;
    tracing::info!(%listen, %path, "listening for Sinch callbacks");
    axum::serve(listener, app).await?;

    Ok(())
}

fn render_metrics(registry: &Registry) -> ([(axum::http::HeaderName, &'static str); 1], String) {
    let mut buffer = Vec::new();
    if let Err(err) = TextEncoder::new().encode(&registry.gather(), &mut buffer) {
        tracing::error!(%err, "failed to encode metrics");
    }
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        String::from_utf8_lossy(&buffer).into_owned(),
    )
}
