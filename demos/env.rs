// Shared by every demo binary; not each one uses every helper.
#![allow(dead_code)]

use std::io;

use tracing_subscriber::EnvFilter;

pub fn required(name: &str) -> Result<String, io::Error> {
    std::env::var(name).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{name} environment variable is required"),
        )
    })
}

pub fn optional(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_owned())
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sinch_sms=debug")),
        )
        .init();
}

pub fn credentials() -> Result<sinch_sms::Credentials, Box<dyn std::error::Error>> {
    Ok(sinch_sms::Credentials::new(
        required("SINCH_KEY")?,
        required("SINCH_SECRET")?,
    )?)
}

pub fn client() -> Result<sinch_sms::SinchClient, Box<dyn std::error::Error>> {
    let mut builder = sinch_sms::SinchClient::builder(credentials()?);
    if let Ok(base_url) = std::env::var("SINCH_BASE_URL") {
        builder = builder.base_url(base_url);
    }
    Ok(builder.build()?)
}
