//! Prometheus counters for sent and received messages.
//!
//! ```rust
//! use prometheus::Registry;
//! use sinch_sms::SmsMetrics;
//!
//! let metrics = SmsMetrics::new().unwrap();
//! let registry = Registry::new();
//! metrics.register(&registry).unwrap();
//! assert_eq!(metrics.sent(), 0);
//! ```

use std::fmt;

use prometheus::{IntCounter, Opts, Registry};

/// Message counters shared by a [`SinchClient`](crate::SinchClient) and a
/// [`WebhookReceiver`](crate::WebhookReceiver).
///
/// Clones share the same counters.
#[derive(Clone)]
pub struct SmsMetrics {
    sent: IntCounter,
    received: IntCounter,
}

impl SmsMetrics {
    /// Name of the counter of messages handed to the send endpoint.
    pub const SENT: &'static str = "sinch_sms_sent_total";
    /// Name of the counter of POST callbacks that reached the receiver.
    pub const RECEIVED: &'static str = "sinch_sms_received_total";

    pub fn new() -> Result<Self, prometheus::Error> {
        Ok(Self {
            sent: IntCounter::with_opts(Opts::new(
                Self::SENT,
                "SMS messages submitted to the Sinch send endpoint",
            ))?,
            received: IntCounter::with_opts(Opts::new(
                Self::RECEIVED,
                "Inbound SMS callbacks received, including rejected ones",
            ))?,
        })
    }

    /// Register both counters; fails if the registry already holds them.
    pub fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        registry.register(Box::new(self.sent.clone()))?;
        registry.register(Box::new(self.received.clone()))?;
        Ok(())
    }

    pub fn sent(&self) -> u64 {
        self.sent.get()
    }

    pub fn received(&self) -> u64 {
        self.received.get()
    }

    pub(crate) fn record_sent(&self) {
        self.sent.inc();
    }

    pub(crate) fn record_received(&self) {
        self.received.inc();
    }
}

impl fmt::Debug for SmsMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmsMetrics")
            .field("sent", &self.sent())
            .field("received", &self.received())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use prometheus::{Encoder, TextEncoder};

    use super::*;

    #[test]
    fn counters_start_at_zero_and_are_shared_by_clones() {
        let metrics = SmsMetrics::new().unwrap();
        assert_eq!(metrics.sent(), 0);
        assert_eq!(metrics.received(), 0);

        let shared = metrics.clone();
        shared.record_sent();
        shared.record_received();
        shared.record_received();

        assert_eq!(metrics.sent(), 1);
        assert_eq!(metrics.received(), 2);
    }

    #[test]
    fn registered_counters_are_exported() {
        let metrics = SmsMetrics::new().unwrap();
        let registry = Registry::new();
        metrics.register(&registry).unwrap();
        metrics.record_sent();

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&registry.gather(), &mut buffer)
            .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("sinch_sms_sent_total 1"), "{text}");
        assert!(text.contains("sinch_sms_received_total 0"), "{text}");
    }

    #[test]
    fn registering_twice_fails() {
        let metrics = SmsMetrics::new().unwrap();
        let registry = Registry::new();
        metrics.register(&registry).unwrap();
        assert!(metrics.register(&registry).is_err());
    }
}
