//! HTTP push provider adapter
//!
//! Treats the push service behind each endpoint as a black box: POST the
//! payload to the endpoint URL and classify the response. 404 and 410 mean
//! the endpoint is permanently gone; every other failure, including not
//! reaching the service at all, is transient. VAPID authentication against
//! the push service is deployment configuration and not handled here.

use async_trait::async_trait;
use pushbeam_core::{PushProvider, PushSubscription, SendFailure};

/// How long the push service may hold an undeliverable message (seconds)
const DEFAULT_TTL_SECS: u32 = 24 * 60 * 60;

/// Push provider that speaks plain HTTP to each endpoint
pub struct HttpPushProvider {
    client: reqwest::Client,
    ttl_secs: u32,
}

impl HttpPushProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}

impl Default for HttpPushProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PushProvider for HttpPushProvider {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> Result<(), SendFailure> {
        let response = self
            .client
            .post(&subscription.endpoint)
            .header("TTL", self.ttl_secs)
            .body(payload.to_vec())
            .send()
            .await
            .map_err(|e| SendFailure::Transient {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(SendFailure::from_status(
            status.as_u16(),
            format!("push service returned {status}"),
        ))
    }
}
