//! Replay transport over HTTP
//!
//! Resubmits captured requests with their original method shape
//! (POST url body). Acceptance is any 2xx response; anything else leaves the
//! entry in the outbox for the next trigger.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use pushbeam_core::{OutboxEntry, PushError, PushResult, ReplayTransport};

/// HTTP implementation of the replay seam
pub struct HttpReplayTransport {
    client: reqwest::Client,
}

impl HttpReplayTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpReplayTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReplayTransport for HttpReplayTransport {
    async fn resubmit(&self, entry: &OutboxEntry) -> PushResult<()> {
        let response = self
            .client
            .post(&entry.target_url)
            .header(CONTENT_TYPE, "application/json")
            .body(entry.body.clone())
            .send()
            .await
            .map_err(|e| PushError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(PushError::Transport(format!(
                "server answered {status} instead of accepting"
            )))
        }
    }
}
