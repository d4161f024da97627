//! Request capture - the interception seam in front of the outbox
//!
//! Mutating requests that cannot reach the network at all (connection or
//! timeout failures, not HTTP error responses) are persisted and
//! acknowledged locally: the caller sees acceptance even though delivery is
//! deferred to the next sync trigger. A server that answers with an error
//! status did receive the request, so nothing is captured in that case.

use reqwest::header::CONTENT_TYPE;
use tracing::info;

use pushbeam_core::{OutboxStore, PushError, PushResult};

/// What happened to a submitted request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitStatus {
    /// The request reached the server; status is whatever it answered
    Sent { status: u16 },
    /// Transport failure; captured into the outbox for later replay
    Queued { entry_id: u64 },
}

/// HTTP client that captures transport failures into the outbox
pub struct OfflineClient {
    http: reqwest::Client,
    outbox: OutboxStore,
}

impl OfflineClient {
    pub fn new(outbox: OutboxStore) -> Self {
        Self {
            http: reqwest::Client::new(),
            outbox,
        }
    }

    /// POST a JSON body, capturing it locally when the network is down
    pub async fn post_json(&self, url: &str, body: &serde_json::Value) -> PushResult<SubmitStatus> {
        let bytes =
            serde_json::to_vec(body).map_err(|e| PushError::Serialization(e.to_string()))?;

        match self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(bytes.clone())
            .send()
            .await
        {
            Ok(response) => Ok(SubmitStatus::Sent {
                status: response.status().as_u16(),
            }),
            // No HTTP response at all: the transport failed, not the server
            Err(err) if err.status().is_none() => {
                let entry_id = self.outbox.enqueue(url, bytes)?;
                info!(entry_id, url, "Network unreachable, request captured for replay");
                Ok(SubmitStatus::Queued { entry_id })
            }
            Err(err) => Err(PushError::Transport(err.to_string())),
        }
    }
}
