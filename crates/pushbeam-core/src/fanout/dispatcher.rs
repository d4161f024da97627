//! Fan-out dispatcher
//!
//! Delivery for one notify call runs inside a detached task that the caller
//! awaits: if the HTTP caller disconnects mid-broadcast, in-flight sends
//! still run to completion and pruning is never skipped. Inside the task a
//! bounded worker pool drains the target set, so a broadcast to many
//! recipients cannot spawn unbounded work.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{PushError, PushResult};
use crate::registry::SubscriptionRegistry;
use crate::types::{
    DeliveryOutcome, EndpointOutcome, FanoutReport, Identity, NotificationPayload,
    PushSubscription,
};

use super::provider::{PushProvider, SendFailure};

/// Tuning knobs for one dispatcher instance
#[derive(Debug, Clone)]
pub struct FanoutConfig {
    /// Concurrency ceiling: number of delivery workers per notify call
    pub max_in_flight: usize,
    /// Per-send timeout; an attempt that outlives it fails transient
    pub send_timeout: Duration,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 16,
            send_timeout: Duration::from_secs(10),
        }
    }
}

/// Concurrent notification dispatcher over a registry and a provider
pub struct Dispatcher {
    registry: Arc<SubscriptionRegistry>,
    provider: Arc<dyn PushProvider>,
    config: FanoutConfig,
}

impl Dispatcher {
    /// Create a dispatcher with default tuning
    pub fn new(registry: Arc<SubscriptionRegistry>, provider: Arc<dyn PushProvider>) -> Self {
        Self::with_config(registry, provider, FanoutConfig::default())
    }

    /// Create a dispatcher with explicit tuning
    pub fn with_config(
        registry: Arc<SubscriptionRegistry>,
        provider: Arc<dyn PushProvider>,
        config: FanoutConfig,
    ) -> Self {
        Self {
            registry,
            provider,
            config,
        }
    }

    /// Broadcast one message to every subscription in the registry
    ///
    /// Fails with [`PushError::NoRecipients`] before any delivery attempt
    /// when the registry is empty system-wide. Individual endpoint failures
    /// never fail the call; they are entries in the report.
    pub async fn notify_all(&self, payload: &NotificationPayload) -> PushResult<FanoutReport> {
        let targets = self.registry.list_all()?;
        if targets.is_empty() {
            return Err(PushError::NoRecipients);
        }

        info!(recipients = targets.len(), title = %payload.title, "Broadcasting notification");
        self.run_fanout(targets, payload).await
    }

    /// Deliver one message to every endpoint of one user
    ///
    /// Fails with [`PushError::UserNotFound`] or
    /// [`PushError::NoSubscriptions`] before any delivery attempt.
    pub async fn notify_user(
        &self,
        identity: &Identity,
        payload: &NotificationPayload,
    ) -> PushResult<FanoutReport> {
        let subscriptions = self.registry.list_for_user(identity)?;
        let targets: Vec<(Identity, PushSubscription)> = subscriptions
            .into_iter()
            .map(|s| (identity.clone(), s))
            .collect();

        info!(%identity, endpoints = targets.len(), title = %payload.title, "Notifying user");
        self.run_fanout(targets, payload).await
    }

    /// Run the delivery loop in a detached task and wait for it
    ///
    /// The spawn is what guarantees there is no cancellation of in-flight
    /// deliveries: dropping the future returned by a notify call does not
    /// abort the fan-out or the pruning it performs.
    async fn run_fanout(
        &self,
        targets: Vec<(Identity, PushSubscription)>,
        payload: &NotificationPayload,
    ) -> PushResult<FanoutReport> {
        let payload_bytes = payload.to_bytes()?;
        let handle = tokio::spawn(run_workers(
            self.registry.clone(),
            self.provider.clone(),
            self.config.clone(),
            targets,
            payload_bytes,
        ));

        let outcomes = handle
            .await
            .map_err(|e| PushError::Fanout(format!("fanout task failed: {e}")))?;
        Ok(FanoutReport::from_outcomes(outcomes))
    }
}

/// Drain the target set through a bounded pool of delivery workers
async fn run_workers(
    registry: Arc<SubscriptionRegistry>,
    provider: Arc<dyn PushProvider>,
    config: FanoutConfig,
    targets: Vec<(Identity, PushSubscription)>,
    payload: Vec<u8>,
) -> Vec<EndpointOutcome> {
    let total = targets.len();
    let worker_count = config.max_in_flight.max(1).min(total);

    // Pre-fill the work channel, then let workers compete for entries.
    let (target_tx, target_rx) = mpsc::channel(total.max(1));
    for target in targets {
        // Capacity equals the target count, so this never blocks.
        let _ = target_tx.send(target).await;
    }
    drop(target_tx);
    let shared_rx = Arc::new(tokio::sync::Mutex::new(target_rx));

    let (report_tx, mut report_rx) = mpsc::channel(total.max(1));
    let mut workers = Vec::with_capacity(worker_count);
    for _ in 0..worker_count {
        workers.push(tokio::spawn(delivery_worker(
            shared_rx.clone(),
            report_tx.clone(),
            registry.clone(),
            provider.clone(),
            payload.clone(),
            config.send_timeout,
        )));
    }
    drop(report_tx);

    let mut outcomes = Vec::with_capacity(total);
    while let Some(outcome) = report_rx.recv().await {
        outcomes.push(outcome);
    }
    for worker in workers {
        let _ = worker.await;
    }

    outcomes
}

/// One delivery worker: pull targets until the channel drains
async fn delivery_worker(
    targets: Arc<tokio::sync::Mutex<mpsc::Receiver<(Identity, PushSubscription)>>>,
    report_tx: mpsc::Sender<EndpointOutcome>,
    registry: Arc<SubscriptionRegistry>,
    provider: Arc<dyn PushProvider>,
    payload: Vec<u8>,
    send_timeout: Duration,
) {
    loop {
        let next = { targets.lock().await.recv().await };
        let Some((identity, subscription)) = next else {
            break;
        };

        let outcome = deliver_one(
            &registry,
            provider.as_ref(),
            identity,
            subscription,
            &payload,
            send_timeout,
        )
        .await;

        if report_tx.send(outcome).await.is_err() {
            break;
        }
    }
}

/// Attempt one delivery and classify the result
async fn deliver_one(
    registry: &SubscriptionRegistry,
    provider: &dyn PushProvider,
    identity: Identity,
    subscription: PushSubscription,
    payload: &[u8],
    send_timeout: Duration,
) -> EndpointOutcome {
    let endpoint = subscription.endpoint.clone();
    let result = tokio::time::timeout(send_timeout, provider.send(&subscription, payload)).await;

    let outcome = match result {
        Ok(Ok(())) => {
            debug!(%identity, %endpoint, "Delivered");
            DeliveryOutcome::Delivered
        }
        Ok(Err(SendFailure::Gone { status })) => {
            info!(%identity, %endpoint, status, "Endpoint gone, pruning");
            if let Err(err) = registry.prune(&identity, &endpoint).await {
                // The endpoint stays in the registry; the next notify will
                // hit Gone again and retry the prune.
                warn!(%identity, %endpoint, %err, "Failed to prune dead endpoint");
            }
            DeliveryOutcome::PermanentFailure { code: status }
        }
        Ok(Err(SendFailure::Transient { reason })) => {
            warn!(%identity, %endpoint, %reason, "Delivery failed, endpoint retained");
            DeliveryOutcome::TransientFailure { reason }
        }
        Err(_) => {
            warn!(%identity, %endpoint, "Delivery timed out");
            DeliveryOutcome::TransientFailure {
                reason: "send timed out".to_string(),
            }
        }
    };

    EndpointOutcome {
        identity,
        endpoint,
        outcome,
    }
}
