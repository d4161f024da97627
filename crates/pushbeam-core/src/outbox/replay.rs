//! Sync replay controller
//!
//! Drains the outbox when the platform signals that connectivity is believed
//! restored. Two states, Idle and Draining: a trigger that arrives while a
//! drain is in progress is coalesced into one extra pass instead of starting
//! an overlapping drain, which would race removal against resubmission.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::PushResult;
use crate::types::OutboxEntry;

use super::store::OutboxStore;

/// Fixed tag identifying "replay the outbox" among platform sync events
pub const OUTBOX_SYNC_TAG: &str = "outbox-replay";

/// Resubmission seam for the replay controller
///
/// `Ok` means the response confirmed acceptance and the entry may be removed;
/// any error leaves the entry in place for the next trigger.
#[async_trait]
pub trait ReplayTransport: Send + Sync {
    async fn resubmit(&self, entry: &OutboxEntry) -> PushResult<()>;
}

/// What handling one sync trigger did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    /// This call performed the drain
    Drained(DrainSummary),
    /// A drain was already in progress; it will run one extra pass
    Coalesced,
    /// The trigger tag did not match [`OUTBOX_SYNC_TAG`]
    Ignored,
}

/// Counters for one drain (including coalesced extra passes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainSummary {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

impl DrainSummary {
    fn absorb(&mut self, other: DrainSummary) {
        self.attempted += other.attempted;
        self.delivered += other.delivered;
        self.failed += other.failed;
    }
}

/// Idle / Draining flags; `rerun` records a coalesced trigger
#[derive(Default)]
struct DrainState {
    draining: bool,
    rerun: bool,
}

/// Replays pending outbox entries on sync triggers
pub struct ReplayController {
    store: OutboxStore,
    transport: Arc<dyn ReplayTransport>,
    state: Mutex<DrainState>,
}

impl ReplayController {
    pub fn new(store: OutboxStore, transport: Arc<dyn ReplayTransport>) -> Self {
        Self {
            store,
            transport,
            state: Mutex::new(DrainState::default()),
        }
    }

    /// Handle a platform sync event
    ///
    /// Events with unrelated tags are ignored; duplicate deliveries of the
    /// replay tag are tolerated (an empty drain is a no-op, an in-progress
    /// one coalesces).
    pub async fn on_sync_event(&self, tag: &str) -> PushResult<DrainOutcome> {
        if tag != OUTBOX_SYNC_TAG {
            debug!(tag, "Ignoring sync event with unrelated tag");
            return Ok(DrainOutcome::Ignored);
        }
        self.trigger().await
    }

    /// Start a drain, or coalesce into the one already running
    pub async fn trigger(&self) -> PushResult<DrainOutcome> {
        {
            let mut state = self.state.lock();
            if state.draining {
                debug!("Drain already in progress, coalescing trigger");
                state.rerun = true;
                return Ok(DrainOutcome::Coalesced);
            }
            state.draining = true;
        }

        let mut summary = DrainSummary::default();
        loop {
            match self.drain_once().await {
                Ok(pass) => summary.absorb(pass),
                Err(err) => {
                    let mut state = self.state.lock();
                    state.draining = false;
                    state.rerun = false;
                    return Err(err);
                }
            }

            let mut state = self.state.lock();
            if state.rerun {
                state.rerun = false;
                continue;
            }
            state.draining = false;
            break;
        }

        Ok(DrainOutcome::Drained(summary))
    }

    /// One pass: snapshot the pending set and resubmit it in enqueue order
    ///
    /// A failed entry is kept and does not block the entries behind it;
    /// entries enqueued after the snapshot wait for the next trigger.
    async fn drain_once(&self) -> PushResult<DrainSummary> {
        let pending = self.store.list_pending()?;
        let mut summary = DrainSummary::default();
        if pending.is_empty() {
            debug!("Outbox empty, nothing to replay");
            return Ok(summary);
        }

        info!(count = pending.len(), "Draining outbox");
        for entry in pending {
            summary.attempted += 1;
            match self.transport.resubmit(&entry).await {
                Ok(()) => {
                    self.store.remove(entry.id)?;
                    summary.delivered += 1;
                    debug!(id = entry.id, url = %entry.target_url, "Replayed outbox entry");
                }
                Err(err) => {
                    summary.failed += 1;
                    warn!(
                        id = entry.id,
                        url = %entry.target_url,
                        %err,
                        "Replay failed, keeping entry for next trigger"
                    );
                }
            }
        }

        Ok(summary)
    }
}
