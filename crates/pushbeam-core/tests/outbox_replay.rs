//! Outbox capture-and-replay scenarios
//!
//! Simulates the client lifecycle: requests captured while offline survive a
//! restart and drain in order once the sync trigger fires.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;

use pushbeam_core::{
    DrainOutcome, OutboxEntry, OutboxStore, PushError, PushResult, ReplayController,
    ReplayTransport, OUTBOX_SYNC_TAG,
};

/// Transport that records bodies in arrival order; optionally offline
#[derive(Default)]
struct FakeServer {
    received: Mutex<Vec<(String, Vec<u8>)>>,
    offline: Mutex<bool>,
}

impl FakeServer {
    fn set_offline(&self, offline: bool) {
        *self.offline.lock() = offline;
    }
}

#[async_trait]
impl ReplayTransport for FakeServer {
    async fn resubmit(&self, entry: &OutboxEntry) -> PushResult<()> {
        if *self.offline.lock() {
            return Err(PushError::Transport("network unreachable".to_string()));
        }
        self.received
            .lock()
            .push((entry.target_url.clone(), entry.body.clone()));
        Ok(())
    }
}

/// Entries enqueued before a simulated restart are still pending afterwards
/// and replay in the original order.
#[tokio::test]
async fn captured_requests_survive_restart_and_replay_in_order() {
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("outbox.redb");

    {
        let store = OutboxStore::new(&db_path).unwrap();
        store
            .enqueue("http://localhost:5000/posts", b"{\"n\":1}".to_vec())
            .unwrap();
        store
            .enqueue("http://localhost:5000/posts", b"{\"n\":2}".to_vec())
            .unwrap();
        store
            .enqueue("http://localhost:5000/comments", b"{\"n\":3}".to_vec())
            .unwrap();
    }

    // Restart: reopen the same database, connectivity restored
    let store = OutboxStore::new(&db_path).unwrap();
    assert_eq!(store.pending_count().unwrap(), 3);

    let server = Arc::new(FakeServer::default());
    let controller = ReplayController::new(store.clone(), server.clone());
    controller.on_sync_event(OUTBOX_SYNC_TAG).await.unwrap();

    let received = server.received.lock();
    assert_eq!(received.len(), 3);
    assert_eq!(received[0].1, b"{\"n\":1}".to_vec());
    assert_eq!(received[1].1, b"{\"n\":2}".to_vec());
    assert_eq!(received[2].1, b"{\"n\":3}".to_vec());
    assert_eq!(store.pending_count().unwrap(), 0);
}

/// A drain while still offline delivers nothing and loses nothing; the next
/// trigger after connectivity returns delivers everything.
#[tokio::test]
async fn offline_drain_keeps_everything_for_the_next_trigger() {
    let temp = TempDir::new().unwrap();
    let store = OutboxStore::new(temp.path().join("outbox.redb")).unwrap();
    store
        .enqueue("http://localhost:5000/posts", b"{\"n\":1}".to_vec())
        .unwrap();
    store
        .enqueue("http://localhost:5000/posts", b"{\"n\":2}".to_vec())
        .unwrap();

    let server = Arc::new(FakeServer::default());
    server.set_offline(true);
    let controller = ReplayController::new(store.clone(), server.clone());

    // Spurious trigger while the network is still down
    let outcome = controller.trigger().await.unwrap();
    match outcome {
        DrainOutcome::Drained(summary) => {
            assert_eq!(summary.attempted, 2);
            assert_eq!(summary.delivered, 0);
            assert_eq!(summary.failed, 2);
        }
        other => panic!("expected a drain, got {:?}", other),
    }
    assert_eq!(store.pending_count().unwrap(), 2);

    server.set_offline(false);
    controller.trigger().await.unwrap();
    assert_eq!(store.pending_count().unwrap(), 0);
    assert_eq!(server.received.lock().len(), 2);
}
