//! Outbox store - durable append-only queue of captured requests
//!
//! Scoped to one client instance (its own database file, never synced across
//! devices). Identifiers come from a persisted counter so they stay monotonic
//! across removals and restarts; redb's key ordering makes ascending-id
//! iteration the enqueue order.

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use redb::{Database, ReadableTable, TableDefinition};
use tracing::debug;

use crate::error::{PushError, PushResult};
use crate::types::OutboxEntry;

/// Table for pending entries (key: entry id, value: serialized OutboxEntry)
const OUTBOX_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("outbox");

/// Table for the id counter (key: fixed, value: next id to assign)
const META_TABLE: TableDefinition<&str, u64> = TableDefinition::new("outbox_meta");

const NEXT_ID_KEY: &str = "next_entry_id";

/// Durable local queue of requests awaiting successful delivery
#[derive(Clone)]
pub struct OutboxStore {
    db: Arc<RwLock<Database>>,
}

impl OutboxStore {
    /// Open (or create) the outbox database at the given path
    pub fn new(path: impl AsRef<Path>) -> PushResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(path)?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(OUTBOX_TABLE)?;
            let _ = write_txn.open_table(META_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(RwLock::new(db)),
        })
    }

    /// Persist one captured request and assign it a fresh identifier
    ///
    /// Counter bump and insert commit atomically; a crash between them
    /// cannot produce a reused id.
    pub fn enqueue(&self, target_url: &str, body: Vec<u8>) -> PushResult<u64> {
        let db = self.db.read();
        let write_txn = db.begin_write()?;
        let id;
        {
            let mut meta = write_txn.open_table(META_TABLE)?;
            id = meta.get(NEXT_ID_KEY)?.map(|v| v.value()).unwrap_or(1);
            meta.insert(NEXT_ID_KEY, id + 1)?;

            let entry = OutboxEntry {
                id,
                target_url: target_url.to_string(),
                body,
                enqueued_at: chrono::Utc::now().timestamp(),
            };
            let serialized = postcard::to_allocvec(&entry)
                .map_err(|e| PushError::Serialization(e.to_string()))?;
            let mut table = write_txn.open_table(OUTBOX_TABLE)?;
            table.insert(id, serialized.as_slice())?;
        }
        write_txn.commit()?;

        debug!(id, url = %target_url, "Outbox entry enqueued");
        Ok(id)
    }

    /// List every pending entry in enqueue order
    ///
    /// The replay order contract depends on this ordering being stable.
    pub fn list_pending(&self) -> PushResult<Vec<OutboxEntry>> {
        let db = self.db.read();
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(OUTBOX_TABLE)?;

        let mut entries = Vec::new();
        for item in table.iter()? {
            let (_, value) = item?;
            let entry: OutboxEntry = postcard::from_bytes(value.value())
                .map_err(|e| PushError::Serialization(e.to_string()))?;
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Remove a replayed entry
    ///
    /// Idempotent: removing an already-removed id is a no-op, which guards
    /// against overlapping replay passes.
    pub fn remove(&self, id: u64) -> PushResult<()> {
        let db = self.db.read();
        let write_txn = db.begin_write()?;
        {
            let mut table = write_txn.open_table(OUTBOX_TABLE)?;
            table.remove(id)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Number of entries currently awaiting replay
    pub fn pending_count(&self) -> PushResult<usize> {
        Ok(self.list_pending()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (OutboxStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("outbox.redb");
        let store = OutboxStore::new(&db_path).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_enqueue_assigns_increasing_ids() {
        let (store, _temp) = create_test_store();

        let id1 = store.enqueue("http://localhost/a", b"1".to_vec()).unwrap();
        let id2 = store.enqueue("http://localhost/b", b"2".to_vec()).unwrap();
        let id3 = store.enqueue("http://localhost/c", b"3".to_vec()).unwrap();

        assert!(id1 < id2 && id2 < id3);
    }

    #[test]
    fn test_list_pending_in_enqueue_order() {
        let (store, _temp) = create_test_store();

        store.enqueue("http://localhost/a", b"1".to_vec()).unwrap();
        store.enqueue("http://localhost/b", b"2".to_vec()).unwrap();
        store.enqueue("http://localhost/c", b"3".to_vec()).unwrap();

        let pending = store.list_pending().unwrap();
        let urls: Vec<_> = pending.iter().map(|e| e.target_url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["http://localhost/a", "http://localhost/b", "http://localhost/c"]
        );
    }

    #[test]
    fn test_entries_persist_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("outbox.redb");

        let id = {
            let store = OutboxStore::new(&db_path).unwrap();
            store
                .enqueue("http://localhost/posts", b"{\"x\":1}".to_vec())
                .unwrap()
        };

        // Simulated process restart
        {
            let store = OutboxStore::new(&db_path).unwrap();
            let pending = store.list_pending().unwrap();
            assert_eq!(pending.len(), 1);
            assert_eq!(pending[0].id, id);
            assert_eq!(pending[0].target_url, "http://localhost/posts");
            assert_eq!(pending[0].body, b"{\"x\":1}".to_vec());
        }
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (store, _temp) = create_test_store();

        let id = store.enqueue("http://localhost/a", b"1".to_vec()).unwrap();
        store.remove(id).unwrap();
        store.remove(id).unwrap();
        store.remove(9999).unwrap();

        assert_eq!(store.pending_count().unwrap(), 0);
    }

    #[test]
    fn test_ids_stay_monotonic_after_full_drain_and_restart() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("outbox.redb");

        let last = {
            let store = OutboxStore::new(&db_path).unwrap();
            let id1 = store.enqueue("http://localhost/a", b"1".to_vec()).unwrap();
            let id2 = store.enqueue("http://localhost/b", b"2".to_vec()).unwrap();
            store.remove(id1).unwrap();
            store.remove(id2).unwrap();
            id2
        };

        let store = OutboxStore::new(&db_path).unwrap();
        let next = store.enqueue("http://localhost/c", b"3".to_vec()).unwrap();
        assert!(next > last);
    }
}
