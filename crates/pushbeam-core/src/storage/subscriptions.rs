//! Subscription storage - per-user push endpoint sets
//!
//! Each user's subscriptions are stored as one serialized vector so a
//! register or prune is a single-key read-modify-write; the registry holds a
//! per-user lock across that sequence.

use redb::{ReadableTable, TableDefinition};

use crate::error::{PushError, PushResult};
use crate::types::{Identity, PushSubscription};

use super::Storage;

/// Table for subscription sets (key: username, value: serialized Vec<PushSubscription>)
pub(crate) const SUBSCRIPTIONS_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("subscriptions");

impl Storage {
    /// Save a user's full subscription set, replacing what was there
    pub fn save_subscriptions(
        &self,
        identity: &str,
        subscriptions: &[PushSubscription],
    ) -> PushResult<()> {
        let db = self.db_handle();
        let db_guard = db.read();
        let write_txn = db_guard.begin_write()?;
        {
            let mut table = write_txn.open_table(SUBSCRIPTIONS_TABLE)?;
            let serialized = postcard::to_allocvec(subscriptions)
                .map_err(|e| PushError::Serialization(e.to_string()))?;
            table.insert(identity, serialized.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Load a user's subscription set
    ///
    /// Returns an empty vector when the user has never subscribed; the
    /// distinction between "unknown user" and "empty set" is made by the
    /// registry via [`Storage::has_user`].
    pub fn load_subscriptions(&self, identity: &str) -> PushResult<Vec<PushSubscription>> {
        let db = self.db_handle();
        let db_guard = db.read();
        let read_txn = db_guard.begin_read()?;
        let table = read_txn.open_table(SUBSCRIPTIONS_TABLE)?;

        if let Some(data) = table.get(identity)? {
            let subscriptions: Vec<PushSubscription> = postcard::from_bytes(data.value())
                .map_err(|e| PushError::Serialization(e.to_string()))?;
            Ok(subscriptions)
        } else {
            Ok(Vec::new())
        }
    }

    /// Enumerate every (identity, subscription) pair across all users
    ///
    /// Used for broadcast; order is unspecified.
    pub fn all_subscriptions(&self) -> PushResult<Vec<(Identity, PushSubscription)>> {
        let db = self.db_handle();
        let db_guard = db.read();
        let read_txn = db_guard.begin_read()?;
        let table = read_txn.open_table(SUBSCRIPTIONS_TABLE)?;

        let mut all = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            let identity = Identity::new(key.value());
            let subscriptions: Vec<PushSubscription> = postcard::from_bytes(value.value())
                .map_err(|e| PushError::Serialization(e.to_string()))?;
            for subscription in subscriptions {
                all.push((identity.clone(), subscription));
            }
        }

        Ok(all)
    }
}
