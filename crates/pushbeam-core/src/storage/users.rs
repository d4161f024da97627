//! User account storage - records consulted during identity resolution

use redb::{ReadableTable, TableDefinition};

use crate::error::{PushError, PushResult};
use crate::types::UserRecord;

use super::Storage;

/// Table for user accounts (key: username, value: serialized UserRecord)
pub(crate) const USERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

impl Storage {
    /// Save a user account
    ///
    /// If a record with the same username exists, it will be overwritten.
    pub fn save_user(&self, user: &UserRecord) -> PushResult<()> {
        let db = self.db_handle();
        let db_guard = db.read();
        let write_txn = db_guard.begin_write()?;
        {
            let mut table = write_txn.open_table(USERS_TABLE)?;
            let serialized = postcard::to_allocvec(user)
                .map_err(|e| PushError::Serialization(e.to_string()))?;
            table.insert(user.username.as_str(), serialized.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Load a user account by username
    ///
    /// Returns `None` if no account exists for the given username.
    pub fn load_user(&self, username: &str) -> PushResult<Option<UserRecord>> {
        let db = self.db_handle();
        let db_guard = db.read();
        let read_txn = db_guard.begin_read()?;
        let table = read_txn.open_table(USERS_TABLE)?;

        if let Some(data) = table.get(username)? {
            let user: UserRecord = postcard::from_bytes(data.value())
                .map_err(|e| PushError::Serialization(e.to_string()))?;
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Check whether an identity resolves to a stored account
    pub fn has_user(&self, username: &str) -> PushResult<bool> {
        let db = self.db_handle();
        let db_guard = db.read();
        let read_txn = db_guard.begin_read()?;
        let table = read_txn.open_table(USERS_TABLE)?;

        Ok(table.get(username)?.is_some())
    }
}
