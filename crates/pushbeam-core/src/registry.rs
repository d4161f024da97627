//! Subscription registry - the durable user → endpoint-set mapping
//!
//! Owns registration dedup and pruning. Mutations to the same user's set are
//! serialized through a per-user async mutex held across the read-modify-write,
//! so a concurrent register and prune cannot lose an update; different users'
//! mutations proceed independently.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::{PushError, PushResult};
use crate::storage::Storage;
use crate::types::{Identity, PushSubscription, RegisterOutcome};

/// Durable registry of push subscriptions, keyed by user identity
pub struct SubscriptionRegistry {
    storage: Storage,
    /// Per-user mutation locks, created on first touch
    user_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SubscriptionRegistry {
    /// Create a registry over the given storage
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Get (or create) the mutation lock for one user
    fn user_lock(&self, identity: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.user_locks.lock();
        locks
            .entry(identity.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Register a subscription for a user
    ///
    /// The identity must resolve to an existing account. Dedup key is the
    /// endpoint string compared for exact equality: registering an identical
    /// endpoint again leaves the set unchanged and reports
    /// [`RegisterOutcome::AlreadyPresent`]. Idempotent under retry.
    pub async fn register(
        &self,
        identity: &Identity,
        subscription: PushSubscription,
    ) -> PushResult<RegisterOutcome> {
        let lock = self.user_lock(identity.as_str());
        let _guard = lock.lock().await;

        if !self.storage.has_user(identity.as_str())? {
            return Err(PushError::UserNotFound(identity.as_str().to_string()));
        }

        let mut subscriptions = self.storage.load_subscriptions(identity.as_str())?;
        if subscriptions
            .iter()
            .any(|s| s.endpoint == subscription.endpoint)
        {
            debug!(%identity, endpoint = %subscription.endpoint, "Subscription already present");
            return Ok(RegisterOutcome::AlreadyPresent);
        }

        info!(%identity, endpoint = %subscription.endpoint, "Subscription added");
        subscriptions.push(subscription);
        self.storage
            .save_subscriptions(identity.as_str(), &subscriptions)?;

        Ok(RegisterOutcome::Added)
    }

    /// Enumerate every current subscription across all users
    ///
    /// Used for broadcast; order is unspecified and irrelevant.
    pub fn list_all(&self) -> PushResult<Vec<(Identity, PushSubscription)>> {
        self.storage.all_subscriptions()
    }

    /// List one user's subscriptions
    ///
    /// Fails with [`PushError::UserNotFound`] when the identity is unknown
    /// and with [`PushError::NoSubscriptions`] when the account exists but
    /// has an empty set, so callers can tell the two apart.
    pub fn list_for_user(&self, identity: &Identity) -> PushResult<Vec<PushSubscription>> {
        if !self.storage.has_user(identity.as_str())? {
            return Err(PushError::UserNotFound(identity.as_str().to_string()));
        }

        let subscriptions = self.storage.load_subscriptions(identity.as_str())?;
        if subscriptions.is_empty() {
            return Err(PushError::NoSubscriptions(identity.as_str().to_string()));
        }

        Ok(subscriptions)
    }

    /// Remove one endpoint from a user's set
    ///
    /// No-op (and no error) when the endpoint is already absent, which makes
    /// concurrent double-pruning safe.
    pub async fn prune(&self, identity: &Identity, endpoint: &str) -> PushResult<()> {
        let lock = self.user_lock(identity.as_str());
        let _guard = lock.lock().await;

        let mut subscriptions = self.storage.load_subscriptions(identity.as_str())?;
        let Some(position) = subscriptions.iter().position(|s| s.endpoint == endpoint) else {
            debug!(%identity, endpoint, "Prune target already absent");
            return Ok(());
        };

        subscriptions.remove(position);
        self.storage
            .save_subscriptions(identity.as_str(), &subscriptions)?;
        info!(%identity, endpoint, "Pruned dead endpoint");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SubscriptionKeys, UserRecord};
    use tempfile::TempDir;

    fn create_test_registry() -> (Arc<SubscriptionRegistry>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.redb");
        let storage = Storage::new(&db_path).unwrap();
        storage.save_user(&UserRecord::new("alice", "pw")).unwrap();
        storage.save_user(&UserRecord::new("bob", "pw")).unwrap();
        (Arc::new(SubscriptionRegistry::new(storage)), temp_dir)
    }

    fn sub(endpoint: &str) -> PushSubscription {
        PushSubscription::new(endpoint, SubscriptionKeys::default())
    }

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let (registry, _temp) = create_test_registry();
        let alice = Identity::new("alice");

        let first = registry
            .register(&alice, sub("https://push.example/a1"))
            .await
            .unwrap();
        assert_eq!(first, RegisterOutcome::Added);

        let second = registry
            .register(&alice, sub("https://push.example/a1"))
            .await
            .unwrap();
        assert_eq!(second, RegisterOutcome::AlreadyPresent);

        let subs = registry.list_for_user(&alice).unwrap();
        assert_eq!(subs.len(), 1);
    }

    #[tokio::test]
    async fn test_register_unknown_identity_fails() {
        let (registry, _temp) = create_test_registry();
        let ghost = Identity::new("ghost");

        let err = registry
            .register(&ghost, sub("https://push.example/g1"))
            .await
            .unwrap_err();
        assert!(matches!(err, PushError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn test_list_for_user_distinguishes_unknown_from_empty() {
        let (registry, _temp) = create_test_registry();

        let err = registry.list_for_user(&Identity::new("ghost")).unwrap_err();
        assert!(matches!(err, PushError::UserNotFound(_)));

        let err = registry.list_for_user(&Identity::new("alice")).unwrap_err();
        assert!(matches!(err, PushError::NoSubscriptions(_)));
    }

    #[tokio::test]
    async fn test_prune_removes_exactly_one_entry() {
        let (registry, _temp) = create_test_registry();
        let alice = Identity::new("alice");

        registry
            .register(&alice, sub("https://push.example/a1"))
            .await
            .unwrap();
        registry
            .register(&alice, sub("https://push.example/a2"))
            .await
            .unwrap();

        registry
            .prune(&alice, "https://push.example/a1")
            .await
            .unwrap();

        let subs = registry.list_for_user(&alice).unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].endpoint, "https://push.example/a2");
    }

    #[tokio::test]
    async fn test_prune_absent_endpoint_is_noop() {
        let (registry, _temp) = create_test_registry();
        let alice = Identity::new("alice");

        // Never registered, and double-prune after a register
        registry
            .prune(&alice, "https://push.example/nothing")
            .await
            .unwrap();

        registry
            .register(&alice, sub("https://push.example/a1"))
            .await
            .unwrap();
        registry
            .prune(&alice, "https://push.example/a1")
            .await
            .unwrap();
        registry
            .prune(&alice, "https://push.example/a1")
            .await
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_registers_do_not_lose_updates() {
        let (registry, _temp) = create_test_registry();

        let r1 = registry.clone();
        let r2 = registry.clone();
        let t1 = tokio::spawn(async move {
            r1.register(&Identity::new("alice"), sub("https://push.example/a1"))
                .await
        });
        let t2 = tokio::spawn(async move {
            r2.register(&Identity::new("alice"), sub("https://push.example/a2"))
                .await
        });

        t1.await.unwrap().unwrap();
        t2.await.unwrap().unwrap();

        let subs = registry.list_for_user(&Identity::new("alice")).unwrap();
        assert_eq!(subs.len(), 2);
    }

    #[tokio::test]
    async fn test_shared_endpoint_across_users_is_independent() {
        let (registry, _temp) = create_test_registry();
        let alice = Identity::new("alice");
        let bob = Identity::new("bob");

        registry
            .register(&alice, sub("https://push.example/shared"))
            .await
            .unwrap();
        registry
            .register(&bob, sub("https://push.example/shared"))
            .await
            .unwrap();

        registry
            .prune(&alice, "https://push.example/shared")
            .await
            .unwrap();

        // Bob's pair is untouched by alice's prune
        let subs = registry.list_for_user(&bob).unwrap();
        assert_eq!(subs.len(), 1);
    }
}
