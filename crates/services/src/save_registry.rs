use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use catalog_core::listing::SaveCounts;
use catalog_core::model::{Item, ItemId, SavedRelation, UserId};
use storage::repository::{ItemRepository, SavedItemRepository};

use crate::Clock;
use crate::auth::AuthContext;
use crate::error::ServiceError;

type PendingSaves = Arc<Mutex<HashSet<(UserId, ItemId)>>>;

/// Marks a (user, item) save as in flight until dropped.
struct InFlight {
    pending: PendingSaves,
    key: (UserId, ItemId),
}

impl InFlight {
    fn acquire(pending: &PendingSaves, key: (UserId, ItemId)) -> Option<Self> {
        let mut set = pending.lock().unwrap_or_else(PoisonError::into_inner);
        if !set.insert(key) {
            return None;
        }
        Some(Self {
            pending: Arc::clone(pending),
            key,
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// At-most-once "user saved item" relations and their popularity counts.
#[derive(Clone)]
pub struct SaveRegistry {
    clock: Clock,
    saved: Arc<dyn SavedItemRepository>,
    items: Arc<dyn ItemRepository>,
    pending: PendingSaves,
}

impl SaveRegistry {
    #[must_use]
    pub fn new(
        clock: Clock,
        saved: Arc<dyn SavedItemRepository>,
        items: Arc<dyn ItemRepository>,
    ) -> Self {
        Self {
            clock,
            saved,
            items,
            pending: Arc::default(),
        }
    }

    /// Save `item` for the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Unauthenticated` without a session,
    /// `ServiceError::AlreadyExists` if the pair is saved or a save of the
    /// same pair is still pending, `ServiceError::NotFound` for an unknown
    /// item, and `RemoteFailure` for store failures.
    pub async fn save(&self, auth: &AuthContext, item: ItemId) -> Result<(), ServiceError> {
        let user = auth.require_user()?;
        let Some(_guard) = InFlight::acquire(&self.pending, (user, item)) else {
            tracing::warn!(user = %user, item = %item, "save already in flight");
            return Err(ServiceError::AlreadyExists("saved item".into()));
        };

        if self.saved.is_saved(user, item).await? {
            tracing::warn!(user = %user, item = %item, "item already saved");
            return Err(ServiceError::AlreadyExists("saved item".into()));
        }

        let relation = SavedRelation::new(user, item, self.clock.now());
        self.saved
            .insert_saved(&relation)
            .await
            .map_err(|err| match ServiceError::from(err) {
                ServiceError::AlreadyExists(_) => ServiceError::AlreadyExists("saved item".into()),
                ServiceError::NotFound(_) => ServiceError::NotFound(format!("item {item}")),
                other => other,
            })?;

        tracing::info!(user = %user, item = %item, "item saved");
        Ok(())
    }

    /// Remove the signed-in user's save of `item`. Returns whether a
    /// relation existed; removing a missing relation is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Unauthenticated` without a session and
    /// `RemoteFailure` for store failures.
    pub async fn delete(&self, auth: &AuthContext, item: ItemId) -> Result<bool, ServiceError> {
        let user = auth.require_user()?;
        let removed = self.saved.delete_saved(user, item).await?;
        tracing::info!(user = %user, item = %item, removed, "saved item deleted");
        Ok(removed)
    }

    /// Number of users who saved `item`.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` for store failures.
    pub async fn count_for(&self, item: ItemId) -> Result<u32, ServiceError> {
        Ok(self.saved.count_for(item).await?)
    }

    /// Counts for a whole list in one store call.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` for store failures.
    pub async fn counts_for(&self, items: &[ItemId]) -> Result<SaveCounts, ServiceError> {
        Ok(self.saved.counts_for(items).await?)
    }

    /// Ids the signed-in user has saved, used to mark rows in a list.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Unauthenticated` without a session and
    /// `RemoteFailure` for store failures.
    pub async fn saved_by_user(&self, auth: &AuthContext) -> Result<HashSet<ItemId>, ServiceError> {
        let user = auth.require_user()?;
        let ids = self.saved.saved_item_ids(user).await?;
        Ok(ids.into_iter().collect())
    }

    /// The signed-in user's saved items, oldest save first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Unauthenticated` without a session and
    /// `RemoteFailure` for store failures.
    pub async fn saved_items(&self, auth: &AuthContext) -> Result<Vec<Item>, ServiceError> {
        let user = auth.require_user()?;
        let ids = self.saved.saved_item_ids(user).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut items = self.items.items_by_ids(&ids).await?;
        items.sort_by_key(|item| ids.iter().position(|id| *id == item.id()));
        tracing::debug!(user = %user, count = items.len(), "loaded saved items");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use catalog_core::time::fixed_clock;
    use storage::repository::{InMemoryRepository, StorageError};

    use crate::error::ErrorKind;

    fn item(id: u64) -> Item {
        Item::new(
            ItemId::new(id),
            format!("Tool {id}"),
            "",
            "Text",
            "Free",
            "https://tools.example.com",
        )
        .unwrap()
    }

    async fn registry() -> SaveRegistry {
        let repo = InMemoryRepository::new();
        for id in 1..=3 {
            repo.upsert_item(&item(id)).await.unwrap();
        }
        SaveRegistry::new(fixed_clock(), Arc::new(repo.clone()), Arc::new(repo))
    }

    #[tokio::test]
    async fn second_save_is_rejected_and_counted_once() {
        let registry = registry().await;
        let auth = AuthContext::signed_in(UserId::new_v4());

        registry.save(&auth, ItemId::new(1)).await.unwrap();
        let err = registry.save(&auth, ItemId::new(1)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(registry.count_for(ItemId::new(1)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_without_relation_is_noop() {
        let registry = registry().await;
        let auth = AuthContext::signed_in(UserId::new_v4());
        assert!(!registry.delete(&auth, ItemId::new(2)).await.unwrap());
        assert_eq!(registry.count_for(ItemId::new(2)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn anonymous_user_cannot_save() {
        let registry = registry().await;
        let err = registry
            .save(&AuthContext::anonymous(), ItemId::new(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
        assert_eq!(registry.count_for(ItemId::new(1)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn saved_items_follow_save_order() {
        let registry = registry().await;
        let auth = AuthContext::signed_in(UserId::new_v4());
        let mut clock = fixed_clock();
        let registry_at = |clock: Clock| SaveRegistry {
            clock,
            ..registry.clone()
        };

        registry_at(clock).save(&auth, ItemId::new(3)).await.unwrap();
        clock.advance(chrono::Duration::seconds(5));
        registry_at(clock).save(&auth, ItemId::new(1)).await.unwrap();

        let titles: Vec<String> = registry
            .saved_items(&auth)
            .await
            .unwrap()
            .iter()
            .map(|i| i.title().to_owned())
            .collect();
        assert_eq!(titles, ["Tool 3", "Tool 1"]);

        let marked = registry.saved_by_user(&auth).await.unwrap();
        assert!(marked.contains(&ItemId::new(1)));
        assert!(!marked.contains(&ItemId::new(2)));
    }

    /// Yields once inside the existence check so a second save can start.
    #[derive(Clone)]
    struct SlowSaved(InMemoryRepository);

    #[async_trait]
    impl SavedItemRepository for SlowSaved {
        async fn is_saved(&self, user: UserId, item: ItemId) -> Result<bool, StorageError> {
            tokio::task::yield_now().await;
            self.0.is_saved(user, item).await
        }

        async fn insert_saved(&self, relation: &SavedRelation) -> Result<(), StorageError> {
            self.0.insert_saved(relation).await
        }

        async fn delete_saved(&self, user: UserId, item: ItemId) -> Result<bool, StorageError> {
            self.0.delete_saved(user, item).await
        }

        async fn count_for(&self, item: ItemId) -> Result<u32, StorageError> {
            self.0.count_for(item).await
        }

        async fn counts_for(&self, items: &[ItemId]) -> Result<SaveCounts, StorageError> {
            self.0.counts_for(items).await
        }

        async fn saved_item_ids(&self, user: UserId) -> Result<Vec<ItemId>, StorageError> {
            self.0.saved_item_ids(user).await
        }
    }

    #[tokio::test]
    async fn overlapping_duplicate_save_is_rejected() {
        let repo = InMemoryRepository::new();
        repo.upsert_item(&item(1)).await.unwrap();
        let registry = SaveRegistry::new(
            fixed_clock(),
            Arc::new(SlowSaved(repo.clone())),
            Arc::new(repo),
        );
        let auth = AuthContext::signed_in(UserId::new_v4());

        let (first, second) = tokio::join!(
            registry.save(&auth, ItemId::new(1)),
            registry.save(&auth, ItemId::new(1)),
        );
        assert!(first.is_ok());
        assert_eq!(second.unwrap_err().kind(), ErrorKind::AlreadyExists);
        assert_eq!(registry.count_for(ItemId::new(1)).await.unwrap(), 1);

        registry.delete(&auth, ItemId::new(1)).await.unwrap();
        registry.save(&auth, ItemId::new(1)).await.unwrap();
    }

    #[tokio::test]
    async fn poisoned_pending_set_still_saves() {
        let registry = registry().await;
        let pending = Arc::clone(&registry.pending);
        let _ = std::thread::spawn(move || {
            let _held = pending.lock().unwrap();
            panic!("poison the pending set");
        })
        .join();
        assert!(registry.pending.is_poisoned());

        let auth = AuthContext::signed_in(UserId::new_v4());
        registry.save(&auth, ItemId::new(2)).await.unwrap();
        assert_eq!(registry.count_for(ItemId::new(2)).await.unwrap(), 1);

        let err = registry.save(&auth, ItemId::new(2)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }
}
