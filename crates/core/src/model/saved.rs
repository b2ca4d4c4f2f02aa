use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::ids::{ItemId, UserId};

/// "User saved item" link. Created once, deleted on request, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SavedRelation {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub saved_at: DateTime<Utc>,
}

impl SavedRelation {
    #[must_use]
    pub fn new(user_id: UserId, item_id: ItemId, saved_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            item_id,
            saved_at,
        }
    }

    /// The uniqueness key of the relation.
    #[must_use]
    pub fn key(&self) -> (UserId, ItemId) {
        (self.user_id, self.item_id)
    }
}
