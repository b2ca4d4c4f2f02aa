use catalog_core::listing::SaveCounts;
use catalog_core::model::{ItemId, SavedRelation, UserId};
use sqlx::{QueryBuilder, Row, Sqlite};

use super::SqliteRepository;
use super::mapping::{counter_from_i64, db_err, id_to_i64, item_id_from_i64, ser};
use crate::repository::{SavedItemRepository, StorageError};

#[async_trait::async_trait]
impl SavedItemRepository for SqliteRepository {
    async fn is_saved(&self, user: UserId, item: ItemId) -> Result<bool, StorageError> {
        let row = sqlx::query("SELECT 1 FROM saved_items WHERE user_id = ?1 AND item_id = ?2")
            .bind(user.to_string())
            .bind(id_to_i64("item_id", item.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.is_some())
    }

    async fn insert_saved(&self, relation: &SavedRelation) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO saved_items (user_id, item_id, saved_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(relation.user_id.to_string())
        .bind(id_to_i64("item_id", relation.item_id.value())?)
        .bind(relation.saved_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn delete_saved(&self, user: UserId, item: ItemId) -> Result<bool, StorageError> {
        let res = sqlx::query("DELETE FROM saved_items WHERE user_id = ?1 AND item_id = ?2")
            .bind(user.to_string())
            .bind(id_to_i64("item_id", item.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }

    async fn count_for(&self, item: ItemId) -> Result<u32, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS saves FROM saved_items WHERE item_id = ?1")
            .bind(id_to_i64("item_id", item.value())?)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        counter_from_i64("saves", row.try_get("saves").map_err(ser)?)
    }

    async fn counts_for(&self, items: &[ItemId]) -> Result<SaveCounts, StorageError> {
        let mut counts = SaveCounts::default();
        if items.is_empty() {
            return Ok(counts);
        }

        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT item_id, COUNT(*) AS saves FROM saved_items WHERE item_id IN (",
        );
        let mut separated = builder.separated(", ");
        for id in items {
            separated.push_bind(id_to_i64("item_id", id.value())?);
        }
        separated.push_unseparated(") GROUP BY item_id");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        for row in rows {
            let id = item_id_from_i64(row.try_get("item_id").map_err(ser)?)?;
            let saves = counter_from_i64("saves", row.try_get("saves").map_err(ser)?)?;
            counts.set(id, saves);
        }
        Ok(counts)
    }

    async fn saved_item_ids(&self, user: UserId) -> Result<Vec<ItemId>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT item_id
            FROM saved_items
            WHERE user_id = ?1
            ORDER BY saved_at ASC, item_id ASC
            ",
        )
        .bind(user.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| item_id_from_i64(row.try_get("item_id").map_err(ser)?))
            .collect()
    }
}
