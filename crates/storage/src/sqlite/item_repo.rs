use catalog_core::model::{Item, ItemId};
use sqlx::{QueryBuilder, Sqlite};

use super::SqliteRepository;
use super::mapping::{db_err, id_to_i64, map_item_row};
use crate::repository::{ItemRepository, StorageError};

#[async_trait::async_trait]
impl ItemRepository for SqliteRepository {
    async fn upsert_item(&self, item: &Item) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO items (id, title, description, category, price, link)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                category = excluded.category,
                price = excluded.price,
                link = excluded.link
            ",
        )
        .bind(id_to_i64("item_id", item.id().value())?)
        .bind(item.title())
        .bind(item.description())
        .bind(item.category())
        .bind(item.price())
        .bind(item.link().as_str())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn list_items(&self) -> Result<Vec<Item>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, description, category, price, link
            FROM items
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_item_row).collect()
    }

    async fn items_by_ids(&self, ids: &[ItemId]) -> Result<Vec<Item>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT id, title, description, category, price, link FROM items WHERE id IN (",
        );
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id_to_i64("item_id", id.value())?);
        }
        separated.push_unseparated(") ORDER BY id ASC");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter().map(map_item_row).collect()
    }
}
