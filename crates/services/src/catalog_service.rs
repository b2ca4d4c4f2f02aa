use std::sync::Arc;

use catalog_core::listing::{ItemStore, Popularity};
use catalog_core::model::{ArticleId, Item, ItemId, LearningArticle};
use storage::repository::{ArticleRepository, ItemRepository};

use crate::auth::AuthContext;
use crate::error::ServiceError;
use crate::save_registry::SaveRegistry;

/// Loads the tool catalog and learning articles into list stores.
#[derive(Clone)]
pub struct CatalogService {
    items: Arc<dyn ItemRepository>,
    articles: Arc<dyn ArticleRepository>,
    registry: SaveRegistry,
}

impl CatalogService {
    #[must_use]
    pub fn new(
        items: Arc<dyn ItemRepository>,
        articles: Arc<dyn ArticleRepository>,
        registry: SaveRegistry,
    ) -> Self {
        Self {
            items,
            articles,
            registry,
        }
    }

    /// All tools with their save counts, fetched in one batched call.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` or `UnexpectedShape` when the store fails.
    pub async fn tool_store(&self) -> Result<ItemStore<Item>, ServiceError> {
        let items = self.items.list_items().await?;
        let ids: Vec<ItemId> = items.iter().map(Item::id).collect();
        let counts = self.registry.counts_for(&ids).await?;
        tracing::debug!(tools = items.len(), "loaded tool catalog");
        Ok(ItemStore::new(items, counts))
    }

    /// Re-reads save counts after a save or delete without reloading items.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` when the store fails.
    pub async fn refresh_popularity(
        &self,
        store: &mut ItemStore<Item>,
    ) -> Result<(), ServiceError> {
        let ids: Vec<ItemId> = store.items().iter().map(Item::id).collect();
        store.set_popularity(self.registry.counts_for(&ids).await?);
        Ok(())
    }

    /// All learning articles. Articles are not ranked by popularity.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` or `UnexpectedShape` when the store fails.
    pub async fn article_store(&self) -> Result<ItemStore<LearningArticle>, ServiceError> {
        let articles = self.articles.list_articles().await?;
        tracing::debug!(articles = articles.len(), "loaded learning articles");
        Ok(ItemStore::new(articles, Popularity::new()))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` for an unknown article.
    pub async fn article(&self, id: ArticleId) -> Result<LearningArticle, ServiceError> {
        self.articles
            .get_article(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("article {id}")))
    }

    /// The "saved tools" view of the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Unauthenticated` without a session.
    pub async fn saved_tools(&self, auth: &AuthContext) -> Result<Vec<Item>, ServiceError> {
        self.registry.saved_items(auth).await
    }
}
