use async_trait::async_trait;
use catalog_core::listing::SaveCounts;
use catalog_core::model::{
    ArticleId, Item, ItemId, LearningArticle, QuestionId, QuizQuestion, SavedRelation,
    TestStatistics, UserId, UserProgress,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Catalog items (tools).
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Insert or replace an item.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the item cannot be stored.
    async fn upsert_item(&self, item: &Item) -> Result<(), StorageError>;

    /// All items, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_items(&self) -> Result<Vec<Item>, StorageError>;

    /// Items with the given ids, ordered by id. Unknown ids are skipped.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn items_by_ids(&self, ids: &[ItemId]) -> Result<Vec<Item>, StorageError>;
}

/// Learning articles.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the article cannot be stored.
    async fn upsert_article(&self, article: &LearningArticle) -> Result<(), StorageError>;

    /// All articles, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_articles(&self) -> Result<Vec<LearningArticle>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; a missing article is `Ok(None)`.
    async fn get_article(&self, id: ArticleId) -> Result<Option<LearningArticle>, StorageError>;
}

/// "User saved item" relations.
#[async_trait]
pub trait SavedItemRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn is_saved(&self, user: UserId, item: ItemId) -> Result<bool, StorageError>;

    /// Insert a relation.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the pair is already present.
    async fn insert_saved(&self, relation: &SavedRelation) -> Result<(), StorageError>;

    /// Remove a relation. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; a missing pair is not an error.
    async fn delete_saved(&self, user: UserId, item: ItemId) -> Result<bool, StorageError>;

    /// Number of users who saved `item`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn count_for(&self, item: ItemId) -> Result<u32, StorageError>;

    /// Save counts for many items in one call.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn counts_for(&self, items: &[ItemId]) -> Result<SaveCounts, StorageError>;

    /// Ids of items saved by `user`, oldest save first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn saved_item_ids(&self, user: UserId) -> Result<Vec<ItemId>, StorageError>;
}

/// Quiz questions grouped by article.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn upsert_question(&self, question: &QuizQuestion) -> Result<(), StorageError>;

    /// The article's questions ordered by question id; empty when it has no test.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn questions_for_article(
        &self,
        article: ArticleId,
    ) -> Result<Vec<QuizQuestion>, StorageError>;
}

/// Per-article attempt counters.
#[async_trait]
pub trait StatisticsRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; no attempts yet is `Ok(None)`.
    async fn get_statistics(
        &self,
        article: ArticleId,
    ) -> Result<Option<TestStatistics>, StorageError>;

    /// Records one quiz submission: overwrites the (user, article) progress
    /// row and adds one attempt (and one pass when `test_passed`) to the
    /// article's counters. Both writes commit together or not at all.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures, in which case neither
    /// write is visible.
    async fn record_submission(
        &self,
        progress: &UserProgress,
    ) -> Result<TestStatistics, StorageError>;
}

/// Latest quiz outcome per (user, article).
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_progress(
        &self,
        user: UserId,
        article: ArticleId,
    ) -> Result<Option<UserProgress>, StorageError>;

    /// All of a user's progress rows, ordered by article id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_progress(&self, user: UserId) -> Result<Vec<UserProgress>, StorageError>;
}

//
// ─── IN-MEMORY ADAPTER ─────────────────────────────────────────────────────────
//

#[derive(Default)]
struct SavedState {
    relations: HashMap<(UserId, ItemId), SavedRelation>,
    /// Maintained on every insert/delete so counts never need a full scan.
    counts: SaveCounts,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    items: Arc<Mutex<BTreeMap<ItemId, Item>>>,
    articles: Arc<Mutex<BTreeMap<ArticleId, LearningArticle>>>,
    saved: Arc<Mutex<SavedState>>,
    questions: Arc<Mutex<BTreeMap<(ArticleId, QuestionId), QuizQuestion>>>,
    statistics: Arc<Mutex<HashMap<ArticleId, TestStatistics>>>,
    progress: Arc<Mutex<BTreeMap<(UserId, ArticleId), UserProgress>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e| StorageError::Connection(e.to_string()))
}

#[async_trait]
impl ItemRepository for InMemoryRepository {
    async fn upsert_item(&self, item: &Item) -> Result<(), StorageError> {
        lock(&self.items)?.insert(item.id(), item.clone());
        Ok(())
    }

    async fn list_items(&self) -> Result<Vec<Item>, StorageError> {
        Ok(lock(&self.items)?.values().cloned().collect())
    }

    async fn items_by_ids(&self, ids: &[ItemId]) -> Result<Vec<Item>, StorageError> {
        let guard = lock(&self.items)?;
        Ok(guard
            .values()
            .filter(|item| ids.contains(&item.id()))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ArticleRepository for InMemoryRepository {
    async fn upsert_article(&self, article: &LearningArticle) -> Result<(), StorageError> {
        lock(&self.articles)?.insert(article.id(), article.clone());
        Ok(())
    }

    async fn list_articles(&self) -> Result<Vec<LearningArticle>, StorageError> {
        Ok(lock(&self.articles)?.values().cloned().collect())
    }

    async fn get_article(&self, id: ArticleId) -> Result<Option<LearningArticle>, StorageError> {
        Ok(lock(&self.articles)?.get(&id).cloned())
    }
}

#[async_trait]
impl SavedItemRepository for InMemoryRepository {
    async fn is_saved(&self, user: UserId, item: ItemId) -> Result<bool, StorageError> {
        Ok(lock(&self.saved)?.relations.contains_key(&(user, item)))
    }

    async fn insert_saved(&self, relation: &SavedRelation) -> Result<(), StorageError> {
        let mut guard = lock(&self.saved)?;
        if guard.relations.contains_key(&relation.key()) {
            return Err(StorageError::Conflict);
        }
        guard.relations.insert(relation.key(), *relation);
        guard.counts.increment(relation.item_id);
        Ok(())
    }

    async fn delete_saved(&self, user: UserId, item: ItemId) -> Result<bool, StorageError> {
        let mut guard = lock(&self.saved)?;
        let removed = guard.relations.remove(&(user, item)).is_some();
        if removed {
            guard.counts.decrement(&item);
        }
        Ok(removed)
    }

    async fn count_for(&self, item: ItemId) -> Result<u32, StorageError> {
        Ok(lock(&self.saved)?.counts.get(&item))
    }

    async fn counts_for(&self, items: &[ItemId]) -> Result<SaveCounts, StorageError> {
        let guard = lock(&self.saved)?;
        Ok(items
            .iter()
            .map(|id| (*id, guard.counts.get(id)))
            .collect())
    }

    async fn saved_item_ids(&self, user: UserId) -> Result<Vec<ItemId>, StorageError> {
        let guard = lock(&self.saved)?;
        let mut rows: Vec<&SavedRelation> = guard
            .relations
            .values()
            .filter(|r| r.user_id == user)
            .collect();
        rows.sort_by_key(|r| (r.saved_at, r.item_id));
        Ok(rows.into_iter().map(|r| r.item_id).collect())
    }
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn upsert_question(&self, question: &QuizQuestion) -> Result<(), StorageError> {
        lock(&self.questions)?.insert((question.article_id(), question.id()), question.clone());
        Ok(())
    }

    async fn questions_for_article(
        &self,
        article: ArticleId,
    ) -> Result<Vec<QuizQuestion>, StorageError> {
        let guard = lock(&self.questions)?;
        Ok(guard
            .range((article, QuestionId::new(0))..=(article, QuestionId::new(u64::MAX)))
            .map(|(_, q)| q.clone())
            .collect())
    }
}

#[async_trait]
impl StatisticsRepository for InMemoryRepository {
    async fn get_statistics(
        &self,
        article: ArticleId,
    ) -> Result<Option<TestStatistics>, StorageError> {
        Ok(lock(&self.statistics)?.get(&article).copied())
    }

    async fn record_submission(
        &self,
        progress: &UserProgress,
    ) -> Result<TestStatistics, StorageError> {
        // Statistics before progress, everywhere both are held.
        let mut statistics = lock(&self.statistics)?;
        let mut rows = lock(&self.progress)?;

        let article = progress.article_id;
        let stats = statistics
            .entry(article)
            .or_insert_with(|| TestStatistics::empty(article));
        stats.record(progress.test_passed);
        rows.insert((progress.user_id, article), progress.clone());
        Ok(*stats)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(
        &self,
        user: UserId,
        article: ArticleId,
    ) -> Result<Option<UserProgress>, StorageError> {
        Ok(lock(&self.progress)?.get(&(user, article)).cloned())
    }

    async fn list_progress(&self, user: UserId) -> Result<Vec<UserProgress>, StorageError> {
        let guard = lock(&self.progress)?;
        Ok(guard
            .values()
            .filter(|p| p.user_id == user)
            .cloned()
            .collect())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub items: Arc<dyn ItemRepository>,
    pub articles: Arc<dyn ArticleRepository>,
    pub saved: Arc<dyn SavedItemRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub statistics: Arc<dyn StatisticsRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    /// Uses one adapter for every table.
    #[must_use]
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: ItemRepository
            + ArticleRepository
            + SavedItemRepository
            + QuizRepository
            + StatisticsRepository
            + ProgressRepository
            + Clone
            + 'static,
    {
        Self {
            items: Arc::new(repo.clone()),
            articles: Arc::new(repo.clone()),
            saved: Arc::new(repo.clone()),
            quizzes: Arc::new(repo.clone()),
            statistics: Arc::new(repo.clone()),
            progress: Arc::new(repo),
        }
    }
}
