use catalog_core::model::{ArticleId, LearningArticle};

use super::SqliteRepository;
use super::mapping::{db_err, id_to_i64, map_article_row};
use crate::repository::{ArticleRepository, StorageError};

#[async_trait::async_trait]
impl ArticleRepository for SqliteRepository {
    async fn upsert_article(&self, article: &LearningArticle) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO learning_articles (id, title, author, content, difficulty, source_url)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                author = excluded.author,
                content = excluded.content,
                difficulty = excluded.difficulty,
                source_url = excluded.source_url
            ",
        )
        .bind(id_to_i64("article_id", article.id().value())?)
        .bind(article.title())
        .bind(article.author())
        .bind(article.content())
        .bind(article.difficulty().as_str())
        .bind(article.source_url().as_str())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn list_articles(&self) -> Result<Vec<LearningArticle>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, author, content, difficulty, source_url
            FROM learning_articles
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_article_row).collect()
    }

    async fn get_article(&self, id: ArticleId) -> Result<Option<LearningArticle>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, title, author, content, difficulty, source_url
            FROM learning_articles
            WHERE id = ?1
            ",
        )
        .bind(id_to_i64("article_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_article_row).transpose()
    }
}
