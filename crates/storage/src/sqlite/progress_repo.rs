use catalog_core::model::{ArticleId, TestStatistics, UserId, UserProgress};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::{counter_from_i64, db_err, id_to_i64, map_progress_row, ser};
use crate::repository::{ProgressRepository, StatisticsRepository, StorageError};

fn map_statistics_row(article: ArticleId, row: &SqliteRow) -> Result<TestStatistics, StorageError> {
    let attempts = counter_from_i64("total_attempts", row.try_get("total_attempts").map_err(ser)?)?;
    let passes = counter_from_i64(
        "successful_passes",
        row.try_get("successful_passes").map_err(ser)?,
    )?;
    TestStatistics::from_persisted(article, attempts, passes).map_err(ser)
}

#[async_trait::async_trait]
impl StatisticsRepository for SqliteRepository {
    async fn get_statistics(
        &self,
        article: ArticleId,
    ) -> Result<Option<TestStatistics>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT total_attempts, successful_passes
            FROM test_statistics
            WHERE article_id = ?1
            ",
        )
        .bind(id_to_i64("article_id", article.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(|row| map_statistics_row(article, &row)).transpose()
    }

    async fn record_submission(
        &self,
        progress: &UserProgress,
    ) -> Result<TestStatistics, StorageError> {
        let article = progress.article_id;
        let article_id = id_to_i64("article_id", article.value())?;

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            r"
            INSERT INTO user_article_progress (user_id, article_id, test_passed, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id, article_id) DO UPDATE SET
                test_passed = excluded.test_passed,
                updated_at = excluded.updated_at
            ",
        )
        .bind(progress.user_id.to_string())
        .bind(article_id)
        .bind(i64::from(progress.test_passed))
        .bind(progress.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        // Increment in SQL: concurrent submitters never lose an attempt.
        let row = sqlx::query(
            r"
            INSERT INTO test_statistics (article_id, total_attempts, successful_passes)
            VALUES (?1, 1, ?2)
            ON CONFLICT(article_id) DO UPDATE SET
                total_attempts = test_statistics.total_attempts + 1,
                successful_passes = test_statistics.successful_passes + excluded.successful_passes
            RETURNING total_attempts, successful_passes
            ",
        )
        .bind(article_id)
        .bind(i64::from(progress.test_passed))
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

        let stats = map_statistics_row(article, &row)?;
        tx.commit().await.map_err(db_err)?;

        tracing::debug!(
            user = %progress.user_id,
            article = %article,
            attempts = stats.total_attempts(),
            passes = stats.successful_passes(),
            "recorded quiz submission"
        );
        Ok(stats)
    }
}

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_progress(
        &self,
        user: UserId,
        article: ArticleId,
    ) -> Result<Option<UserProgress>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, article_id, test_passed, updated_at
            FROM user_article_progress
            WHERE user_id = ?1 AND article_id = ?2
            ",
        )
        .bind(user.to_string())
        .bind(id_to_i64("article_id", article.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn list_progress(&self, user: UserId) -> Result<Vec<UserProgress>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT user_id, article_id, test_passed, updated_at
            FROM user_article_progress
            WHERE user_id = ?1
            ORDER BY article_id ASC
            ",
        )
        .bind(user.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_progress_row).collect()
    }
}
