use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

const SCHEMA_V1: &[&str] = &[
    r"
        CREATE TABLE IF NOT EXISTS items (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            category TEXT NOT NULL,
            price TEXT NOT NULL,
            link TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS learning_articles (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            author TEXT NOT NULL,
            content TEXT NOT NULL,
            difficulty TEXT NOT NULL,
            source_url TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS saved_items (
            user_id TEXT NOT NULL,
            item_id INTEGER NOT NULL,
            saved_at TEXT NOT NULL,
            PRIMARY KEY (user_id, item_id),
            FOREIGN KEY (item_id) REFERENCES items(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS quiz_questions (
            id INTEGER NOT NULL,
            article_id INTEGER NOT NULL,
            question TEXT NOT NULL,
            options TEXT NOT NULL,
            correct_option TEXT NOT NULL,
            PRIMARY KEY (article_id, id),
            FOREIGN KEY (article_id) REFERENCES learning_articles(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS test_statistics (
            article_id INTEGER PRIMARY KEY,
            total_attempts INTEGER NOT NULL CHECK (total_attempts >= 0),
            successful_passes INTEGER NOT NULL CHECK (successful_passes >= 0),
            CHECK (successful_passes <= total_attempts),
            FOREIGN KEY (article_id) REFERENCES learning_articles(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS user_article_progress (
            user_id TEXT NOT NULL,
            article_id INTEGER NOT NULL,
            test_passed INTEGER NOT NULL CHECK (test_passed IN (0, 1)),
            updated_at TEXT NOT NULL,
            PRIMARY KEY (user_id, article_id),
            FOREIGN KEY (article_id) REFERENCES learning_articles(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_saved_items_item
            ON saved_items (item_id);
    ",
];

/// Applies pending schema versions inside one transaction each.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
        ",
    )
    .execute(pool)
    .await?;

    if is_applied(pool, 1).await? {
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    for statement in SCHEMA_V1 {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    sqlx::query(
        r"
            INSERT INTO schema_migrations (version, applied_at)
            VALUES (?1, ?2)
            ON CONFLICT(version) DO NOTHING
        ",
    )
    .bind(1_i64)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::info!(version = 1, "applied schema migration");
    Ok(())
}
