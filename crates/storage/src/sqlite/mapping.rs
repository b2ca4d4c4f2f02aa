use std::collections::BTreeMap;

use catalog_core::model::{
    ArticleId, Difficulty, Item, ItemId, LearningArticle, QuestionId, QuizQuestion, UserId,
    UserProgress,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Maps driver errors, keeping constraint violations distinguishable.
pub(crate) fn db_err(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StorageError::Conflict;
        }
        if db.is_foreign_key_violation() {
            return StorageError::NotFound;
        }
    }
    StorageError::Connection(e.to_string())
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn item_id_from_i64(v: i64) -> Result<ItemId, StorageError> {
    Ok(ItemId::new(i64_to_u64("item_id", v)?))
}

pub(crate) fn article_id_from_i64(v: i64) -> Result<ArticleId, StorageError> {
    Ok(ArticleId::new(i64_to_u64("article_id", v)?))
}

pub(crate) fn user_id_from_str(s: &str) -> Result<UserId, StorageError> {
    s.parse()
        .map_err(|_| StorageError::Serialization(format!("invalid user_id: {s}")))
}

pub(crate) fn counter_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32_from_i64(field, v)
}

pub(crate) fn map_item_row(row: &SqliteRow) -> Result<Item, StorageError> {
    let link: String = row.try_get("link").map_err(ser)?;
    Item::new(
        item_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<String, _>("description").map_err(ser)?,
        row.try_get::<String, _>("category").map_err(ser)?,
        row.try_get::<String, _>("price").map_err(ser)?,
        &link,
    )
    .map_err(ser)
}

pub(crate) fn map_article_row(row: &SqliteRow) -> Result<LearningArticle, StorageError> {
    let difficulty: Difficulty = row
        .try_get::<String, _>("difficulty")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let source_url: String = row.try_get("source_url").map_err(ser)?;
    LearningArticle::new(
        article_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<String, _>("author").map_err(ser)?,
        row.try_get::<String, _>("content").map_err(ser)?,
        difficulty,
        &source_url,
    )
    .map_err(ser)
}

/// Options are stored as a JSON object of key → label.
pub(crate) fn options_to_json(options: &BTreeMap<String, String>) -> Result<String, StorageError> {
    serde_json::to_string(options).map_err(ser)
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<QuizQuestion, StorageError> {
    let raw_options: String = row.try_get("options").map_err(ser)?;
    let options: BTreeMap<String, String> = serde_json::from_str(&raw_options).map_err(ser)?;
    QuizQuestion::new(
        QuestionId::new(i64_to_u64("id", row.try_get::<i64, _>("id").map_err(ser)?)?),
        article_id_from_i64(row.try_get::<i64, _>("article_id").map_err(ser)?)?,
        row.try_get::<String, _>("question").map_err(ser)?,
        options,
        row.try_get::<String, _>("correct_option").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<UserProgress, StorageError> {
    let user_id: String = row.try_get("user_id").map_err(ser)?;
    Ok(UserProgress {
        user_id: user_id_from_str(&user_id)?,
        article_id: article_id_from_i64(row.try_get::<i64, _>("article_id").map_err(ser)?)?,
        test_passed: row.try_get::<i64, _>("test_passed").map_err(ser)? != 0,
        updated_at: row.try_get("updated_at").map_err(ser)?,
    })
}
