use catalog_core::model::{ArticleId, QuizQuestion};

use super::SqliteRepository;
use super::mapping::{db_err, id_to_i64, map_question_row, options_to_json};
use crate::repository::{QuizRepository, StorageError};

#[async_trait::async_trait]
impl QuizRepository for SqliteRepository {
    async fn upsert_question(&self, question: &QuizQuestion) -> Result<(), StorageError> {
        let options = options_to_json(question.options())?;

        sqlx::query(
            r"
            INSERT INTO quiz_questions (id, article_id, question, options, correct_option)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(article_id, id) DO UPDATE SET
                question = excluded.question,
                options = excluded.options,
                correct_option = excluded.correct_option
            ",
        )
        .bind(id_to_i64("question_id", question.id().value())?)
        .bind(id_to_i64("article_id", question.article_id().value())?)
        .bind(question.text())
        .bind(options)
        .bind(question.correct_option())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn questions_for_article(
        &self,
        article: ArticleId,
    ) -> Result<Vec<QuizQuestion>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, article_id, question, options, correct_option
            FROM quiz_questions
            WHERE article_id = ?1
            ORDER BY id ASC
            ",
        )
        .bind(id_to_i64("article_id", article.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_question_row).collect()
    }
}
