//! Quiz sessions and the bookkeeping performed when one is submitted.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use catalog_core::model::{
    ArticleId, QuestionId, Quiz, QuizAttempt, QuizError, QuizOutcome, TestStatistics, UserId,
    UserProgress,
};
use storage::repository::{
    ArticleRepository, ProgressRepository, QuizRepository, StatisticsRepository,
};

use crate::Clock;
use crate::auth::AuthContext;
use crate::error::ServiceError;

/// Lifecycle of one quiz session. `Submitted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizState {
    Unstarted,
    InProgress,
    Submitted,
}

/// Rejected interactions with a quiz session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("quiz session is {0:?}, not in progress")]
    NotInProgress(QuizState),
    #[error(transparent)]
    Quiz(#[from] QuizError),
}

/// One user's pass through an article's quiz.
///
/// Answers live only here; dropping the session discards them.
#[derive(Debug, Clone)]
pub struct QuizSession {
    user: UserId,
    quiz: Quiz,
    attempt: QuizAttempt,
    state: QuizState,
    outcome: Option<QuizOutcome>,
}

impl QuizSession {
    fn new(user: UserId, quiz: Quiz) -> Self {
        Self {
            user,
            quiz,
            attempt: QuizAttempt::new(),
            state: QuizState::Unstarted,
            outcome: None,
        }
    }

    fn begin(&mut self) {
        if self.state == QuizState::Unstarted {
            self.state = QuizState::InProgress;
        }
    }

    #[must_use]
    pub fn state(&self) -> QuizState {
        self.state
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    #[must_use]
    pub fn article_id(&self) -> ArticleId {
        self.quiz.article_id()
    }

    #[must_use]
    pub fn answered(&self) -> usize {
        self.attempt.answered()
    }

    #[must_use]
    pub fn choice(&self, question: QuestionId) -> Option<&str> {
        self.attempt.choice(question)
    }

    /// Selects (or re-selects) an option.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` once submitted, and
    /// `SessionError::Quiz` for an unknown question or option.
    pub fn choose(&mut self, question: QuestionId, key: &str) -> Result<(), SessionError> {
        if self.state != QuizState::InProgress {
            return Err(SessionError::NotInProgress(self.state));
        }
        self.attempt.choose(&self.quiz, question, key)?;
        Ok(())
    }

    /// The scored result, available after submission.
    #[must_use]
    pub fn outcome(&self) -> Option<&QuizOutcome> {
        self.outcome.as_ref()
    }
}

/// A progress row joined with its article title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEntry {
    pub article_id: ArticleId,
    pub article_title: String,
    pub test_passed: bool,
    pub updated_at: DateTime<Utc>,
}

/// Opens, scores and records quiz attempts.
#[derive(Clone)]
pub struct AssessmentService {
    clock: Clock,
    quizzes: Arc<dyn QuizRepository>,
    statistics: Arc<dyn StatisticsRepository>,
    progress: Arc<dyn ProgressRepository>,
    articles: Arc<dyn ArticleRepository>,
}

impl AssessmentService {
    #[must_use]
    pub fn new(
        clock: Clock,
        quizzes: Arc<dyn QuizRepository>,
        statistics: Arc<dyn StatisticsRepository>,
        progress: Arc<dyn ProgressRepository>,
        articles: Arc<dyn ArticleRepository>,
    ) -> Self {
        Self {
            clock,
            quizzes,
            statistics,
            progress,
            articles,
        }
    }

    /// Loads the article's quiz and starts a fresh session with no answers.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Unauthenticated` without a session,
    /// `ServiceError::NotFound` when the article has no questions, and
    /// `UnexpectedShape` if stored questions do not form a valid quiz.
    pub async fn open(
        &self,
        auth: &AuthContext,
        article: ArticleId,
    ) -> Result<QuizSession, ServiceError> {
        let user = auth.require_user()?;
        let questions = self.quizzes.questions_for_article(article).await?;
        if questions.is_empty() {
            tracing::warn!(article = %article, "no quiz for article");
            return Err(ServiceError::NotFound(format!("quiz for article {article}")));
        }

        let quiz = Quiz::new(article, questions)?;
        tracing::debug!(article = %article, questions = quiz.len(), "quiz opened");
        let mut session = QuizSession::new(user, quiz);
        session.begin();
        Ok(session)
    }

    /// Scores the session, then overwrites the user's progress and adds the
    /// attempt to the article's statistics in one store operation.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Unauthenticated` if nobody (or another user)
    /// is signed in, `ServiceError::AlreadyExists` if the session was already
    /// submitted, and `RemoteFailure` when the store fails; in that case nothing
    /// is recorded and the session stays in progress.
    pub async fn submit(
        &self,
        auth: &AuthContext,
        session: &mut QuizSession,
    ) -> Result<QuizOutcome, ServiceError> {
        let user = auth.require_user()?;
        if user != session.user {
            return Err(ServiceError::Unauthenticated);
        }
        if session.state != QuizState::InProgress {
            return Err(ServiceError::AlreadyExists("quiz submission".into()));
        }

        let outcome = session.quiz.score(&session.attempt);
        let article = outcome.article_id;

        let progress = UserProgress {
            user_id: user,
            article_id: article,
            test_passed: outcome.passed,
            updated_at: self.clock.now(),
        };
        let stats = self.statistics.record_submission(&progress).await?;

        tracing::info!(
            user = %user,
            article = %article,
            score = outcome.score,
            passed = outcome.passed,
            attempts = stats.total_attempts(),
            "quiz submitted"
        );

        session.state = QuizState::Submitted;
        session.outcome = Some(outcome.clone());
        Ok(outcome)
    }

    /// Aggregate counters for an article; zeros before the first attempt.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` when the store fails.
    pub async fn statistics(&self, article: ArticleId) -> Result<TestStatistics, ServiceError> {
        Ok(self
            .statistics
            .get_statistics(article)
            .await?
            .unwrap_or_else(|| TestStatistics::empty(article)))
    }

    /// Articles whose latest attempt by the signed-in user passed.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Unauthenticated` without a session.
    pub async fn passed_articles(
        &self,
        auth: &AuthContext,
    ) -> Result<HashSet<ArticleId>, ServiceError> {
        let user = auth.require_user()?;
        Ok(self
            .progress
            .list_progress(user)
            .await?
            .into_iter()
            .filter(|p| p.test_passed)
            .map(|p| p.article_id)
            .collect())
    }

    /// The signed-in user's progress with article titles, for a profile page.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Unauthenticated` without a session.
    pub async fn progress_overview(
        &self,
        auth: &AuthContext,
    ) -> Result<Vec<ProgressEntry>, ServiceError> {
        let user = auth.require_user()?;
        let rows = self.progress.list_progress(user).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let titles: HashMap<ArticleId, String> = self
            .articles
            .list_articles()
            .await?
            .into_iter()
            .map(|a| (a.id(), a.title().to_owned()))
            .collect();

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(title) = titles.get(&row.article_id) else {
                tracing::warn!(article = %row.article_id, "progress for unknown article");
                continue;
            };
            entries.push(ProgressEntry {
                article_id: row.article_id,
                article_title: title.clone(),
                test_passed: row.test_passed,
                updated_at: row.updated_at,
            });
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::model::{Difficulty, LearningArticle, QuizQuestion};
    use catalog_core::time::fixed_clock;
    use storage::repository::{InMemoryRepository, StorageError};

    use crate::error::ErrorKind;

    fn question(id: u64) -> QuizQuestion {
        let options = [("a", "First"), ("b", "Second")]
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        QuizQuestion::new(QuestionId::new(id), ArticleId::new(1), format!("Q{id}"), options, "a")
            .unwrap()
    }

    async fn seeded_repo() -> InMemoryRepository {
        let repo = InMemoryRepository::new();
        let article = LearningArticle::new(
            ArticleId::new(1),
            "Neural nets",
            "Ada",
            "Layers all the way down.",
            Difficulty::Advanced,
            "https://learn.example.com/nn",
        )
        .unwrap();
        repo.upsert_article(&article).await.unwrap();
        for id in 1..=4 {
            repo.upsert_question(&question(id)).await.unwrap();
        }
        repo
    }

    fn service_over(
        repo: &InMemoryRepository,
        statistics: Arc<dyn StatisticsRepository>,
    ) -> AssessmentService {
        AssessmentService::new(
            fixed_clock(),
            Arc::new(repo.clone()),
            statistics,
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        )
    }

    async fn service() -> AssessmentService {
        let repo = seeded_repo().await;
        service_over(&repo, Arc::new(repo.clone()))
    }

    fn answer(session: &mut QuizSession, keys: [&str; 4]) {
        for (id, key) in (1..=4).zip(keys) {
            session.choose(QuestionId::new(id), key).unwrap();
        }
    }

    #[tokio::test]
    async fn three_of_four_passes() {
        let service = service().await;
        let auth = AuthContext::signed_in(UserId::new_v4());
        let mut session = service.open(&auth, ArticleId::new(1)).await.unwrap();
        assert_eq!(session.state(), QuizState::InProgress);
        answer(&mut session, ["a", "a", "a", "b"]);

        let outcome = service.submit(&auth, &mut session).await.unwrap();
        assert_eq!(outcome.score, 75);
        assert!(outcome.passed);

        let stats = service.statistics(ArticleId::new(1)).await.unwrap();
        assert_eq!(stats.total_attempts(), 1);
        assert_eq!(stats.successful_passes(), 1);
    }

    #[tokio::test]
    async fn two_of_four_fails_and_keeps_passes() {
        let service = service().await;
        let auth = AuthContext::signed_in(UserId::new_v4());
        let mut session = service.open(&auth, ArticleId::new(1)).await.unwrap();
        answer(&mut session, ["a", "b", "a", "b"]);

        let outcome = service.submit(&auth, &mut session).await.unwrap();
        assert_eq!(outcome.score, 50);
        assert!(!outcome.passed);

        let stats = service.statistics(ArticleId::new(1)).await.unwrap();
        assert_eq!(stats.total_attempts(), 1);
        assert_eq!(stats.successful_passes(), 0);
    }

    #[tokio::test]
    async fn submitted_session_is_terminal() {
        let service = service().await;
        let auth = AuthContext::signed_in(UserId::new_v4());
        let mut session = service.open(&auth, ArticleId::new(1)).await.unwrap();
        service.submit(&auth, &mut session).await.unwrap();

        assert_eq!(session.state(), QuizState::Submitted);
        assert_eq!(session.outcome().map(|o| o.score), Some(0));
        assert_eq!(
            session.choose(QuestionId::new(1), "a"),
            Err(SessionError::NotInProgress(QuizState::Submitted))
        );
        let err = service.submit(&auth, &mut session).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(
            service
                .statistics(ArticleId::new(1))
                .await
                .unwrap()
                .total_attempts(),
            1
        );
    }

    #[tokio::test]
    async fn resubmission_overwrites_progress() {
        let service = service().await;
        let auth = AuthContext::signed_in(UserId::new_v4());

        let mut first = service.open(&auth, ArticleId::new(1)).await.unwrap();
        answer(&mut first, ["a", "a", "a", "a"]);
        service.submit(&auth, &mut first).await.unwrap();
        assert!(service.passed_articles(&auth).await.unwrap().contains(&ArticleId::new(1)));

        let mut second = service.open(&auth, ArticleId::new(1)).await.unwrap();
        service.submit(&auth, &mut second).await.unwrap();

        let overview = service.progress_overview(&auth).await.unwrap();
        assert_eq!(overview.len(), 1);
        assert_eq!(overview[0].article_title, "Neural nets");
        assert!(!overview[0].test_passed);
        assert!(service.passed_articles(&auth).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn article_without_questions_does_not_open() {
        let service = service().await;
        let auth = AuthContext::signed_in(UserId::new_v4());
        let err = service.open(&auth, ArticleId::new(2)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn unknown_option_is_rejected() {
        let service = service().await;
        let auth = AuthContext::signed_in(UserId::new_v4());
        let mut session = service.open(&auth, ArticleId::new(1)).await.unwrap();
        assert!(matches!(
            session.choose(QuestionId::new(1), "z"),
            Err(SessionError::Quiz(QuizError::UnknownOption { .. }))
        ));
        assert_eq!(session.answered(), 0);
    }

    #[tokio::test]
    async fn signed_out_user_cannot_submit() {
        let service = service().await;
        let mut auth = AuthContext::signed_in(UserId::new_v4());
        let mut session = service.open(&auth, ArticleId::new(1)).await.unwrap();
        auth.logout();

        let err = service.submit(&auth, &mut session).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
        assert_eq!(session.state(), QuizState::InProgress);
    }

    /// Statistics store that is unreachable.
    struct OfflineStatistics;

    #[async_trait::async_trait]
    impl StatisticsRepository for OfflineStatistics {
        async fn get_statistics(
            &self,
            _article: ArticleId,
        ) -> Result<Option<TestStatistics>, StorageError> {
            Err(StorageError::Connection("offline".into()))
        }

        async fn record_submission(
            &self,
            _progress: &UserProgress,
        ) -> Result<TestStatistics, StorageError> {
            Err(StorageError::Connection("offline".into()))
        }
    }

    #[tokio::test]
    async fn failed_submission_records_nothing_and_can_be_retried() {
        let repo = seeded_repo().await;
        let offline = service_over(&repo, Arc::new(OfflineStatistics));
        let user = UserId::new_v4();
        let auth = AuthContext::signed_in(user);

        let mut session = offline.open(&auth, ArticleId::new(1)).await.unwrap();
        answer(&mut session, ["a", "a", "a", "a"]);
        let err = offline.submit(&auth, &mut session).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteFailure);
        assert!(err.is_retryable());
        assert_eq!(session.state(), QuizState::InProgress);
        assert!(session.outcome().is_none());
        assert!(repo.get_progress(user, ArticleId::new(1)).await.unwrap().is_none());

        let online = service_over(&repo, Arc::new(repo.clone()));
        let outcome = online.submit(&auth, &mut session).await.unwrap();
        assert!(outcome.passed);
        assert!(repo.get_progress(user, ArticleId::new(1)).await.unwrap().unwrap().test_passed);
        assert_eq!(
            online
                .statistics(ArticleId::new(1))
                .await
                .unwrap()
                .total_attempts(),
            1
        );
    }
}
