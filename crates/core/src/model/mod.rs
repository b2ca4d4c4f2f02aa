mod article;
mod ids;
mod item;
mod news;
mod quiz;
mod saved;
mod stats;

pub use ids::{ArticleId, ItemId, ParseIdError, QuestionId, UserId};

pub use article::{ArticleError, Difficulty, LearningArticle};
pub use item::{Item, ItemError};
pub use news::NewsArticle;
pub use quiz::{
    PASS_THRESHOLD, QuestionReview, Quiz, QuizAttempt, QuizError, QuizOutcome, QuizQuestion,
    percent,
};
pub use saved::SavedRelation;
pub use stats::{StatisticsError, TestStatistics, UserProgress};
