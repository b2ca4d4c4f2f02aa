use thiserror::Error;

use crate::model::{ArticleError, ItemError, QuizError, StatisticsError};

/// Any validation failure raised while building domain values.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Item(#[from] ItemError),
    #[error(transparent)]
    Article(#[from] ArticleError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Statistics(#[from] StatisticsError),
}
