//! Error taxonomy shared by every service.
//!
//! Collaborator failures are converted into one of five kinds at the service
//! boundary; transport and driver errors never reach callers as-is.

use thiserror::Error;

use catalog_core::model::{ArticleError, ItemError, QuizError, StatisticsError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Coarse classification a caller can branch on without inspecting payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthenticated,
    AlreadyExists,
    NotFound,
    RemoteFailure,
    UnexpectedShape,
}

/// Errors emitted by the catalog, save, assessment and news services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServiceError {
    #[error("no active user session")]
    Unauthenticated,
    #[error("{0} already exists")]
    AlreadyExists(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("remote failure: {0}")]
    RemoteFailure(String),
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),
}

impl ServiceError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::RemoteFailure(_) => ErrorKind::RemoteFailure,
            Self::UnexpectedShape(_) => ErrorKind::UnexpectedShape,
        }
    }

    /// Whether re-invoking the same action may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::RemoteFailure | ErrorKind::UnexpectedShape
        )
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => Self::NotFound("record".into()),
            StorageError::Conflict => Self::AlreadyExists("record".into()),
            StorageError::Connection(msg) => Self::RemoteFailure(msg),
            StorageError::Serialization(msg) => Self::UnexpectedShape(msg),
            other => Self::RemoteFailure(other.to_string()),
        }
    }
}

impl From<SqliteInitError> for ServiceError {
    fn from(err: SqliteInitError) -> Self {
        Self::RemoteFailure(err.to_string())
    }
}

// Core validation errors only surface here while rehydrating stored rows.
macro_rules! shape_error {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ServiceError {
                fn from(err: $ty) -> Self {
                    Self::UnexpectedShape(err.to_string())
                }
            }
        )*
    };
}

shape_error!(ItemError, ArticleError, QuizError, StatisticsError);
