use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::ids::{ArticleId, UserId};
use crate::model::quiz::percent;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StatisticsError {
    #[error("successful passes ({passes}) exceed total attempts ({attempts})")]
    PassesExceedAttempts { passes: u32, attempts: u32 },
}

/// Aggregate attempt counters for one article's test.
///
/// Invariant: `successful_passes <= total_attempts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TestStatistics {
    article_id: ArticleId,
    total_attempts: u32,
    successful_passes: u32,
}

impl TestStatistics {
    /// Statistics for an article nobody has attempted yet.
    #[must_use]
    pub fn empty(article_id: ArticleId) -> Self {
        Self {
            article_id,
            total_attempts: 0,
            successful_passes: 0,
        }
    }

    /// Rehydrate counters from storage.
    ///
    /// # Errors
    ///
    /// Returns `StatisticsError::PassesExceedAttempts` if the invariant is broken.
    pub fn from_persisted(
        article_id: ArticleId,
        total_attempts: u32,
        successful_passes: u32,
    ) -> Result<Self, StatisticsError> {
        if successful_passes > total_attempts {
            return Err(StatisticsError::PassesExceedAttempts {
                passes: successful_passes,
                attempts: total_attempts,
            });
        }
        Ok(Self {
            article_id,
            total_attempts,
            successful_passes,
        })
    }

    /// Applies one completed attempt.
    pub fn record(&mut self, passed: bool) {
        self.total_attempts = self.total_attempts.saturating_add(1);
        if passed {
            self.successful_passes = self.successful_passes.saturating_add(1);
        }
    }

    #[must_use]
    pub fn article_id(&self) -> ArticleId {
        self.article_id
    }

    #[must_use]
    pub fn total_attempts(&self) -> u32 {
        self.total_attempts
    }

    #[must_use]
    pub fn successful_passes(&self) -> u32 {
        self.successful_passes
    }

    /// Share of passing attempts as a rounded percentage.
    #[must_use]
    pub fn pass_rate(&self) -> u8 {
        percent(
            self.successful_passes as usize,
            self.total_attempts as usize,
        )
    }
}

/// Outcome of a user's most recent attempt at an article's test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProgress {
    pub user_id: UserId,
    pub article_id: ArticleId,
    pub test_passed: bool,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_counts_attempts_and_passes() {
        let mut stats = TestStatistics::empty(ArticleId::new(3));
        stats.record(true);
        stats.record(false);
        stats.record(true);
        assert_eq!(stats.total_attempts(), 3);
        assert_eq!(stats.successful_passes(), 2);
        assert_eq!(stats.pass_rate(), 67);
    }

    #[test]
    fn from_persisted_rejects_broken_invariant() {
        let err = TestStatistics::from_persisted(ArticleId::new(1), 1, 2).unwrap_err();
        assert_eq!(
            err,
            StatisticsError::PassesExceedAttempts {
                passes: 2,
                attempts: 1
            }
        );
    }

    #[test]
    fn empty_statistics_have_zero_rate() {
        assert_eq!(TestStatistics::empty(ArticleId::new(1)).pass_rate(), 0);
    }
}
