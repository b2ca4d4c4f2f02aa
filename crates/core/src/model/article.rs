use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::listing::Listing;
use crate::model::ids::ArticleId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ArticleError {
    #[error("article title cannot be empty")]
    EmptyTitle,

    #[error("unknown difficulty level: {0}")]
    UnknownDifficulty(String),

    #[error("invalid article url: {0}")]
    InvalidUrl(String),
}

/// Difficulty level of a learning article, used as its filter facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ArticleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            _ => Err(ArticleError::UnknownDifficulty(s.to_owned())),
        }
    }
}

/// A learning article that may own a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LearningArticle {
    id: ArticleId,
    title: String,
    author: String,
    content: String,
    difficulty: Difficulty,
    source_url: Url,
}

impl LearningArticle {
    /// # Errors
    ///
    /// Returns `ArticleError::EmptyTitle` for a blank title and
    /// `ArticleError::InvalidUrl` if the source url does not parse.
    pub fn new(
        id: ArticleId,
        title: impl Into<String>,
        author: impl Into<String>,
        content: impl Into<String>,
        difficulty: Difficulty,
        source_url: &str,
    ) -> Result<Self, ArticleError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(ArticleError::EmptyTitle);
        }
        let source_url =
            Url::parse(source_url.trim()).map_err(|e| ArticleError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            id,
            title,
            author: author.into().trim().to_owned(),
            content: content.into(),
            difficulty,
            source_url,
        })
    }

    #[must_use]
    pub fn id(&self) -> ArticleId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn source_url(&self) -> &Url {
        &self.source_url
    }

    /// First `max_chars` characters of the content, with a trailing ellipsis
    /// when anything was cut off.
    #[must_use]
    pub fn excerpt(&self, max_chars: usize) -> String {
        match self.content.char_indices().nth(max_chars) {
            Some((cut, _)) => format!("{}...", &self.content[..cut]),
            None => self.content.clone(),
        }
    }
}

impl Listing for LearningArticle {
    type Id = ArticleId;

    fn listing_id(&self) -> ArticleId {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn facet(&self) -> Option<&str> {
        Some(self.difficulty.as_str())
    }
}
