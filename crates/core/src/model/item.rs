use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::listing::Listing;
use crate::model::ids::ItemId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ItemError {
    #[error("item title cannot be empty")]
    EmptyTitle,

    #[error("item category cannot be empty")]
    EmptyCategory,

    #[error("invalid item link: {0}")]
    InvalidLink(String),
}

//
// ─── ITEM ──────────────────────────────────────────────────────────────────────
//

/// A catalog entry (an AI tool).
///
/// Items are immutable once fetched; the authoritative copy lives in the
/// backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    id: ItemId,
    title: String,
    description: String,
    category: String,
    price: String,
    link: Url,
}

impl Item {
    /// Creates a new item.
    ///
    /// Title and category are trimmed; the link must be an absolute URL.
    ///
    /// # Errors
    ///
    /// Returns `ItemError` if the title or category is blank, or the link
    /// does not parse.
    pub fn new(
        id: ItemId,
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        price: impl Into<String>,
        link: &str,
    ) -> Result<Self, ItemError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(ItemError::EmptyTitle);
        }
        let category = category.into().trim().to_owned();
        if category.is_empty() {
            return Err(ItemError::EmptyCategory);
        }
        let link = Url::parse(link.trim()).map_err(|e| ItemError::InvalidLink(e.to_string()))?;

        Ok(Self {
            id,
            title,
            description: description.into().trim().to_owned(),
            category,
            price: price.into().trim().to_owned(),
            link,
        })
    }

    #[must_use]
    pub fn id(&self) -> ItemId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Free-form price label ("Free", "From $20/mo", ...).
    #[must_use]
    pub fn price(&self) -> &str {
        &self.price
    }

    #[must_use]
    pub fn link(&self) -> &Url {
        &self.link
    }
}

impl Listing for Item {
    type Id = ItemId;

    fn listing_id(&self) -> ItemId {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn facet(&self) -> Option<&str> {
        Some(&self.category)
    }
}
