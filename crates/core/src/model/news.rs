use serde::Serialize;

use crate::listing::Listing;

/// A news entry reported by the external news source.
///
/// News entries carry no stable id; their url doubles as one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsArticle {
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub source_name: String,
}

impl Listing for NewsArticle {
    type Id = String;

    fn listing_id(&self) -> String {
        self.url.clone()
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn facet(&self) -> Option<&str> {
        Some(&self.source_name)
    }
}
