//! Filter → sort → paginate pipeline shared by the catalog, learning and news views.

mod filter;
mod paginate;
mod sort;
mod state;
mod store;

use std::fmt::Debug;
use std::hash::Hash;

pub use filter::{FacetFilter, facets, filter};
pub use paginate::{PAGE_WINDOW, Page, PageInfo, page_window, paginate, total_pages};
pub use sort::{ParseSortKeyError, Popularity, SaveCounts, SortKey, sort};
pub use state::ListState;
pub use store::{ItemStore, ListPage};

/// What the list pipeline needs to know about a row.
pub trait Listing {
    type Id: Clone + Eq + Hash + Debug;

    fn listing_id(&self) -> Self::Id;

    /// Text matched by the search query.
    fn title(&self) -> &str;

    /// Value matched by the facet filter (category, difficulty, source).
    fn facet(&self) -> Option<&str>;
}
