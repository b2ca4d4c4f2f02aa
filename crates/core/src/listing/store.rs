use serde::Serialize;

use super::{ListState, Listing, PageInfo, Popularity, facets, filter, paginate, sort};

/// Full collection behind one list view, plus its popularity counters.
///
/// Facet values are derived once per collection change.
#[derive(Debug, Clone)]
pub struct ItemStore<T: Listing> {
    items: Vec<T>,
    popularity: Popularity<T::Id>,
    facets: Vec<String>,
}

/// Rendered page of a list view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListPage<'a, T> {
    pub items: Vec<&'a T>,
    /// Rows matching the filter, across all pages.
    pub total_matches: usize,
    pub info: PageInfo,
}

impl<T: Listing> ItemStore<T> {
    #[must_use]
    pub fn new(items: Vec<T>, popularity: Popularity<T::Id>) -> Self {
        let facets = facets(&items);
        Self {
            items,
            popularity,
            facets,
        }
    }

    /// Replaces the collection and recomputes facets.
    pub fn replace_items(&mut self, items: Vec<T>) {
        self.facets = facets(&items);
        self.items = items;
    }

    pub fn set_popularity(&mut self, popularity: Popularity<T::Id>) {
        self.popularity = popularity;
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn facets(&self) -> &[String] {
        &self.facets
    }

    #[must_use]
    pub fn popularity_of(&self, id: &T::Id) -> u32 {
        self.popularity.get(id)
    }

    /// Rows matching the current query and facet, in sorted order.
    #[must_use]
    pub fn matching(&self, state: &ListState) -> Vec<&T> {
        let filtered = filter(&self.items, state.query(), state.facet());
        sort(&filtered, state.sort(), &self.popularity)
    }

    /// Runs filter → sort → paginate for the given view state.
    #[must_use]
    pub fn render(&self, state: &ListState) -> ListPage<'_, T> {
        let ordered = self.matching(state);
        let page = paginate(&ordered, state.page_size(), state.page());
        ListPage {
            items: page.items,
            total_matches: ordered.len(),
            info: page.info,
        }
    }
}
