use super::{FacetFilter, SortKey, total_pages};

/// User-controlled inputs of one list view.
///
/// Changing the query, facet or sort key sends the view back to page 1, so a
/// page number from a previous result set is never applied to a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState {
    query: String,
    facet: FacetFilter,
    sort: SortKey,
    page: usize,
    page_size: usize,
}

impl ListState {
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            query: String::new(),
            facet: FacetFilter::All,
            sort: SortKey::None,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn facet(&self) -> &FacetFilter {
        &self.facet
    }

    #[must_use]
    pub fn sort(&self) -> SortKey {
        self.sort
    }

    #[must_use]
    pub fn page(&self) -> usize {
        self.page
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if query != self.query {
            self.query = query;
            self.page = 1;
        }
    }

    pub fn set_facet(&mut self, facet: FacetFilter) {
        if facet != self.facet {
            self.facet = facet;
            self.page = 1;
        }
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        if sort != self.sort {
            self.sort = sort;
            self.page = 1;
        }
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        let page_size = page_size.max(1);
        if page_size != self.page_size {
            self.page_size = page_size;
            self.page = 1;
        }
    }

    /// Moves to `page`, clamped to `1..=total_pages(total_items)`.
    pub fn go_to(&mut self, page: usize, total_items: usize) {
        let last = total_pages(total_items, self.page_size);
        self.page = page.clamp(1, last);
    }

    pub fn next(&mut self, total_items: usize) {
        self.go_to(self.page.saturating_add(1), total_items);
    }

    pub fn previous(&mut self, total_items: usize) {
        self.go_to(self.page.saturating_sub(1), total_items);
    }
}

impl Default for ListState {
    fn default() -> Self {
        Self::new(10)
    }
}
