use serde::Serialize;

/// Number of page buttons shown at once.
pub const PAGE_WINDOW: usize = 5;

/// `ceil(count / page_size)`, never less than 1. A zero page size is treated as 1.
#[must_use]
pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}

/// Page numbers to render as buttons, at most `PAGE_WINDOW` of them.
///
/// The window is centred on `current_page` and clamps to the first or last
/// pages near either end.
#[must_use]
pub fn page_window(total_pages: usize, current_page: usize) -> Vec<usize> {
    let half = PAGE_WINDOW / 2;
    let start = if total_pages <= PAGE_WINDOW || current_page <= half + 1 {
        1
    } else if current_page + half >= total_pages {
        total_pages - PAGE_WINDOW + 1
    } else {
        current_page - half
    };
    let end = (start + PAGE_WINDOW - 1).min(total_pages);
    (start..=end).collect()
}

/// Position of one page within a result set of known size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub current_page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub window: Vec<usize>,
}

impl PageInfo {
    /// Builds page info from a total count, which may come from a remote
    /// source rather than a local collection.
    #[must_use]
    pub fn new(total_items: usize, page_size: usize, current_page: usize) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_pages(total_items, page_size);
        Self {
            current_page,
            page_size,
            total_items,
            total_pages,
            window: page_window(total_pages, current_page),
        }
    }

    #[must_use]
    pub fn is_in_range(&self) -> bool {
        (1..=self.total_pages).contains(&self.current_page)
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.current_page > 1 && self.is_in_range()
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages && self.current_page >= 1
    }

    /// Zero-based index of the first row on this page.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.current_page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

/// One page of an ordered result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub info: PageInfo,
}

impl<T> Page<T> {
    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.info.total_pages
    }
}

/// Slices `ordered` into the `current_page`-th page (1-based).
///
/// Out-of-range pages, including page 0, yield an empty page rather than an
/// error.
#[must_use]
pub fn paginate<T: Clone>(ordered: &[T], page_size: usize, current_page: usize) -> Page<T> {
    let info = PageInfo::new(ordered.len(), page_size, current_page);
    let items = if current_page == 0 {
        Vec::new()
    } else {
        let start = info.offset().min(ordered.len());
        let end = start.saturating_add(info.page_size).min(ordered.len());
        ordered[start..end].to_vec()
    };
    Page { items, info }
}
