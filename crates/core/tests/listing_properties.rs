use catalog_core::listing::{FacetFilter, Listing, page_window, paginate, total_pages, filter};
use proptest::prelude::*;

#[derive(Debug, Clone, PartialEq)]
struct Row {
    id: usize,
    title: String,
    category: String,
}

impl Listing for Row {
    type Id = usize;

    fn listing_id(&self) -> usize {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn facet(&self) -> Option<&str> {
        Some(&self.category)
    }
}

fn rows() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(("[a-zA-Z ]{0,12}", "(Text|Code|Images)"), 0..40).prop_map(|pairs| {
        pairs
            .into_iter()
            .enumerate()
            .map(|(id, (title, category))| Row {
                id,
                title,
                category,
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn filter_returns_ordered_subset_matching_query(rows in rows(), query in "[a-zA-Z]{0,3}") {
        let hits = filter(&rows, &query, &FacetFilter::All);
        let needle = query.to_lowercase();

        for hit in &hits {
            prop_assert!(hit.title.to_lowercase().contains(&needle));
        }
        let ids: Vec<usize> = hits.iter().map(|r| r.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        prop_assert_eq!(&ids, &sorted);

        let again: Vec<usize> = filter(&rows, &query, &FacetFilter::All)
            .iter()
            .map(|r| r.id)
            .collect();
        prop_assert_eq!(ids, again);
    }

    #[test]
    fn pages_partition_the_input(n in 0usize..200, page_size in 1usize..25) {
        let items: Vec<usize> = (0..n).collect();
        let pages = total_pages(n, page_size);
        prop_assert_eq!(pages, n.div_ceil(page_size).max(1));

        let mut seen = Vec::new();
        for page in 1..=pages {
            let chunk = paginate(&items, page_size, page);
            prop_assert!(chunk.items.len() <= page_size);
            seen.extend(chunk.items);
        }
        prop_assert_eq!(seen, items);
    }

    #[test]
    fn window_is_bounded_and_contains_current(total in 1usize..60, pick in 0usize..60) {
        let current = pick % total + 1;
        let window = page_window(total, current);

        prop_assert!(window.len() == total.min(5));
        prop_assert!(window.contains(&current));
        prop_assert!(window.iter().all(|p| (1..=total).contains(p)));
        prop_assert!(window.windows(2).all(|w| w[1] == w[0] + 1));
    }
}
