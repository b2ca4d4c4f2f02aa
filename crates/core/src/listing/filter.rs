use std::collections::HashSet;

use super::Listing;

/// Facet selector: everything, or rows whose facet equals the value exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FacetFilter {
    #[default]
    All,
    Exact(String),
}

impl FacetFilter {
    /// Parses a selector coming from a form field or query string.
    ///
    /// The empty string and the exact legacy sentinel `"all"` select
    /// everything; any other value, including `"All"`, is an exact facet.
    #[must_use]
    pub fn from_param(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "all" {
            Self::All
        } else {
            Self::Exact(trimmed.to_owned())
        }
    }

    #[must_use]
    pub fn matches(&self, facet: Option<&str>) -> bool {
        match self {
            FacetFilter::All => true,
            FacetFilter::Exact(want) => facet == Some(want.as_str()),
        }
    }
}

/// Rows whose title contains `query` (case-insensitive substring) and whose
/// facet passes `facet`. Input order is preserved.
#[must_use]
pub fn filter<'a, T: Listing>(items: &'a [T], query: &str, facet: &FacetFilter) -> Vec<&'a T> {
    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|item| needle.is_empty() || item.title().to_lowercase().contains(&needle))
        .filter(|item| facet.matches(item.facet()))
        .collect()
}

/// Distinct facet values in first-seen order.
#[must_use]
pub fn facets<T: Listing>(items: &[T]) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(Listing::facet)
        .filter(|value| seen.insert(*value))
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Row(u32, &'static str, &'static str);

    impl Listing for Row {
        type Id = u32;

        fn listing_id(&self) -> u32 {
            self.0
        }

        fn title(&self) -> &str {
            self.1
        }

        fn facet(&self) -> Option<&str> {
            Some(self.2)
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row(1, "ChatGPT", "Text"),
            Row(2, "Midjourney", "Images"),
            Row(3, "GitHub Copilot", "Code"),
            Row(4, "Claude Chat", "Text"),
        ]
    }

    #[test]
    fn query_matches_case_insensitive_substring() {
        let rows = rows();
        let ids: Vec<u32> = filter(&rows, "CHAT", &FacetFilter::All)
            .iter()
            .map(|r| r.0)
            .collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn facet_and_query_are_anded() {
        let rows = rows();
        let hits = filter(&rows, "c", &FacetFilter::Exact("Code".into()));
        assert_eq!(hits, vec![&rows[2]]);
    }

    #[test]
    fn facet_match_is_exact() {
        let rows = rows();
        assert!(filter(&rows, "", &FacetFilter::Exact("text".into())).is_empty());
    }

    #[test]
    fn from_param_treats_blank_and_all_as_everything() {
        assert_eq!(FacetFilter::from_param(""), FacetFilter::All);
        assert_eq!(FacetFilter::from_param("all"), FacetFilter::All);
        assert_eq!(
            FacetFilter::from_param(" Code "),
            FacetFilter::Exact("Code".into())
        );
    }

    #[test]
    fn capitalized_all_is_a_real_facet() {
        let mut rows = rows();
        rows.push(Row(5, "Zapier", "All"));
        let filter_all = FacetFilter::from_param("All");
        assert_eq!(filter_all, FacetFilter::Exact("All".into()));
        assert_eq!(filter(&rows, "", &filter_all), vec![&rows[4]]);
    }

    #[test]
    fn facets_are_distinct_in_first_seen_order() {
        assert_eq!(facets(&rows()), vec!["Text", "Images", "Code"]);
    }
}
