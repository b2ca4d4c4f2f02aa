use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use thiserror::Error;

use super::Listing;
use crate::model::ItemId;

/// Ordering applied after filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Keep the filtered order.
    #[default]
    None,
    /// Most-saved first.
    Popularity,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown sort key: {0}")]
pub struct ParseSortKeyError(String);

impl FromStr for SortKey {
    type Err = ParseSortKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Ok(SortKey::None),
            "popularity" => Ok(SortKey::Popularity),
            other => Err(ParseSortKeyError(other.to_owned())),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::None => Ok(()),
            SortKey::Popularity => f.write_str("popularity"),
        }
    }
}

/// Per-row popularity counter. Rows without an entry count as 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popularity<K: Eq + Hash> {
    counts: HashMap<K, u32>,
}

/// "Saved by N users" counts for catalog items.
pub type SaveCounts = Popularity<ItemId>;

impl<K: Eq + Hash> Default for Popularity<K> {
    fn default() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> Popularity<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &K) -> u32 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn set(&mut self, key: K, count: u32) {
        if count == 0 {
            self.counts.remove(&key);
        } else {
            self.counts.insert(key, count);
        }
    }

    pub fn increment(&mut self, key: K) {
        let entry = self.counts.entry(key).or_insert(0);
        *entry = entry.saturating_add(1);
    }

    pub fn decrement(&mut self, key: &K) {
        if let Some(count) = self.counts.get_mut(key) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.counts.remove(key);
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl<K: Eq + Hash> FromIterator<(K, u32)> for Popularity<K> {
    fn from_iter<I: IntoIterator<Item = (K, u32)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (key, count) in iter {
            out.set(key, count);
        }
        out
    }
}

/// Returns a reordered copy of `rows`; the input slice is untouched.
///
/// The sort is stable, so ties keep their filtered order.
#[must_use]
pub fn sort<'a, T: Listing>(
    rows: &[&'a T],
    key: SortKey,
    popularity: &Popularity<T::Id>,
) -> Vec<&'a T> {
    let mut out = rows.to_vec();
    if key == SortKey::Popularity {
        out.sort_by_key(|row| Reverse(popularity.get(&row.listing_id())));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row(u64);

    impl Listing for Row {
        type Id = u64;

        fn listing_id(&self) -> u64 {
            self.0
        }

        fn title(&self) -> &str {
            ""
        }

        fn facet(&self) -> Option<&str> {
            None
        }
    }

    #[test]
    fn popularity_sorts_descending_and_keeps_ties_stable() {
        let rows = [Row(1), Row(2), Row(3), Row(4)];
        let refs: Vec<&Row> = rows.iter().collect();
        let counts: Popularity<u64> = [(2, 5), (3, 1), (4, 5)].into_iter().collect();

        let sorted = sort(&refs, SortKey::Popularity, &counts);
        let ids: Vec<u64> = sorted.iter().map(|r| r.0).collect();
        assert_eq!(ids, vec![2, 4, 3, 1]);

        let original: Vec<u64> = refs.iter().map(|r| r.0).collect();
        assert_eq!(original, vec![1, 2, 3, 4]);
    }

    #[test]
    fn no_key_is_identity() {
        let rows = [Row(3), Row(1), Row(2)];
        let refs: Vec<&Row> = rows.iter().collect();
        let counts: Popularity<u64> = [(1, 9)].into_iter().collect();
        let ids: Vec<u64> = sort(&refs, SortKey::None, &counts)
            .iter()
            .map(|r| r.0)
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn sort_key_parses_known_values_only() {
        assert_eq!("".parse::<SortKey>().unwrap(), SortKey::None);
        assert_eq!("popularity".parse::<SortKey>().unwrap(), SortKey::Popularity);
        assert!("newest".parse::<SortKey>().is_err());
    }

    #[test]
    fn counters_drop_to_zero() {
        let mut counts = SaveCounts::new();
        counts.increment(ItemId::new(1));
        counts.increment(ItemId::new(1));
        counts.decrement(&ItemId::new(1));
        assert_eq!(counts.get(&ItemId::new(1)), 1);
        counts.decrement(&ItemId::new(1));
        counts.decrement(&ItemId::new(1));
        assert_eq!(counts.get(&ItemId::new(1)), 0);
        assert!(counts.is_empty());
    }
}
