//! Gridsift - Facet index
//!
//! Distinct values and numeric bounds per column. Facets are computed over
//! the full unfiltered dataset rather than cross-filtered, so each column
//! costs one O(rows) scan. Results are memoized per dataset version.

use lru::LruCache;
use serde::Serialize;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

use crate::data::Dataset;
use crate::schema::parse_number;

/// Suggestion entries the UI should render at most
pub const SUGGESTION_CAP: usize = 5000;

/// Columns kept in the facet cache before the least recently used is evicted
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Facet data for one column
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Facets {
    /// Distinct present values, sorted
    pub distinct: BTreeSet<String>,
    /// Smallest parseable value (numeric columns only)
    pub min: Option<f64>,
    /// Largest parseable value (numeric columns only)
    pub max: Option<f64>,
}

impl Facets {
    /// Number of distinct values
    pub fn unique_count(&self) -> usize {
        self.distinct.len()
    }

    /// Distinct values containing `typed` (case-insensitive), at most `limit`.
    pub fn suggestions(&self, typed: &str, limit: usize) -> Vec<&str> {
        let needle = typed.to_lowercase();
        self.distinct
            .iter()
            .filter(|v| needle.is_empty() || v.to_lowercase().contains(&needle))
            .take(limit)
            .map(String::as_str)
            .collect()
    }
}

/// Compute facets for `column` over every row of the dataset.
///
/// Returns empty facets for an unknown column.
pub fn compute_facets(dataset: &Dataset, column: &str) -> Facets {
    let Some(index) = dataset.column_index(column) else {
        return Facets::default();
    };
    let numeric = dataset.columns()[index].is_numeric();

    let mut facets = Facets::default();
    for value in dataset.rows().iter().filter_map(|row| row.cell(index)) {
        if numeric {
            if let Some(n) = parse_number(value) {
                facets.min = Some(facets.min.map_or(n, |m| m.min(n)));
                facets.max = Some(facets.max.map_or(n, |m| m.max(n)));
            }
        }
        if !facets.distinct.contains(value) {
            facets.distinct.insert(value.to_string());
        }
    }
    facets
}

/// LRU cache of facets keyed by (dataset version, column name)
pub struct FacetCache {
    entries: LruCache<(u64, String), Arc<Facets>>,
}

impl Default for FacetCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl FacetCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Facets for `column`, computing them on a miss
    pub fn get(&mut self, dataset: &Dataset, column: &str) -> Arc<Facets> {
        let key = (dataset.version(), column.to_string());
        if let Some(hit) = self.entries.get(&key) {
            return Arc::clone(hit);
        }
        debug!("Facet cache miss: {} (v{})", column, dataset.version());
        let facets = Arc::new(compute_facets(dataset, column));
        self.entries.put(key, Arc::clone(&facets));
        facets
    }

    /// Drop every entry; called when a new dataset is loaded
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Dataset {
        Dataset::from_records(vec![
            vec!["name".into(), "age".into()],
            vec!["Alice".into(), "30".into()],
            vec!["Bob".into(), "25".into()],
            vec!["Carol".into(), "40".into()],
            vec!["Bob".into(), "unknown".into()],
        ])
    }

    #[test]
    fn test_text_facets() {
        let facets = compute_facets(&people(), "name");
        assert_eq!(facets.unique_count(), 3);
        assert!(facets.distinct.contains("Carol"));
        assert_eq!(facets.min, None);
        assert_eq!(facets.max, None);
    }

    #[test]
    fn test_numeric_bounds_skip_unparseable() {
        let facets = compute_facets(&people(), "age");
        assert_eq!(facets.min, Some(25.0));
        assert_eq!(facets.max, Some(40.0));
        assert!(facets.distinct.contains("unknown"));
    }

    #[test]
    fn test_unknown_column() {
        assert_eq!(compute_facets(&people(), "missing"), Facets::default());
    }

    #[test]
    fn test_suggestions_capped_and_case_insensitive() {
        let facets = compute_facets(&people(), "name");
        assert_eq!(facets.suggestions("O", 10), vec!["Bob", "Carol"]);
        assert_eq!(facets.suggestions("", 2), vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_cache_keyed_by_version() {
        let mut cache = FacetCache::default();
        let first = people();
        let a = cache.get(&first, "name");
        let b = cache.get(&first, "name");
        assert!(Arc::ptr_eq(&a, &b));

        let second = people();
        let c = cache.get(&second, "name");
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }
}
