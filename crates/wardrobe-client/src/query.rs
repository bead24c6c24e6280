//! List-view query state: combined search/filter/pagination.
//!
//! A single page-size constant is shared between request composition and
//! the total-page-count computation. Any filter change resets the page to
//! 1 so a narrowed result set can never request an out-of-range page.
//! Each state change bumps a generation counter; responses that come back
//! for a stale generation are discarded instead of overwriting newer
//! state.

use std::collections::BTreeMap;

use crate::error::ErrorKey;

/// Page size shared by requests and page-count computation.
pub const PAGE_SIZE: u32 = 10;

/// `ceil(count / PAGE_SIZE)`.
pub fn page_count(count: u64) -> u32 {
    count.div_ceil(PAGE_SIZE as u64) as u32
}

/// Filter and pagination state for one list view.
#[derive(Debug, Clone)]
pub struct ListQuery {
    search: String,
    filters: BTreeMap<String, String>,
    page: u32,
    generation: u64,
}

impl ListQuery {
    pub fn new() -> Self {
        Self {
            search: String::new(),
            filters: BTreeMap::new(),
            page: 1,
            generation: 0,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn filter(&self, name: &str) -> Option<&str> {
        self.filters.get(name).map(|v| v.as_str())
    }

    /// Replace the free-text search. Resets the page to 1.
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.reset_page();
    }

    /// Set a structured filter. Resets the page to 1.
    pub fn set_filter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.filters.insert(name.into(), value.into());
        self.reset_page();
    }

    /// Remove one structured filter. Resets the page to 1.
    pub fn remove_filter(&mut self, name: &str) {
        self.filters.remove(name);
        self.reset_page();
    }

    /// Drop search and all structured filters. Resets the page to 1.
    pub fn clear_filters(&mut self) {
        self.search.clear();
        self.filters.clear();
        self.reset_page();
    }

    /// Move to a 1-based page.
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
        self.generation += 1;
    }

    fn reset_page(&mut self) {
        self.page = 1;
        self.generation += 1;
    }

    /// Query parameters for the list request. Empty values are dropped,
    /// matching what the server expects.
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![("page".to_string(), self.page.to_string())];
        if !self.search.is_empty() {
            params.push(("search".to_string(), self.search.clone()));
        }
        for (name, value) in &self.filters {
            if !value.is_empty() {
                params.push((name.clone(), value.clone()));
            }
        }
        params
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new()
    }
}

/// A fetched page, or the keyed error that replaced it.
#[derive(Debug)]
pub enum ListOutcome<T> {
    Loaded { results: Vec<T>, page_count: u32 },
    Failed(ErrorKey),
}

/// Reconciles fetched pages with view state.
///
/// `begin` snapshots the query generation before a fetch; `apply` installs
/// the outcome only if no newer fetch has started since. A failed fetch is
/// a distinct error state, not an empty result set.
#[derive(Debug)]
pub struct ListView<T> {
    results: Vec<T>,
    page_count: u32,
    error: Option<ErrorKey>,
    current: u64,
}

impl<T> ListView<T> {
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
            page_count: 0,
            error: None,
            current: 0,
        }
    }

    /// Start a fetch for the query's current state; returns the generation
    /// to hand back to [`ListView::apply`].
    pub fn begin(&mut self, query: &ListQuery) -> u64 {
        self.current = query.generation();
        self.error = None;
        self.current
    }

    /// Install a fetch outcome. Returns false (and changes nothing) when
    /// the outcome belongs to a superseded generation.
    pub fn apply(&mut self, generation: u64, outcome: ListOutcome<T>) -> bool {
        if generation != self.current {
            tracing::debug!(generation, current = self.current, "discarding stale list response");
            return false;
        }
        match outcome {
            ListOutcome::Loaded {
                results,
                page_count,
            } => {
                self.results = results;
                self.page_count = page_count;
                self.error = None;
            }
            ListOutcome::Failed(key) => {
                self.error = Some(key);
            }
        }
        true
    }

    pub fn results(&self) -> &[T] {
        &self.results
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn error(&self) -> Option<ErrorKey> {
        self.error
    }
}

impl<T> Default for ListView<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0), 0);
        assert_eq!(page_count(1), 1);
        assert_eq!(page_count(10), 1);
        assert_eq!(page_count(11), 2);
        assert_eq!(page_count(20), 2);
        assert_eq!(page_count(95), 10);
    }

    #[test]
    fn test_filter_change_resets_page() {
        let mut query = ListQuery::new();
        query.set_page(4);
        assert_eq!(query.page(), 4);

        query.set_filter("category", "HAT");
        assert_eq!(query.page(), 1);

        query.set_page(3);
        query.set_search("boa");
        assert_eq!(query.page(), 1);

        query.set_page(2);
        query.clear_filters();
        assert_eq!(query.page(), 1);
    }

    #[test]
    fn test_params_skip_empty_values() {
        let mut query = ListQuery::new();
        query.set_search("tutu");
        query.set_filter("category", "TUT");
        query.set_filter("location", "");
        query.set_page(2);

        let params = query.params();
        assert!(params.contains(&("page".to_string(), "2".to_string())));
        assert!(params.contains(&("search".to_string(), "tutu".to_string())));
        assert!(params.contains(&("category".to_string(), "TUT".to_string())));
        assert!(!params.iter().any(|(name, _)| name == "location"));
    }

    #[test]
    fn test_page_clamped_to_one() {
        let mut query = ListQuery::new();
        query.set_page(0);
        assert_eq!(query.page(), 1);
    }

    #[test]
    fn test_stale_response_discarded() {
        let mut query = ListQuery::new();
        let mut view: ListView<&str> = ListView::new();

        // First fetch starts, then the filter changes and a second fetch
        // starts before the first completes.
        let first = view.begin(&query);
        query.set_filter("category", "WIG");
        let second = view.begin(&query);

        // The newer response lands first.
        assert!(view.apply(
            second,
            ListOutcome::Loaded {
                results: vec!["wig"],
                page_count: 1,
            },
        ));
        // The slow earlier response must not overwrite it.
        assert!(!view.apply(
            first,
            ListOutcome::Loaded {
                results: vec!["everything"],
                page_count: 7,
            },
        ));

        assert_eq!(view.results(), &["wig"]);
        assert_eq!(view.page_count(), 1);
    }

    #[test]
    fn test_error_state_distinct_from_empty() {
        let mut query = ListQuery::new();
        let mut view: ListView<&str> = ListView::new();

        let generation = view.begin(&query);
        assert!(view.apply(generation, ListOutcome::Failed(ErrorKey::LoadItemsFailed)));
        assert_eq!(view.error(), Some(ErrorKey::LoadItemsFailed));

        // A later successful fetch clears the error.
        query.set_page(1);
        let generation = view.begin(&query);
        assert!(view.apply(
            generation,
            ListOutcome::Loaded {
                results: vec![],
                page_count: 0,
            },
        ));
        assert!(view.error().is_none());
        assert!(view.results().is_empty());
    }
}
