//! Listing state
//!
//! A [`QueryState`] is never edited in place by callers that share it: they
//! describe the change as a [`QueryStateDelta`] and get a new state back.

use serde::{Deserialize, Serialize};
use ud_core::{PaginationParams, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};

use crate::filters::RuleSet;
use crate::sorts::SortSpec;

/// Page, size, sort, search and rules of one listing view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryState {
    /// 1-based page number
    pub page: u32,
    pub size: u32,
    pub sort: SortSpec,
    /// Free-text search, never `Some("")`
    pub search: Option<String>,
    pub rules: RuleSet,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
            sort: SortSpec::default(),
            search: None,
            rules: RuleSet::new(),
        }
    }
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size.max(1);
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = normalize_search(search.into());
        self
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Pagination parameters for this view
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.size)
    }

    /// New state with the delta applied.
    ///
    /// Changing the search, rules or sort sends the view back to page 1
    /// unless the delta names a page itself.
    pub fn apply(&self, delta: QueryStateDelta) -> QueryState {
        let resets_page = delta.search.is_some() || delta.rules.is_some() || delta.sort.is_some();
        let mut next = self.clone();

        if let Some(size) = delta.size {
            next.size = size.max(1);
        }
        if let Some(sort) = delta.sort {
            next.sort = sort;
        }
        if let Some(search) = delta.search {
            next.search = normalize_search(search);
        }
        if let Some(rules) = delta.rules {
            next.rules = rules;
        }
        next.page = match delta.page {
            Some(page) => page.max(1),
            None if resets_page => DEFAULT_PAGE,
            None => self.page,
        };
        next
    }
}

fn normalize_search(search: String) -> Option<String> {
    if search.is_empty() {
        None
    } else {
        Some(search)
    }
}

/// A partial update to a [`QueryState`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryStateDelta {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<SortSpec>,
    /// `Some("")` clears the search
    pub search: Option<String>,
    pub rules: Option<RuleSet>,
}

impl QueryStateDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn rules(mut self, rules: RuleSet) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
