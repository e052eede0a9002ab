//! Pagination types for the users API
//!
//! Pages are 1-indexed. The API reports `{ total, page, size, pages }` in the
//! `meta` block of every listing response.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Pagination parameters (from the location query string)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: u32,

    /// Items per page
    #[serde(default = "default_size")]
    pub size: u32,
}

fn default_page() -> u32 {
    DEFAULT_PAGE
}

fn default_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginationParams {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page: page.max(1),
            size: size.max(1),
        }
    }

    /// Zero-based index of the first item on this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.size)
    }
}

/// Pagination block of a listing response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageMeta {
    /// Rows matching the applied filters
    pub total: u64,
    pub page: u32,
    pub size: u32,
    pub pages: u32,
}

/// One slot of the page picker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSlot {
    Page(u32),
    Ellipsis,
}

const MAX_VISIBLE_PAGES: u32 = 5;

impl PageMeta {
    /// Whether a page picker is needed at all
    pub fn has_multiple_pages(&self) -> bool {
        self.pages > 1
    }

    /// 1-based positions of the first and last item shown on this page
    pub fn item_range(&self) -> Option<(u64, u64)> {
        if self.total == 0 || self.page == 0 {
            return None;
        }
        let size = u64::from(self.size);
        let start = u64::from(self.page - 1) * size + 1;
        let end = (u64::from(self.page) * size).min(self.total);
        (start <= end).then_some((start, end))
    }

    /// Numbered slots for the page picker.
    ///
    /// Up to five pages are listed directly. Beyond that the first and last
    /// pages are always shown, together with the neighbours of the current
    /// page, and gaps collapse into an ellipsis.
    pub fn page_window(&self) -> Vec<PageSlot> {
        let total_pages = self.pages;
        let current = self.page;

        if total_pages <= MAX_VISIBLE_PAGES {
            return (1..=total_pages).map(PageSlot::Page).collect();
        }

        let mut slots = vec![PageSlot::Page(1)];
        if current > 3 {
            slots.push(PageSlot::Ellipsis);
        }

        let start = current.saturating_sub(1).max(2);
        let end = current.saturating_add(1).min(total_pages - 1);
        for page in start..=end {
            slots.push(PageSlot::Page(page));
        }

        if current.saturating_add(2) < total_pages {
            slots.push(PageSlot::Ellipsis);
        }
        slots.push(PageSlot::Page(total_pages));
        slots
    }
}
