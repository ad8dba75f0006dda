//! Gridsift - Pagination
//!
//! Slices the filtered, sorted row set into fixed-size pages.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Default rows per page
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Page sizes offered by the UI, in cycle order
pub const PAGE_SIZE_OPTIONS: [PageSize; 4] = [
    PageSize::Rows(5),
    PageSize::Rows(10),
    PageSize::Rows(25),
    PageSize::All,
];

/// Rows per page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    Rows(usize),
    /// Everything on one page; resolves to the filtered row count
    All,
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::Rows(DEFAULT_PAGE_SIZE)
    }
}

impl PageSize {
    /// Concrete size for `len` filtered rows. Never zero.
    pub fn resolve(&self, len: usize) -> usize {
        match self {
            PageSize::Rows(n) => (*n).max(1),
            PageSize::All => len.max(1),
        }
    }

    /// Parse a number or `all`
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Some(PageSize::All);
        }
        s.parse::<usize>().ok().filter(|n| *n > 0).map(PageSize::Rows)
    }

    pub fn label(&self) -> String {
        match self {
            PageSize::Rows(n) => n.to_string(),
            PageSize::All => "All".to_string(),
        }
    }

    /// Next (or previous) entry in [`PAGE_SIZE_OPTIONS`]
    pub fn cycle(&self, forward: bool) -> Self {
        let n = PAGE_SIZE_OPTIONS.len();
        let pos = PAGE_SIZE_OPTIONS.iter().position(|o| o == self);
        let next = match (pos, forward) {
            (Some(i), true) => (i + 1) % n,
            (Some(i), false) => (i + n - 1) % n,
            (None, _) => 1,
        };
        PAGE_SIZE_OPTIONS[next]
    }
}

/// The page picked out of `len` rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Index range of the page within the row set
    pub range: Range<usize>,
    /// Total pages, at least 1
    pub page_count: usize,
    /// Requested index after clamping
    pub page_index: usize,
}

impl Page {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Locate page `page_index` within `len` rows.
///
/// Zero rows still make one empty page. An index past the end clamps to the
/// last page and the clamped index is reported back.
pub fn paginate(len: usize, page_index: usize, page_size: PageSize) -> Page {
    let size = page_size.resolve(len);
    let page_count = len.div_ceil(size).max(1);
    let page_index = page_index.min(page_count - 1);
    let start = (page_index * size).min(len);
    let end = (start + size).min(len);
    Page {
        range: start..end,
        page_count,
        page_index,
    }
}
