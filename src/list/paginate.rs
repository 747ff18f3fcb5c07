//! Paginate stage.

use serde::{Deserialize, Serialize};

/// Zero-based page index plus a non-zero page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPage")]
pub struct PageState {
    page_index: usize,
    page_size: usize,
}

#[derive(Deserialize)]
struct RawPage {
    #[serde(default)]
    page_index: usize,
    page_size: usize,
}

impl From<RawPage> for PageState {
    fn from(raw: RawPage) -> Self {
        Self::new(raw.page_index, raw.page_size)
    }
}

impl PageState {
    /// A page size of 0 is raised to 1.
    #[must_use]
    pub fn new(page_index: usize, page_size: usize) -> Self {
        Self {
            page_index,
            page_size: page_size.max(1),
        }
    }

    /// First page at `page_size`.
    #[must_use]
    pub fn first(page_size: usize) -> Self {
        Self::new(0, page_size)
    }

    #[must_use]
    pub const fn page_index(&self) -> usize {
        self.page_index
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Index of the first row on this page.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.page_index.saturating_mul(self.page_size)
    }

    /// Same size, different page.
    #[must_use]
    pub const fn with_index(self, page_index: usize) -> Self {
        Self {
            page_index,
            page_size: self.page_size,
        }
    }

    /// New size always restarts at the first page.
    #[must_use]
    pub fn with_size(self, page_size: usize) -> Self {
        Self::first(page_size)
    }

    /// Number of pages needed for `len` rows (0 for an empty collection).
    #[must_use]
    pub const fn page_count(&self, len: usize) -> usize {
        len.div_ceil(self.page_size)
    }

    /// Pull the index back onto the last page that exists for `len` rows.
    #[must_use]
    pub const fn clamped(self, len: usize) -> Self {
        let last = self.page_count(len).saturating_sub(1);
        let page_index = if self.page_index > last {
            last
        } else {
            self.page_index
        };
        self.with_index(page_index)
    }
}

impl Default for PageState {
    fn default() -> Self {
        Self::first(10)
    }
}

/// Rows `[index*size, index*size + size)`; empty when the page starts past
/// the end.
pub fn paginate<'s, T>(rows: &'s [T], page: &PageState) -> &'s [T] {
    let start = page.offset();
    if start >= rows.len() {
        return &[];
    }
    let end = start.saturating_add(page.page_size()).min(rows.len());
    &rows[start..end]
}
