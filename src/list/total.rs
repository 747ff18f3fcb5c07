//! Total-count reporting for server-backed lists.
//!
//! Some list endpoints omit pagination metadata. Rather than guessing a
//! number, the count is reported as a lower bound (or unknown) and the list
//! footer renders that honestly.

use std::fmt;

use serde::Serialize;

use crate::list::paginate::PageState;

/// How much is known about the size of the full result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TotalCount {
    Exact(usize),
    /// At least this many rows exist; more may follow.
    AtLeast(usize),
    Unknown,
}

impl TotalCount {
    /// Derive a count from what the backend returned for `page`.
    ///
    /// - a reported total is trusted as-is;
    /// - a full page means more rows may exist past it;
    /// - a short or empty first page ends the collection;
    /// - an empty later page says nothing about earlier pages.
    #[must_use]
    pub fn estimate(reported: Option<usize>, page_len: usize, page: &PageState) -> Self {
        if let Some(total) = reported {
            return Self::Exact(total);
        }
        let seen = page.offset().saturating_add(page_len);
        if page_len == 0 {
            return if page.page_index() == 0 {
                Self::Exact(0)
            } else {
                Self::Unknown
            };
        }
        if page_len >= page.page_size() {
            Self::AtLeast(seen)
        } else {
            Self::Exact(seen)
        }
    }

    /// Pages the pager may offer. Lower bounds allow one page beyond.
    #[must_use]
    pub fn page_count(self, page: &PageState) -> Option<usize> {
        match self {
            Self::Exact(n) => Some(page.page_count(n)),
            Self::AtLeast(n) => Some(page.page_count(n) + 1),
            Self::Unknown => None,
        }
    }

    /// Footer text: `"42"`, `"at least 20"`, `"unknown"`.
    #[must_use]
    pub fn label(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TotalCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::AtLeast(n) => write!(f, "at least {n}"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reported_total_wins() {
        let page = PageState::new(0, 10);
        assert_eq!(TotalCount::estimate(Some(57), 10, &page), TotalCount::Exact(57));
    }

    #[test]
    fn full_page_is_a_lower_bound() {
        let page = PageState::new(1, 10);
        let total = TotalCount::estimate(None, 10, &page);
        assert_eq!(total, TotalCount::AtLeast(20));
        assert_eq!(total.label(), "at least 20");
        assert_eq!(total.page_count(&page), Some(3));
    }

    #[test]
    fn short_page_is_exact() {
        let page = PageState::new(2, 10);
        assert_eq!(TotalCount::estimate(None, 4, &page), TotalCount::Exact(24));
    }

    #[test]
    fn empty_pages() {
        assert_eq!(
            TotalCount::estimate(None, 0, &PageState::new(0, 10)),
            TotalCount::Exact(0)
        );
        let later = PageState::new(4, 10);
        let total = TotalCount::estimate(None, 0, &later);
        assert_eq!(total, TotalCount::Unknown);
        assert_eq!(total.page_count(&later), None);
        assert_eq!(total.label(), "unknown");
    }

    #[test]
    fn serializes_tagged() {
        let json = serde_json::to_value(TotalCount::AtLeast(5)).unwrap();
        assert_eq!(json["kind"], "at_least");
        assert_eq!(json["value"], 5);
    }
}
