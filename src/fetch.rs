//! Data-fetch seam for list screens backed by a server.
//!
//! A [`DataSource`] receives the same filter/sort/page state a client-side
//! [`ListProcessor`](crate::list::ListProcessor) would use and answers with
//! one page of records plus whatever total the backend chose to report.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use crate::core::errors::{FleetError, Result};
use crate::list::filter::{FilterState, filter};
use crate::list::paginate::{PageState, paginate};
use crate::list::record::Record;
use crate::list::sort::{SortState, sort};
use crate::list::total::TotalCount;

/// Everything a backend needs to produce one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub filter: FilterState,
    #[serde(default)]
    pub sort: Option<SortState>,
    #[serde(default)]
    pub page: PageState,
}

impl ListQuery {
    #[must_use]
    pub fn new(filter: FilterState, sort: Option<SortState>, page: PageState) -> Self {
        Self { filter, sort, page }
    }
}

/// One page of records. `total` is `None` when the backend omitted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPage<R> {
    pub records: Vec<R>,
    pub total: Option<usize>,
}

impl<R> ListPage<R> {
    /// What the footer may claim about the full result set.
    #[must_use]
    pub fn total_count(&self, page: &PageState) -> TotalCount {
        TotalCount::estimate(self.total, self.records.len(), page)
    }
}

/// External list backend.
pub trait DataSource<R> {
    type Error;

    fn fetch(
        &self,
        query: &ListQuery,
    ) -> impl Future<Output = std::result::Result<ListPage<R>, Self::Error>> + Send;
}

/// A backend over an in-memory collection.
///
/// Applies the list pipeline server-side. Unlike [`ListProcessor`], the page
/// index is not clamped: a page past the end comes back empty, as it would
/// from a REST endpoint.
///
/// [`ListProcessor`]: crate::list::ListProcessor
#[derive(Debug, Clone)]
pub struct InMemorySource<R> {
    records: Vec<R>,
    report_total: bool,
}

impl<R: Record + Clone> InMemorySource<R> {
    #[must_use]
    pub fn new(records: Vec<R>) -> Self {
        Self {
            records,
            report_total: true,
        }
    }

    /// Behave like an endpoint that returns no pagination metadata.
    #[must_use]
    pub fn without_total(mut self) -> Self {
        self.report_total = false;
        self
    }

    fn answer(&self, query: &ListQuery) -> Result<ListPage<R>> {
        query.filter.check_keys::<R>()?;
        if let Some(sort_state) = &query.sort {
            sort_state.check_key::<R>()?;
        }
        let sorted = sort(filter(&self.records, &query.filter), query.sort.as_ref());
        let records = paginate(&sorted, &query.page)
            .iter()
            .map(|record| (*record).clone())
            .collect();
        Ok(ListPage {
            records,
            total: self.report_total.then_some(sorted.len()),
        })
    }
}

impl<R> DataSource<R> for InMemorySource<R>
where
    R: Record + Clone + Send,
{
    type Error = FleetError;

    fn fetch(
        &self,
        query: &ListQuery,
    ) -> impl Future<Output = std::result::Result<ListPage<R>, Self::Error>> + Send {
        std::future::ready(self.answer(query))
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::list::record::fixtures::Row;

    fn rows(n: u64) -> Vec<Row> {
        (1..=n).map(|i| Row::new(i, &format!("unit {i}"), 2020)).collect()
    }

    fn ids(page: &ListPage<Row>) -> Vec<u64> {
        page.records.iter().map(|r| r.id).collect()
    }

    #[test]
    fn reports_total_when_configured() {
        let source = InMemorySource::new(rows(25));
        let query = ListQuery::new(
            FilterState::new(),
            Some(SortState::by_creation(true)),
            PageState::new(1, 10),
        );
        let page = block_on(source.fetch(&query)).unwrap();
        assert_eq!(ids(&page), (6..=15).rev().collect::<Vec<_>>());
        assert_eq!(page.total_count(&query.page), TotalCount::Exact(25));
    }

    #[test]
    fn missing_metadata_degrades_to_lower_bound() {
        let source = InMemorySource::new(rows(25)).without_total();
        let query = ListQuery::new(FilterState::new(), None, PageState::new(0, 10));
        let page = block_on(source.fetch(&query)).unwrap();
        assert_eq!(page.total, None);
        assert_eq!(page.total_count(&query.page).label(), "at least 10");

        let last = ListQuery::new(FilterState::new(), None, PageState::new(2, 10));
        let page = block_on(source.fetch(&last)).unwrap();
        assert_eq!(page.total_count(&last.page), TotalCount::Exact(25));

        let beyond = ListQuery::new(FilterState::new(), None, PageState::new(9, 10));
        let page = block_on(source.fetch(&beyond)).unwrap();
        assert!(page.records.is_empty());
        assert_eq!(page.total_count(&beyond.page), TotalCount::Unknown);
    }

    #[test]
    fn full_last_page_never_overstates_the_count() {
        let source = InMemorySource::new(rows(20)).without_total();
        let query = ListQuery::new(FilterState::new(), None, PageState::new(1, 10));
        let page = block_on(source.fetch(&query)).unwrap();
        let total = page.total_count(&query.page);
        assert_eq!(total, TotalCount::AtLeast(20));
        assert_eq!(total.label(), "at least 20");
    }

    #[test]
    fn filters_server_side() {
        let source = InMemorySource::new(rows(12));
        let query = ListQuery::new(FilterState::search("unit 1"), None, PageState::first(10));
        let page = block_on(source.fetch(&query)).unwrap();
        assert_eq!(ids(&page), vec![1, 10, 11, 12]);
        assert_eq!(page.total, Some(4));
    }

    #[test]
    fn unknown_keys_are_errors() {
        let source = InMemorySource::new(rows(3));
        let query = ListQuery::new(
            FilterState::new(),
            Some(SortState::ascending("wheels")),
            PageState::default(),
        );
        let err = block_on(source.fetch(&query)).unwrap_err();
        assert_eq!(err.code(), "FLT-2002");
    }

    #[test]
    fn query_deserializes_with_defaults() {
        let query: ListQuery =
            serde_json::from_str(r#"{"filter": {"search": "hilux"}}"#).unwrap();
        assert_eq!(query.page, PageState::first(10));
        assert!(query.sort.is_none());
        assert_eq!(query.filter, FilterState::search("hilux"));
    }
}
