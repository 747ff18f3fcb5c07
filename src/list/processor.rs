//! List screen state and the filter → sort → paginate composition.

use serde::Serialize;

use crate::core::config::ListConfig;
use crate::core::errors::Result;
use crate::list::filter::{FilterState, filter};
use crate::list::paginate::{PageState, paginate};
use crate::list::record::Record;
use crate::list::sort::{SortState, sort};
use crate::list::total::TotalCount;
use crate::logger::activity::{ActivityEvent, ActivityLoggerHandle};

/// One rendered page of a list screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListView<'a, R> {
    pub rows: Vec<&'a R>,
    /// Size of the filtered collection, before pagination.
    pub filtered_len: usize,
    /// Page actually shown, after clamping.
    pub page: PageState,
    pub page_count: usize,
}

impl<R> ListView<'_, R> {
    /// Client-side lists always know their size.
    #[must_use]
    pub const fn total(&self) -> TotalCount {
        TotalCount::Exact(self.filtered_len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Run the pipeline once.
///
/// The page index is clamped against the filtered collection before slicing,
/// so a stale index shows the last page rather than nothing.
pub fn run<'a, R: Record>(
    records: &'a [R],
    filter_state: &FilterState,
    sort_state: Option<&SortState>,
    page: &PageState,
) -> ListView<'a, R> {
    let sorted = sort(filter(records, filter_state), sort_state);
    let page = page.clamped(sorted.len());
    ListView {
        rows: paginate(&sorted, &page).to_vec(),
        filtered_len: sorted.len(),
        page_count: page.page_count(sorted.len()),
        page,
    }
}

/// State owned by a list screen: the collection plus filter, sort and page.
///
/// [`ListProcessor::view`] recomputes from scratch every call; nothing is
/// cached between state changes.
#[derive(Debug)]
pub struct ListProcessor<R> {
    records: Vec<R>,
    filter: FilterState,
    sort: Option<SortState>,
    page: PageState,
    logger: Option<ActivityLoggerHandle>,
}

impl<R: Record> ListProcessor<R> {
    /// First page, default page size, newest (or oldest) first.
    #[must_use]
    pub fn new(records: Vec<R>, config: &ListConfig) -> Self {
        Self {
            records,
            filter: FilterState::new(),
            sort: Some(SortState::by_creation(config.default_sort_descending)),
            page: PageState::first(config.default_page_size),
            logger: None,
        }
    }

    #[must_use]
    pub fn with_logger(mut self, logger: ActivityLoggerHandle) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Swap in a freshly fetched collection. The page index is left alone and
    /// clamped on the next view.
    pub fn set_records(&mut self, records: Vec<R>) {
        self.records = records;
    }

    #[must_use]
    pub fn records(&self) -> &[R] {
        &self.records
    }

    #[must_use]
    pub const fn filter_state(&self) -> &FilterState {
        &self.filter
    }

    #[must_use]
    pub const fn sort_state(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    #[must_use]
    pub const fn page_state(&self) -> PageState {
        self.page
    }

    /// Replace the filter. Unknown keys are rejected and leave state as-is.
    pub fn set_filter(&mut self, state: FilterState) -> Result<()> {
        state.check_keys::<R>()?;
        self.filter = state;
        self.page = self.page.with_index(0);
        self.log_state();
        Ok(())
    }

    /// Drop every filter entry and return to the first page.
    pub fn clear_filter(&mut self) {
        self.filter = FilterState::new();
        self.page = self.page.with_index(0);
        self.log_state();
    }

    /// Replace the sort; `None` keeps collection order.
    pub fn set_sort(&mut self, state: Option<SortState>) -> Result<()> {
        if let Some(sort_state) = &state {
            sort_state.check_key::<R>()?;
        }
        self.sort = state;
        self.page = self.page.with_index(0);
        self.log_state();
        Ok(())
    }

    /// Column header click: flips the active column, otherwise sorts the new
    /// column ascending.
    pub fn toggle_sort(&mut self, key: &str) -> Result<()> {
        let next = SortState::clicked(self.sort.as_ref(), key);
        self.set_sort(Some(next))
    }

    /// Jump to `page_index`, clamped to the last page of the filtered rows.
    pub fn set_page(&mut self, page_index: usize) {
        let filtered_len = filter(&self.records, &self.filter).len();
        self.page = self.page.with_index(page_index).clamped(filtered_len);
        self.log_state();
    }

    /// Change the page size; always returns to the first page.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page = self.page.with_size(page_size);
        self.log_state();
    }

    #[must_use]
    pub fn view(&self) -> ListView<'_, R> {
        run(&self.records, &self.filter, self.sort.as_ref(), &self.page)
    }

    fn log_state(&self) {
        if let Some(logger) = &self.logger {
            logger.send(ActivityEvent::ListStateChanged {
                record: R::KIND,
                filter: self.filter.to_string(),
                sort: self
                    .sort
                    .as_ref()
                    .map_or_else(|| "none".to_string(), ToString::to_string),
                page_index: self.page.page_index(),
                page_size: self.page.page_size(),
                filtered: filter(&self.records, &self.filter).len(),
            });
        }
    }
}
