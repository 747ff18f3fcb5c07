//! Client-side list pipeline: filter → sort → paginate.
//!
//! Every stage is a pure function over borrowed records. [`ListProcessor`]
//! holds a list screen's state and composes the stages in that fixed order;
//! sorting never sees rows the filter dropped and pagination never sees rows
//! outside the filtered, sorted set.

#![allow(missing_docs)]

pub mod filter;
pub mod paginate;
pub mod processor;
pub mod record;
pub mod sort;
pub mod total;

#[cfg(test)]
mod test_properties;

pub use filter::{FilterState, FilterValue, SEARCH_KEY};
pub use paginate::PageState;
pub use processor::{ListProcessor, ListView};
pub use record::{FieldKind, FieldValue, MatchMode, Record, RecordId};
pub use sort::{Direction, SortState};
pub use total::TotalCount;
