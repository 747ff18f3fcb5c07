//! Sort stage: single-key stable sort with locale-style text ordering.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::{FleetError, Result};
use crate::list::record::{CREATED_AT_KEY, FieldKind, FieldValue, Record, kind_of, value_of};

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    /// Flip direction (column header click on the active column).
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }

    /// Orient a comparator result. Ties stay ties.
    #[must_use]
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

/// The one active sort column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: String,
    pub direction: Direction,
}

impl SortState {
    #[must_use]
    pub fn new(key: impl Into<String>, direction: Direction) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }

    #[must_use]
    pub fn ascending(key: impl Into<String>) -> Self {
        Self::new(key, Direction::Ascending)
    }

    #[must_use]
    pub fn descending(key: impl Into<String>) -> Self {
        Self::new(key, Direction::Descending)
    }

    /// Default ordering of every list: by creation time.
    #[must_use]
    pub fn by_creation(descending: bool) -> Self {
        if descending {
            Self::descending(CREATED_AT_KEY)
        } else {
            Self::ascending(CREATED_AT_KEY)
        }
    }

    /// Clicking a column header: same column flips, new column starts ascending.
    #[must_use]
    pub fn clicked(current: Option<&Self>, key: &str) -> Self {
        match current {
            Some(active) if active.key == key => Self::new(key, active.direction.toggled()),
            _ => Self::ascending(key),
        }
    }

    /// Reject keys that are not sortable fields of `R`.
    pub fn check_key<R: Record>(&self) -> Result<()> {
        if kind_of::<R>(&self.key).is_none() {
            return Err(FleetError::UnknownRecordField {
                record: R::KIND,
                field: self.key.clone(),
            });
        }
        Ok(())
    }
}

impl FromStr for SortState {
    type Err = FleetError;

    /// `key`, `key:asc` or `key:desc`.
    fn from_str(input: &str) -> Result<Self> {
        let (key, direction) = match input.split_once(':') {
            None => (input, Direction::Ascending),
            Some((key, "asc")) => (key, Direction::Ascending),
            Some((key, "desc")) => (key, Direction::Descending),
            Some((_, other)) => {
                return Err(FleetError::expression(
                    input,
                    format!("unknown direction {other:?}, expected asc or desc"),
                ));
            }
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(FleetError::expression(input, "sort key is empty"));
        }
        Ok(Self::new(key, direction))
    }
}

impl fmt::Display for SortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.direction.label())
    }
}

/// Stable sort of `rows` by `state`. `None` keeps the input order.
pub fn sort<'a, R: Record>(mut rows: Vec<&'a R>, state: Option<&SortState>) -> Vec<&'a R> {
    let Some(state) = state else {
        return rows;
    };
    let kind = kind_of::<R>(&state.key);
    rows.sort_by(|a, b| {
        let ordering = compare_values(
            value_of(*a, &state.key),
            value_of(*b, &state.key),
            kind,
        );
        state.direction.apply(ordering)
    });
    rows
}

/// Compare two field values as `kind`; missing or mistyped values count as
/// the kind's empty value.
pub fn compare_values(a: FieldValue<'_>, b: FieldValue<'_>, kind: Option<FieldKind>) -> Ordering {
    let kind = kind.or_else(|| infer_kind(a)).or_else(|| infer_kind(b));
    match kind {
        Some(FieldKind::Text) => locale_cmp(text_or_empty(a), text_or_empty(b)),
        Some(FieldKind::Number) => number_or_zero(a).total_cmp(&number_or_zero(b)),
        Some(FieldKind::Timestamp) => timestamp_or_epoch(a).cmp(&timestamp_or_epoch(b)),
        Some(FieldKind::Flag) => flag_or_false(a).cmp(&flag_or_false(b)),
        None => Ordering::Equal,
    }
}

/// Locale-style string comparison.
///
/// Letters compare case- and accent-insensitively first; accents break ties
/// next, then case with lowercase first, so `"Alpha" < "beta"` and
/// `"a" < "A"`.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let base = |s: &str| -> Vec<char> {
        s.chars()
            .flat_map(char::to_lowercase)
            .map(strip_accent)
            .collect()
    };
    let lower = |s: &str| -> Vec<char> { s.chars().flat_map(char::to_lowercase).collect() };
    let case = |s: &str| -> Vec<bool> { s.chars().map(char::is_uppercase).collect() };

    base(a)
        .cmp(&base(b))
        .then_with(|| lower(a).cmp(&lower(b)))
        .then_with(|| case(a).cmp(&case(b)))
        .then_with(|| a.cmp(b))
}

fn strip_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

const fn infer_kind(value: FieldValue<'_>) -> Option<FieldKind> {
    match value {
        FieldValue::Text(_) => Some(FieldKind::Text),
        FieldValue::Number(_) => Some(FieldKind::Number),
        FieldValue::Timestamp(_) => Some(FieldKind::Timestamp),
        FieldValue::Flag(_) => Some(FieldKind::Flag),
        FieldValue::Missing => None,
    }
}

const fn text_or_empty(value: FieldValue<'_>) -> &str {
    match value {
        FieldValue::Text(text) => text,
        _ => "",
    }
}

const fn number_or_zero(value: FieldValue<'_>) -> f64 {
    match value {
        FieldValue::Number(n) => n,
        _ => 0.0,
    }
}

const fn timestamp_or_epoch(value: FieldValue<'_>) -> i64 {
    match value {
        FieldValue::Timestamp(ms) => ms,
        _ => 0,
    }
}

const fn flag_or_false(value: FieldValue<'_>) -> bool {
    match value {
        FieldValue::Flag(flag) => flag,
        _ => false,
    }
}
