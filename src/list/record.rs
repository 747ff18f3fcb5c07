//! The record contract every list screen works against.

use serde::Serialize;

/// Stable identifier of a listed record.
pub type RecordId = u64;

/// Key under which every record exposes its creation timestamp.
pub const CREATED_AT_KEY: &str = "created_at";

/// Value type of a filterable/sortable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    /// Epoch milliseconds.
    Timestamp,
    Flag,
}

/// How a non-search filter value is compared against a text field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchMode {
    /// Case-insensitive equality. Used for enums and codes.
    #[default]
    Exact,
    /// Case-insensitive substring containment.
    Contains,
}

/// A single field read off a record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
    Timestamp(i64),
    Flag(bool),
    /// Field is unset on this record (or unknown to it).
    Missing,
}

impl<'a> FieldValue<'a> {
    /// Text view used by free-text search. Non-text values never match search.
    #[must_use]
    pub const fn as_text(&self) -> Option<&'a str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl<'a> From<&'a str> for FieldValue<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(value)
    }
}

impl<'a> From<Option<&'a str>> for FieldValue<'a> {
    fn from(value: Option<&'a str>) -> Self {
        value.map_or(Self::Missing, Self::Text)
    }
}

impl From<Option<u32>> for FieldValue<'_> {
    fn from(value: Option<u32>) -> Self {
        value.map_or(Self::Missing, |n| Self::Number(f64::from(n)))
    }
}

/// An entity shown in a list screen.
///
/// Implementors describe their fields once; the filter, sort and paginate
/// stages only ever go through this trait.
pub trait Record {
    /// Short name used in errors and log lines (`"vehicle"`, `"customer"`).
    const KIND: &'static str;

    /// Fields scanned by the global free-text `search` filter.
    const SEARCH_FIELDS: &'static [&'static str];

    fn id(&self) -> RecordId;

    /// Creation time in epoch milliseconds; the default sort key.
    fn created_at(&self) -> i64;

    /// Read a field by key. Unknown keys return [`FieldValue::Missing`].
    fn field(&self, key: &str) -> FieldValue<'_>;

    /// Declared kind of a field, or `None` when the key is not a field of
    /// this record type.
    fn field_kind(key: &str) -> Option<FieldKind>;

    /// Comparison used when `key` is filtered with a text value.
    fn match_mode(key: &str) -> MatchMode {
        let _ = key;
        MatchMode::Exact
    }
}

/// Read `key` from `record`, routing [`CREATED_AT_KEY`] to
/// [`Record::created_at`].
pub fn value_of<'r, R: Record>(record: &'r R, key: &str) -> FieldValue<'r> {
    if key == CREATED_AT_KEY {
        FieldValue::Timestamp(record.created_at())
    } else {
        record.field(key)
    }
}

/// Declared kind of `key` for `R`, including the implicit creation timestamp.
pub fn kind_of<R: Record>(key: &str) -> Option<FieldKind> {
    if key == CREATED_AT_KEY {
        Some(FieldKind::Timestamp)
    } else {
        R::field_kind(key)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::Row;
    use super::*;

    #[test]
    fn created_at_is_routed_to_timestamp() {
        let row = Row::new(3, "Gamma", 2021);
        assert_eq!(value_of(&row, CREATED_AT_KEY), FieldValue::Timestamp(3_000));
        assert_eq!(kind_of::<Row>(CREATED_AT_KEY), Some(FieldKind::Timestamp));
    }

    #[test]
    fn unknown_key_is_missing_not_a_panic() {
        let row = Row::new(1, "Alpha", 2020);
        assert_eq!(value_of(&row, "wheels"), FieldValue::Missing);
        assert_eq!(kind_of::<Row>("wheels"), None);
    }

    #[test]
    fn optional_conversions() {
        assert_eq!(FieldValue::from(None::<&str>), FieldValue::Missing);
        assert_eq!(FieldValue::from(Some(7u32)), FieldValue::Number(7.0));
        assert_eq!(FieldValue::Text("x").as_text(), Some("x"));
        assert_eq!(FieldValue::Number(1.0).as_text(), None);
    }
}
