//! Filter stage: immutable filter state and record matching.

use std::collections::BTreeMap;
use std::fmt;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::core::errors::{FleetError, Result};
use crate::list::record::{FieldValue, MatchMode, Record, kind_of, value_of};

/// Reserved filter key for global free-text search.
pub const SEARCH_KEY: &str = "search";

/// Value of one filter control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Flag(bool),
    Text(String),
}

impl FilterValue {
    /// Empty (or whitespace-only) text places no constraint.
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        matches!(self, Self::Text(text) if text.trim().is_empty())
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl fmt::Display for FilterState {
    /// `key=value` pairs of the active entries, comma separated.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.active().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(flag) => write!(f, "{flag}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Current value of every filter control on a list screen.
///
/// Never mutated in place: each edit produces a new state so the list
/// pipeline stays a pure function of its inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterState {
    entries: BTreeMap<String, FilterValue>,
}

impl FilterState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// State holding only a free-text search term.
    ///
    /// The term is trimmed before matching, so `" hilux "` finds the same
    /// rows as `"hilux"` and a whitespace-only term matches everything.
    #[must_use]
    pub fn search(term: impl Into<String>) -> Self {
        Self::new().with(SEARCH_KEY, term.into())
    }

    /// Copy of this state with `key` set to `value`.
    #[must_use]
    pub fn with(&self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        let mut entries = self.entries.clone();
        entries.insert(key.into(), value.into());
        Self { entries }
    }

    /// Copy of this state with `key` removed.
    #[must_use]
    pub fn without(&self, key: &str) -> Self {
        let mut entries = self.entries.clone();
        entries.remove(key);
        Self { entries }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries.get(key)
    }

    /// Entries that actually constrain the result.
    pub fn active(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries
            .iter()
            .filter(|(_, value)| !value.is_unconstrained())
            .map(|(key, value)| (key.as_str(), value))
    }

    /// True when no entry constrains the result.
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.active().next().is_none()
    }

    /// Reject keys that are neither `search` nor a field of `R`.
    pub fn check_keys<R: Record>(&self) -> Result<()> {
        for key in self.entries.keys() {
            if key != SEARCH_KEY && kind_of::<R>(key).is_none() {
                return Err(FleetError::UnknownRecordField {
                    record: R::KIND,
                    field: key.clone(),
                });
            }
        }
        Ok(())
    }

    /// Parse a `key=value` pair as typed on the command line.
    ///
    /// `true`/`false` become flags; everything else is text.
    pub fn parse_pair(input: &str) -> Result<(String, FilterValue)> {
        let (key, value) = input
            .split_once('=')
            .ok_or_else(|| FleetError::expression(input, "expected key=value"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(FleetError::expression(input, "filter key is empty"));
        }
        let value = match value.trim() {
            "true" => FilterValue::Flag(true),
            "false" => FilterValue::Flag(false),
            other => FilterValue::Text(other.to_string()),
        };
        Ok((key.to_string(), value))
    }
}

/// Keep the records that satisfy every active filter entry, in input order.
pub fn filter<'a, R: Record>(records: &'a [R], state: &FilterState) -> Vec<&'a R> {
    let active: Vec<(&str, &FilterValue)> = state.active().collect();
    if active.is_empty() {
        return records.iter().collect();
    }
    records
        .iter()
        .filter(|record| {
            active
                .iter()
                .all(|(key, value)| entry_matches(*record, key, value))
        })
        .collect()
}

/// Whether any of `R::SEARCH_FIELDS` contains `term`, ignoring case.
pub fn search_matches<R: Record>(record: &R, term: &str) -> bool {
    let needle = fold(term.trim());
    R::SEARCH_FIELDS.iter().any(|field| {
        value_of(record, field)
            .as_text()
            .is_some_and(|text| fold(text).contains(&needle))
    })
}

fn entry_matches<R: Record>(record: &R, key: &str, value: &FilterValue) -> bool {
    if key == SEARCH_KEY {
        return match value {
            FilterValue::Text(term) => search_matches(record, term),
            FilterValue::Flag(_) => true,
        };
    }

    match (value_of(record, key), value) {
        (FieldValue::Text(field), FilterValue::Text(wanted)) => match R::match_mode(key) {
            MatchMode::Contains => fold(field).contains(&fold(wanted.trim())),
            MatchMode::Exact => fold(field) == fold(wanted.trim()),
        },
        (FieldValue::Text(field), FilterValue::Flag(wanted)) => {
            parse_flag(field).is_some_and(|flag| flag == *wanted)
        }
        (FieldValue::Number(field), FilterValue::Text(wanted)) => wanted
            .trim()
            .parse::<f64>()
            .is_ok_and(|n| (n - field).abs() < f64::EPSILON),
        (FieldValue::Timestamp(ms), FilterValue::Text(wanted)) => timestamp_matches(ms, wanted),
        (FieldValue::Flag(field), FilterValue::Flag(wanted)) => field == *wanted,
        (FieldValue::Flag(field), FilterValue::Text(wanted)) => {
            parse_flag(wanted).is_some_and(|flag| flag == field)
        }
        _ => false,
    }
}

/// Epoch-ms equality, or same UTC calendar day for `YYYY-MM-DD`.
fn timestamp_matches(ms: i64, wanted: &str) -> bool {
    let wanted = wanted.trim();
    if let Ok(exact) = wanted.parse::<i64>() {
        return exact == ms;
    }
    DateTime::from_timestamp_millis(ms)
        .is_some_and(|at| at.format("%Y-%m-%d").to_string() == wanted)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn fold(text: &str) -> String {
    text.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::record::fixtures::{Row, alpha_beta};

    fn ids(rows: &[&Row]) -> Vec<u64> {
        rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn empty_state_is_identity() {
        let rows = alpha_beta();
        let state = FilterState::new().with("name", "").with(SEARCH_KEY, "   ");
        assert!(state.is_unconstrained());
        assert_eq!(ids(&filter(&rows, &state)), vec![1, 2]);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let rows = alpha_beta();
        assert_eq!(ids(&filter(&rows, &FilterState::search("alpha"))), vec![1]);
        assert_eq!(ids(&filter(&rows, &FilterState::search("ET"))), vec![2]);
        assert_eq!(ids(&filter(&rows, &FilterState::search("AVAIL"))), vec![1, 2]);
    }

    #[test]
    fn search_term_is_trimmed() {
        let rows = alpha_beta();
        assert_eq!(ids(&filter(&rows, &FilterState::search("  alpha "))), vec![1]);
        assert_eq!(ids(&filter(&rows, &FilterState::search("\t"))), vec![1, 2]);
    }

    #[test]
    fn no_match_is_empty_not_error() {
        let rows = alpha_beta();
        assert!(filter(&rows, &FilterState::search("zulu")).is_empty());
        let empty: Vec<Row> = Vec::new();
        assert!(filter(&empty, &FilterState::search("a")).is_empty());
    }

    #[test]
    fn exact_fields_use_case_insensitive_equality() {
        let mut rows = alpha_beta();
        rows[1].status = "maintenance";
        let state = FilterState::new().with("status", "MAINTENANCE");
        assert_eq!(ids(&filter(&rows, &state)), vec![2]);
        let partial = FilterState::new().with("status", "maint");
        assert!(filter(&rows, &partial).is_empty());
    }

    #[test]
    fn contains_fields_use_substring() {
        let rows = alpha_beta();
        let state = FilterState::new().with("name", "LPH");
        assert_eq!(ids(&filter(&rows, &state)), vec![1]);
    }

    #[test]
    fn active_keys_combine_with_and() {
        let mut rows = alpha_beta();
        rows.push(Row::new(3, "Alpine", 2019));
        let state = FilterState::search("alp").with("year", "2019");
        assert_eq!(ids(&filter(&rows, &state)), vec![3]);
    }

    #[test]
    fn flags_and_numbers() {
        let mut rows = alpha_beta();
        rows[0].active = false;
        assert_eq!(
            ids(&filter(&rows, &FilterState::new().with("active", false))),
            vec![1]
        );
        assert_eq!(
            ids(&filter(&rows, &FilterState::new().with("active", "yes"))),
            vec![2]
        );
        assert_eq!(
            ids(&filter(&rows, &FilterState::new().with("year", "2020"))),
            vec![1]
        );
        assert!(filter(&rows, &FilterState::new().with("year", "twenty")).is_empty());
    }

    #[test]
    fn missing_field_never_matches_a_constraint() {
        let mut rows = alpha_beta();
        rows[0].year = None;
        assert!(filter(&rows, &FilterState::new().with("year", "0")).is_empty());
    }

    #[test]
    fn created_at_matches_calendar_day() {
        let mut rows = alpha_beta();
        rows[0].created_at = 1_700_000_000_000; // 2023-11-14
        let state = FilterState::new().with("created_at", "2023-11-14");
        assert_eq!(ids(&filter(&rows, &state)), vec![1]);
    }

    #[test]
    fn with_and_without_do_not_touch_original() {
        let base = FilterState::search("a");
        let extended = base.with("status", "available");
        let trimmed = extended.without(SEARCH_KEY);
        assert_eq!(base.get("status"), None);
        assert!(extended.get(SEARCH_KEY).is_some());
        assert!(trimmed.get(SEARCH_KEY).is_none());
        assert!(trimmed.get("status").is_some());
    }

    #[test]
    fn check_keys_rejects_unknown_fields() {
        assert!(FilterState::search("x").with("year", "1").check_keys::<Row>().is_ok());
        let err = FilterState::new()
            .with("wheels", "4")
            .check_keys::<Row>()
            .expect_err("unknown key");
        assert_eq!(err.code(), "FLT-2002");
    }

    #[test]
    fn parse_pair_types_values() {
        assert_eq!(
            FilterState::parse_pair("active=true").unwrap(),
            ("active".to_string(), FilterValue::Flag(true))
        );
        assert_eq!(
            FilterState::parse_pair(" status = maintenance ").unwrap(),
            ("status".to_string(), FilterValue::from("maintenance"))
        );
        assert!(FilterState::parse_pair("status").is_err());
        assert!(FilterState::parse_pair("=x").is_err());
    }
}
