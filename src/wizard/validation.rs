//! Field validation collaborator.
//!
//! Validation results are plain data: a field → message map that the wizard
//! keeps on its state for inline display. Nothing here returns an error for
//! bad user input.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use crate::core::errors::{FleetError, Result};
use crate::wizard::draft::FormDraft;

/// Per-field validation messages, at most one per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    entries: BTreeMap<String, String>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`. An existing message is kept.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.entries.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<String> {
        self.entries.remove(field)
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.entries.contains_key(field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Field names with a message, sorted.
    #[must_use]
    pub fn fields(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Drop every message whose field fails `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|field, _| keep(field));
    }

    /// Add `other`'s messages; fields already present keep theirs.
    pub fn merge(&mut self, other: Self) {
        for (field, message) in other.entries {
            self.insert(field, message);
        }
    }
}

/// Validation collaborator: checks `fields` of `draft`.
///
/// Fields outside the draft's current schema are ignored.
pub trait Validator<D> {
    fn validate(&self, draft: &D, fields: &[&str]) -> ValidationErrors;
}

/// A check applied to one field value.
///
/// Every rule except [`Rule::Required`] accepts an empty value; emptiness is
/// the business of `Required` and the step's required list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Required,
    MaxLen(usize),
    Email,
    Phone,
    /// Taxpayer registry code: 3-4 letters, 6-digit date, 3-char suffix.
    TaxId,
    Vin,
    Plate,
    PostalCode,
    Year { min: u32, max: u32 },
    /// Non-negative whole number no larger than `max`.
    Integer { max: u64 },
    /// Non-negative decimal number.
    Decimal,
    /// `YYYY-MM-DD`.
    Date,
    /// Case-insensitive membership.
    OneOf(&'static [&'static str]),
}

/// Compiled patterns for the format rules.
#[derive(Debug)]
pub struct Patterns {
    email: Regex,
    phone: Regex,
    tax_id: Regex,
    vin: Regex,
    plate: Regex,
    postal_code: Regex,
}

impl Patterns {
    pub fn compile() -> Result<Self> {
        Ok(Self {
            email: compile("email", r"^[^@\s]+@[^@\s]+\.[^@\s]+$")?,
            phone: compile("phone", r"^\+?[0-9][0-9 ()\-]{6,19}$")?,
            tax_id: compile("tax_id", r"(?i)^[A-ZÑ&]{3,4}[0-9]{6}[A-Z0-9]{3}$")?,
            vin: compile("vin", r"(?i)^[A-HJ-NPR-Z0-9]{17}$")?,
            plate: compile("plate", r"(?i)^[A-Z0-9]{1,4}[- ]?[A-Z0-9]{2,4}([- ]?[A-Z0-9]{1,3})?$")?,
            postal_code: compile("postal_code", r"^[0-9]{5}$")?,
        })
    }
}

fn compile(name: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|err| FleetError::InvalidConfig {
        details: format!("invalid {name} pattern {pattern:?}: {err}"),
    })
}

impl Rule {
    /// Message for `value` breaking this rule, or `None` when it passes.
    #[must_use]
    pub fn check(&self, value: &str, patterns: &Patterns) -> Option<String> {
        let value = value.trim();
        if value.is_empty() {
            return matches!(self, Self::Required).then(|| "is required".to_string());
        }
        let ok = match self {
            Self::Required => true,
            Self::MaxLen(max) => {
                return (value.chars().count() > *max)
                    .then(|| format!("must be at most {max} characters"));
            }
            Self::Email => patterns.email.is_match(value),
            Self::Phone => {
                patterns.phone.is_match(value)
                    && value.chars().filter(char::is_ascii_digit).count() >= 7
            }
            Self::TaxId => patterns.tax_id.is_match(value),
            Self::Vin => patterns.vin.is_match(value),
            Self::Plate => patterns.plate.is_match(value),
            Self::PostalCode => patterns.postal_code.is_match(value),
            Self::Year { min, max } => {
                return match value.parse::<u32>() {
                    Ok(year) if (*min..=*max).contains(&year) => None,
                    _ => Some(format!("must be a year between {min} and {max}")),
                };
            }
            Self::Integer { max } => {
                return match value.parse::<u64>() {
                    Ok(n) if n <= *max => None,
                    Ok(_) => Some(format!("must be at most {max}")),
                    Err(_) => Some(self.format_message().to_string()),
                };
            }
            Self::Decimal => value
                .parse::<f64>()
                .is_ok_and(|n| n.is_finite() && n >= 0.0),
            Self::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
            Self::OneOf(options) => {
                return (!options.iter().any(|o| o.eq_ignore_ascii_case(value)))
                    .then(|| format!("must be one of: {}", options.join(", ")));
            }
        };
        (!ok).then(|| self.format_message().to_string())
    }

    const fn format_message(&self) -> &'static str {
        match self {
            Self::Email => "must be a valid email address",
            Self::Phone => "must be a phone number with at least 7 digits",
            Self::TaxId => "must be a valid tax id (e.g. ABC010203XY9)",
            Self::Vin => "must be a 17-character VIN",
            Self::Plate => "must be a valid plate number",
            Self::PostalCode => "must be a 5-digit postal code",
            Self::Integer { .. } => "must be a whole number",
            Self::Decimal => "must be a non-negative number",
            Self::Date => "must use YYYY-MM-DD",
            _ => "is invalid",
        }
    }
}

/// Table-driven validator: an ordered rule list per field.
#[derive(Debug, Clone)]
pub struct RuleValidator {
    rules: BTreeMap<&'static str, Vec<Rule>>,
    patterns: Arc<Patterns>,
}

impl RuleValidator {
    pub fn new() -> Result<Self> {
        Ok(Self::with_patterns(Arc::new(Patterns::compile()?)))
    }

    #[must_use]
    pub fn with_patterns(patterns: Arc<Patterns>) -> Self {
        Self {
            rules: BTreeMap::new(),
            patterns,
        }
    }

    /// Append `rule` to `field`'s list.
    #[must_use]
    pub fn rule(mut self, field: &'static str, rule: Rule) -> Self {
        self.rules.entry(field).or_default().push(rule);
        self
    }

    /// Append several rules to `field`'s list.
    #[must_use]
    pub fn rules(mut self, field: &'static str, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.entry(field).or_default().extend(rules);
        self
    }

    #[must_use]
    pub fn patterns(&self) -> Arc<Patterns> {
        Arc::clone(&self.patterns)
    }

    /// First failing rule's message for `value` under `field`.
    #[must_use]
    pub fn check_value(&self, field: &str, value: &str) -> Option<String> {
        self.rules
            .get(field)?
            .iter()
            .find_map(|rule| rule.check(value, &self.patterns))
    }
}

impl<D: FormDraft> Validator<D> for RuleValidator {
    fn validate(&self, draft: &D, fields: &[&str]) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for field in fields {
            let Some(value) = draft.field(field) else {
                continue;
            };
            if let Some(message) = self.check_value(field, value) {
                errors.insert(*field, message);
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> Patterns {
        Patterns::compile().unwrap()
    }

    #[test]
    fn empty_values_only_fail_required() {
        let p = patterns();
        assert_eq!(Rule::Required.check("  ", &p).as_deref(), Some("is required"));
        assert_eq!(Rule::Email.check("", &p), None);
        assert_eq!(Rule::Year { min: 1990, max: 2030 }.check("", &p), None);
    }

    #[test]
    fn format_rules() {
        let p = patterns();
        assert!(Rule::Email.check("ops@lupita.mx", &p).is_none());
        assert!(Rule::Email.check("ops@lupita", &p).is_some());
        assert!(Rule::Phone.check("+52 81 5555 0101", &p).is_none());
        assert!(Rule::Phone.check("12-34", &p).is_some());
        assert!(Rule::TaxId.check("TLU940312AB1", &p).is_none());
        assert!(Rule::TaxId.check("tlu940312ab1", &p).is_none());
        assert!(Rule::TaxId.check("TL940312", &p).is_some());
        assert!(Rule::Vin.check("1HGCM82633A004352", &p).is_none());
        assert!(Rule::Vin.check("1HGCM82633A00435O", &p).is_some());
        assert!(Rule::Plate.check("ABC-123", &p).is_none());
        assert!(Rule::Plate.check("ABC-123-X", &p).is_none());
        assert!(Rule::Plate.check("!!", &p).is_some());
        assert!(Rule::PostalCode.check("64000", &p).is_none());
        assert!(Rule::PostalCode.check("6400", &p).is_some());
    }

    #[test]
    fn numeric_and_date_rules() {
        let p = patterns();
        let year = Rule::Year { min: 1990, max: 2030 };
        assert!(year.check("2021", &p).is_none());
        assert_eq!(
            year.check("1989", &p).as_deref(),
            Some("must be a year between 1990 and 2030")
        );
        let integer = Rule::Integer { max: 1_000 };
        assert!(integer.check("999", &p).is_none());
        assert_eq!(integer.check("-3", &p).as_deref(), Some("must be a whole number"));
        assert_eq!(integer.check("1001", &p).as_deref(), Some("must be at most 1000"));
        assert!(Rule::Decimal.check("459900.50", &p).is_none());
        assert!(Rule::Decimal.check("NaN", &p).is_some());
        assert!(Rule::Date.check("1990-02-28", &p).is_none());
        assert!(Rule::Date.check("28/02/1990", &p).is_some());
    }

    #[test]
    fn max_len_counts_chars() {
        let p = patterns();
        assert!(Rule::MaxLen(5).check("Gómez", &p).is_none());
        assert!(Rule::MaxLen(4).check("Gómez", &p).is_some());
    }

    #[test]
    fn one_of_ignores_case() {
        let p = patterns();
        let rule = Rule::OneOf(&["sedan", "pickup"]);
        assert!(rule.check("Pickup", &p).is_none());
        assert_eq!(
            rule.check("tank", &p).as_deref(),
            Some("must be one of: sedan, pickup")
        );
    }

    #[test]
    fn first_failing_rule_wins() {
        let validator = RuleValidator::new()
            .unwrap()
            .rules("email", [Rule::MaxLen(6), Rule::Email]);
        assert_eq!(
            validator.check_value("email", "not-an-email").as_deref(),
            Some("must be at most 6 characters")
        );
        assert_eq!(validator.check_value("phone", "x"), None);
    }

    #[test]
    fn errors_keep_first_message_and_merge() {
        let mut errors = ValidationErrors::new();
        errors.insert("vin", "is required");
        errors.insert("vin", "must be a 17-character VIN");
        assert_eq!(errors.get("vin"), Some("is required"));

        let mut more = ValidationErrors::new();
        more.insert("plate", "is required");
        errors.merge(more);
        assert_eq!(errors.fields(), vec!["plate".to_string(), "vin".to_string()]);

        errors.retain(|field| field != "vin");
        assert_eq!(errors.len(), 1);
        assert!(errors.contains("plate"));
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["plate"], "is required");
    }
}
