//! Customer record. Endorsers share the customer table with their own kind.

#![allow(missing_docs)]

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::errors::FleetError;
use crate::list::record::{FieldKind, FieldValue, MatchMode, Record, RecordId};

/// Customer subtype. Selects the details sub-schema in the customer wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerKind {
    Individual,
    Business,
    Endorser,
}

impl CustomerKind {
    pub const ALL: [Self; 3] = [Self::Individual, Self::Business, Self::Endorser];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Business => "business",
            Self::Endorser => "endorser",
        }
    }
}

impl fmt::Display for CustomerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CustomerKind {
    type Err = FleetError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let wanted = input.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| FleetError::expression(input, "expected individual, business or endorser"))
    }
}

/// A customer as returned by the fleet backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: RecordId,
    pub kind: CustomerKind,
    /// Full name for individuals and endorsers, legal name for businesses.
    pub display_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

const fn default_active() -> bool {
    true
}

impl Record for Customer {
    const KIND: &'static str = "customer";
    const SEARCH_FIELDS: &'static [&'static str] = &["display_name", "email", "phone", "tax_id"];

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> i64 {
        self.created_at.timestamp_millis()
    }

    fn field(&self, key: &str) -> FieldValue<'_> {
        match key {
            "kind" => FieldValue::Text(self.kind.as_str()),
            "display_name" => FieldValue::Text(&self.display_name),
            "email" => self.email.as_deref().into(),
            "phone" => self.phone.as_deref().into(),
            "tax_id" => self.tax_id.as_deref().into(),
            "city" => self.city.as_deref().into(),
            "active" => FieldValue::Flag(self.active),
            _ => FieldValue::Missing,
        }
    }

    fn field_kind(key: &str) -> Option<FieldKind> {
        match key {
            "kind" | "display_name" | "email" | "phone" | "tax_id" | "city" => {
                Some(FieldKind::Text)
            }
            "active" => Some(FieldKind::Flag),
            _ => None,
        }
    }

    fn match_mode(key: &str) -> MatchMode {
        match key {
            "display_name" | "email" => MatchMode::Contains,
            _ => MatchMode::Exact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::filter::{FilterState, filter};
    use crate::list::sort::{SortState, sort};

    fn customers() -> Vec<Customer> {
        serde_json::from_str(
            r#"[
                {"id": 10, "kind": "business", "display_name": "Transportes Lupita SA",
                 "email": "ops@lupita.mx", "tax_id": "TLU940312AB1", "city": "Monterrey",
                 "created_at": "2024-01-15T12:00:00Z"},
                {"id": 11, "kind": "individual", "display_name": "Ángel Ruiz",
                 "phone": "+52 81 5555 0101", "city": "monterrey", "active": false,
                 "created_at": "2024-02-01T09:00:00Z"},
                {"id": 12, "kind": "endorser", "display_name": "alicia Gómez",
                 "email": "alicia@example.com", "created_at": "2024-02-03T09:00:00Z"}
            ]"#,
        )
        .unwrap()
    }

    fn ids(rows: &[&Customer]) -> Vec<RecordId> {
        rows.iter().map(|c| c.id).collect()
    }

    #[test]
    fn kind_and_city_filters_are_exact() {
        let rows = customers();
        let state = FilterState::new().with("city", "MONTERREY");
        assert_eq!(ids(&filter(&rows, &state)), vec![10, 11]);
        let state = FilterState::new().with("kind", "endorser");
        assert_eq!(ids(&filter(&rows, &state)), vec![12]);
        let state = FilterState::new().with("kind", "endo");
        assert!(filter(&rows, &state).is_empty());
    }

    #[test]
    fn search_reaches_phone_and_tax_id() {
        let rows = customers();
        assert_eq!(ids(&filter(&rows, &FilterState::search("5555"))), vec![11]);
        assert_eq!(ids(&filter(&rows, &FilterState::search("tlu94"))), vec![10]);
    }

    #[test]
    fn active_defaults_to_true() {
        let rows = customers();
        let state = FilterState::new().with("active", true);
        assert_eq!(ids(&filter(&rows, &state)), vec![10, 12]);
    }

    #[test]
    fn names_sort_ignoring_case_and_accents() {
        let rows = customers();
        let sorted = sort(
            filter(&rows, &FilterState::new()),
            Some(&SortState::ascending("display_name")),
        );
        assert_eq!(ids(&sorted), vec![12, 11, 10]);
    }

    #[test]
    fn kind_round_trips_through_text() {
        for kind in CustomerKind::ALL {
            assert_eq!(kind.as_str().parse::<CustomerKind>().unwrap(), kind);
        }
        assert!("company".parse::<CustomerKind>().is_err());
    }
}
