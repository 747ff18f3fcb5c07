//! Vehicle record.

#![allow(missing_docs)]

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::errors::FleetError;
use crate::list::record::{FieldKind, FieldValue, MatchMode, Record, RecordId};

/// Operational state of a fleet vehicle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    #[default]
    Available,
    Assigned,
    Maintenance,
    Retired,
}

impl VehicleStatus {
    pub const ALL: [Self; 4] = [
        Self::Available,
        Self::Assigned,
        Self::Maintenance,
        Self::Retired,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Assigned => "assigned",
            Self::Maintenance => "maintenance",
            Self::Retired => "retired",
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleStatus {
    type Err = FleetError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let wanted = input.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| {
                FleetError::expression(input, "expected available, assigned, maintenance or retired")
            })
    }
}

/// A vehicle as returned by the fleet backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: RecordId,
    pub brand: String,
    pub model: String,
    #[serde(default)]
    pub year: Option<u32>,
    pub plate: String,
    #[serde(default)]
    pub vin: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub status: VehicleStatus,
    #[serde(default)]
    pub mileage_km: Option<u32>,
    /// Customer the vehicle is currently assigned to.
    #[serde(default)]
    pub customer_id: Option<RecordId>,
    pub created_at: DateTime<Utc>,
}

impl Record for Vehicle {
    const KIND: &'static str = "vehicle";
    const SEARCH_FIELDS: &'static [&'static str] = &["brand", "model", "plate", "vin", "color"];

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> i64 {
        self.created_at.timestamp_millis()
    }

    fn field(&self, key: &str) -> FieldValue<'_> {
        match key {
            "brand" => FieldValue::Text(&self.brand),
            "model" => FieldValue::Text(&self.model),
            "plate" => FieldValue::Text(&self.plate),
            "vin" => self.vin.as_deref().into(),
            "color" => self.color.as_deref().into(),
            "vehicle_type" => self.vehicle_type.as_deref().into(),
            "status" => FieldValue::Text(self.status.as_str()),
            "year" => self.year.into(),
            "mileage_km" => self.mileage_km.into(),
            "assigned" => FieldValue::Flag(self.customer_id.is_some()),
            _ => FieldValue::Missing,
        }
    }

    fn field_kind(key: &str) -> Option<FieldKind> {
        match key {
            "brand" | "model" | "plate" | "vin" | "color" | "vehicle_type" | "status" => {
                Some(FieldKind::Text)
            }
            "year" | "mileage_km" => Some(FieldKind::Number),
            "assigned" => Some(FieldKind::Flag),
            _ => None,
        }
    }

    fn match_mode(key: &str) -> MatchMode {
        match key {
            "brand" | "model" | "color" => MatchMode::Contains,
            _ => MatchMode::Exact,
        }
    }
}
