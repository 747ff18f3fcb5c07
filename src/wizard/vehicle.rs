//! Vehicle wizard: draft, steps, validation rules and submission DTO.

#![allow(missing_docs)]

use std::convert::Infallible;

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::core::errors::{FleetError, Result};
use crate::domain::vehicle::{Vehicle, VehicleStatus};
use crate::wizard::draft::{FormDraft, optional, parse_optional, parse_required, required};
use crate::wizard::step::StepDescriptor;
use crate::wizard::validation::{Rule, RuleValidator, ValidationErrors};

const STEPS: [StepDescriptor; 4] = [
    StepDescriptor::new(
        0,
        "Vehicle",
        &["brand", "model", "year", "color", "vehicle_type"],
        &["brand", "model", "year"],
    ),
    StepDescriptor::new(
        1,
        "Identification",
        &["plate", "vin", "engine_number"],
        &["plate", "vin"],
    ),
    StepDescriptor::new(
        2,
        "Status",
        &["status", "mileage_km", "purchase_price", "notes"],
        &["status"],
    ),
    StepDescriptor::new(3, "Review", &[], &[]),
];

/// Body styles offered in the vehicle type selector.
pub const VEHICLE_TYPES: &[&str] = &["sedan", "suv", "pickup", "van", "truck", "motorcycle", "bus"];

const STATUSES: &[&str] = &["available", "assigned", "maintenance", "retired"];

/// Oldest model year accepted.
pub const MIN_MODEL_YEAR: u32 = 1950;

/// Vehicle being registered or edited. Vehicles have no subtype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleDraft {
    pub brand: String,
    pub model: String,
    pub year: String,
    pub color: String,
    pub vehicle_type: String,
    pub plate: String,
    pub vin: String,
    pub engine_number: String,
    pub status: String,
    pub mileage_km: String,
    pub purchase_price: String,
    pub notes: String,
}

impl Default for VehicleDraft {
    /// New vehicles start out available.
    fn default() -> Self {
        Self {
            brand: String::new(),
            model: String::new(),
            year: String::new(),
            color: String::new(),
            vehicle_type: String::new(),
            plate: String::new(),
            vin: String::new(),
            engine_number: String::new(),
            status: VehicleStatus::Available.as_str().to_string(),
            mileage_km: String::new(),
            purchase_price: String::new(),
            notes: String::new(),
        }
    }
}

impl VehicleDraft {
    fn slot(&mut self, name: &str) -> Option<&mut String> {
        let slot = match name {
            "brand" => &mut self.brand,
            "model" => &mut self.model,
            "year" => &mut self.year,
            "color" => &mut self.color,
            "vehicle_type" => &mut self.vehicle_type,
            "plate" => &mut self.plate,
            "vin" => &mut self.vin,
            "engine_number" => &mut self.engine_number,
            "status" => &mut self.status,
            "mileage_km" => &mut self.mileage_km,
            "purchase_price" => &mut self.purchase_price,
            "notes" => &mut self.notes,
            _ => return None,
        };
        Some(slot)
    }
}

impl From<&Vehicle> for VehicleDraft {
    /// Pre-populate an edit draft from a listed vehicle.
    fn from(vehicle: &Vehicle) -> Self {
        let text = |value: Option<&str>| value.unwrap_or_default().to_string();
        let number = |value: Option<u32>| value.map(|n| n.to_string()).unwrap_or_default();
        Self {
            brand: vehicle.brand.clone(),
            model: vehicle.model.clone(),
            year: number(vehicle.year),
            color: text(vehicle.color.as_deref()),
            vehicle_type: text(vehicle.vehicle_type.as_deref()),
            plate: vehicle.plate.clone(),
            vin: text(vehicle.vin.as_deref()),
            status: vehicle.status.as_str().to_string(),
            mileage_km: number(vehicle.mileage_km),
            ..Self::default()
        }
    }
}

/// Payload for the create/update vehicle endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleDto {
    pub brand: String,
    pub model: String,
    pub year: u32,
    /// Upper-cased.
    pub plate: String,
    /// Upper-cased.
    pub vin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_number: Option<String>,
    pub status: VehicleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mileage_km: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl FormDraft for VehicleDraft {
    const FORM: &'static str = "vehicle";
    const DISCRIMINANT_FIELD: Option<&'static str> = None;

    type Kind = Infallible;
    type Dto = VehicleDto;

    fn steps(&self) -> Vec<StepDescriptor> {
        STEPS.to_vec()
    }

    fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "brand" => &self.brand,
            "model" => &self.model,
            "year" => &self.year,
            "color" => &self.color,
            "vehicle_type" => &self.vehicle_type,
            "plate" => &self.plate,
            "vin" => &self.vin,
            "engine_number" => &self.engine_number,
            "status" => &self.status,
            "mileage_km" => &self.mileage_km,
            "purchase_price" => &self.purchase_price,
            "notes" => &self.notes,
            _ => return None,
        };
        Some(value)
    }

    fn set_field(&mut self, name: &str, value: String) -> Result<()> {
        let slot = self.slot(name).ok_or_else(|| FleetError::UnknownField {
            form: Self::FORM,
            field: name.to_string(),
        })?;
        *slot = value;
        Ok(())
    }

    fn discriminant(&self) -> Option<Infallible> {
        None
    }

    fn switch_discriminant(&mut self, kind: Infallible) -> bool {
        match kind {}
    }

    fn to_dto(&self) -> std::result::Result<VehicleDto, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let brand = required(&mut errors, "brand", &self.brand);
        let model = required(&mut errors, "model", &self.model);
        let year = parse_required(&mut errors, "year", &self.year, "must be a year");
        let plate = required(&mut errors, "plate", &self.plate).to_uppercase();
        let vin = required(&mut errors, "vin", &self.vin).to_uppercase();
        let status = parse_required(
            &mut errors,
            "status",
            &self.status,
            "must be available, assigned, maintenance or retired",
        );
        let mileage_km = parse_optional(
            &mut errors,
            "mileage_km",
            &self.mileage_km,
            "must be a whole number",
        );
        let purchase_price = parse_optional(
            &mut errors,
            "purchase_price",
            &self.purchase_price,
            "must be a non-negative number",
        );

        match (year, status) {
            (Some(year), Some(status)) if errors.is_empty() => Ok(VehicleDto {
                brand,
                model,
                year,
                plate,
                vin,
                color: optional(&self.color),
                vehicle_type: optional(&self.vehicle_type).map(|t| t.to_lowercase()),
                engine_number: optional(&self.engine_number),
                status,
                mileage_km,
                purchase_price,
                notes: optional(&self.notes),
            }),
            _ => Err(errors),
        }
    }
}

/// Rule table for the vehicle wizard. Model years run up to next year.
pub fn vehicle_validator() -> Result<RuleValidator> {
    let next_year = u32::try_from(Utc::now().year() + 1).unwrap_or(u32::MAX);
    Ok(RuleValidator::new()?
        .rules("brand", [Rule::Required, Rule::MaxLen(40)])
        .rules("model", [Rule::Required, Rule::MaxLen(40)])
        .rules(
            "year",
            [
                Rule::Required,
                Rule::Year {
                    min: MIN_MODEL_YEAR,
                    max: next_year,
                },
            ],
        )
        .rule("color", Rule::MaxLen(30))
        .rule("vehicle_type", Rule::OneOf(VEHICLE_TYPES))
        .rules("plate", [Rule::Required, Rule::Plate])
        .rules("vin", [Rule::Required, Rule::Vin])
        .rule("engine_number", Rule::MaxLen(30))
        .rules("status", [Rule::Required, Rule::OneOf(STATUSES)])
        .rule(
            "mileage_km",
            Rule::Integer {
                max: u64::from(u32::MAX),
            },
        )
        .rule("purchase_price", Rule::Decimal)
        .rule("notes", Rule::MaxLen(500)))
}
