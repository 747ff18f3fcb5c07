//! Fleet records shown on list screens: vehicles and customers.

pub mod customer;
pub mod vehicle;

pub use customer::{Customer, CustomerKind};
pub use vehicle::{Vehicle, VehicleStatus};

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::core::errors::{FleetError, Result};

/// Read a JSON array of records from `path`.
pub fn load_records<R: DeserializeOwned>(path: &Path) -> Result<Vec<R>> {
    let raw = fs::read_to_string(path).map_err(|source| FleetError::io(path, source))?;
    Ok(serde_json::from_str(&raw)?)
}
