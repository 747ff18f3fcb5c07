//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use fleetdesk::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{FleetError, Result};

// Domain
pub use crate::domain::{Customer, CustomerKind, Vehicle, VehicleStatus, load_records};

// Lists
pub use crate::fetch::{DataSource, InMemorySource, ListPage, ListQuery};
pub use crate::list::{
    Direction, FilterState, ListProcessor, ListView, PageState, Record, SortState, TotalCount,
};

// Wizards
pub use crate::wizard::{
    CustomerDraft, CustomerValidator, FormDraft, NavOutcome, StayReason, SubmitError,
    Submitter, ValidationErrors, Validator, VehicleDraft, WizardController, review,
    vehicle_validator,
};

// Logging
pub use crate::logger::activity::{ActivityLoggerHandle, spawn_logger};
