//! Multi-step record wizards.
//!
//! A wizard walks a [`FormDraft`] through its steps. Moving forward is gated
//! on the active step's fields validating; moving back never is. The final
//! step hands the draft's DTO to a [`Submitter`], at most one submission at
//! a time.

#![allow(missing_docs)]

pub mod controller;
pub mod customer;
pub mod draft;
pub mod step;
pub mod submit;
pub mod validation;
pub mod vehicle;

#[cfg(test)]
mod test_properties;

pub use controller::{NavOutcome, StayReason, SubmitError, WizardController, WizardState, review};
pub use customer::{CustomerDraft, CustomerDto, CustomerValidator};
pub use draft::FormDraft;
pub use step::StepDescriptor;
pub use submit::Submitter;
pub use validation::{Rule, RuleValidator, ValidationErrors, Validator};
pub use vehicle::{VehicleDraft, VehicleDto, vehicle_validator};
