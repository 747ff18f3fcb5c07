#![forbid(unsafe_code)]

//! fleetdesk: administrative core of a fleet-management back office.
//!
//! Two engines sit behind every screen:
//! 1. **List pipeline**: filter → sort → paginate over vehicle and customer
//!    collections ([`list::ListProcessor`]).
//! 2. **Record wizards**: multi-step forms with per-step validation, subtype
//!    switching and a guarded asynchronous submit
//!    ([`wizard::WizardController`]).
//!
//! The REST backend is reached only through the [`fetch::DataSource`] and
//! [`wizard::Submitter`] seams.
//!
//! # Library usage
//!
//! ```rust,no_run
//! use fleetdesk::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use fleetdesk::core::config::Config;
//! use fleetdesk::list::{FilterState, ListProcessor};
//! ```

pub mod prelude;

pub mod core;
pub mod domain;
pub mod fetch;
pub mod list;
pub mod logger;
pub mod wizard;
