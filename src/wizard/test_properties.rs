//! Property-based tests for wizard navigation.
//!
//! Drives the customer wizard with arbitrary action sequences and checks
//! that the active step stays in range, that forward moves only leave
//! steps whose required fields are filled, and that a kind switch never
//! moves the wizard.

use proptest::prelude::*;

use super::controller::{NavOutcome, WizardController};
use super::customer::{CustomerDraft, CustomerValidator};
use super::draft::FormDraft;
use crate::domain::customer::CustomerKind;

#[derive(Debug, Clone)]
enum Action {
    Next,
    Back,
    Set(&'static str, String),
    Switch(CustomerKind),
    Reset,
}

// ──────────────────── strategies ────────────────────

fn arb_field() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("email"),
        Just("phone"),
        Just("postal_code"),
        Just("first_name"),
        Just("last_name"),
        Just("legal_name"),
        Just("tax_id"),
        Just("full_name"),
        Just("relationship"),
    ]
}

fn arb_value() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("  ".to_string()),
        Just("ops@lupita.mx".to_string()),
        Just("+52 81 5555 0101".to_string()),
        Just("TLU940312AB1".to_string()),
        Just("family".to_string()),
        "[a-zA-Z ]{1,10}",
    ]
}

fn arb_kind() -> impl Strategy<Value = CustomerKind> {
    prop_oneof![
        Just(CustomerKind::Individual),
        Just(CustomerKind::Business),
        Just(CustomerKind::Endorser),
    ]
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        4 => Just(Action::Next),
        2 => Just(Action::Back),
        5 => (arb_field(), arb_value()).prop_map(|(f, v)| Action::Set(f, v)),
        2 => arb_kind().prop_map(Action::Switch),
        1 => Just(Action::Reset),
    ]
}

fn required_filled(draft: &CustomerDraft, step: usize) -> bool {
    draft.steps()[step]
        .required
        .iter()
        .all(|f| draft.field(f).is_some_and(|v| !v.trim().is_empty()))
}

// ──────────────────── properties ────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn navigation_invariants_hold(actions in prop::collection::vec(arb_action(), 0..60)) {
        let mut wizard: WizardController<CustomerDraft, CustomerValidator> =
            WizardController::new(CustomerValidator::new().unwrap());

        for action in actions {
            let before = wizard.active_step();
            match action {
                Action::Next => {
                    let draft = wizard.draft();
                    let filled = required_filled(&draft, before);
                    match wizard.go_next() {
                        NavOutcome::Moved { from, to } => {
                            prop_assert_eq!(from, before);
                            prop_assert_eq!(to, before + 1);
                            prop_assert!(filled, "left step {} with an empty required field", before);
                        }
                        NavOutcome::Stayed(_) => prop_assert_eq!(wizard.active_step(), before),
                    }
                }
                Action::Back => {
                    let outcome = wizard.go_back();
                    prop_assert_eq!(wizard.active_step(), before.saturating_sub(1));
                    prop_assert_eq!(outcome.moved(), before > 0);
                }
                Action::Set(field, value) => {
                    if wizard.set_field(field, value).is_ok() {
                        prop_assert!(!wizard.errors().contains(field));
                    }
                    prop_assert_eq!(wizard.active_step(), before);
                }
                Action::Switch(kind) => {
                    wizard.set_discriminant(kind);
                    prop_assert_eq!(wizard.active_step(), before);
                    prop_assert_eq!(wizard.draft().discriminant(), Some(kind));
                    let schema = wizard.draft().schema_fields();
                    for field in wizard.errors().fields() {
                        prop_assert!(schema.iter().any(|f| *f == field));
                    }
                }
                Action::Reset => {
                    wizard.reset();
                    prop_assert_eq!(wizard.active_step(), 0);
                    prop_assert!(wizard.errors().is_empty());
                }
            }
            prop_assert!(wizard.active_step() < wizard.steps().len());
        }
    }
}
