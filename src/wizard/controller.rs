//! Wizard state machine: gated forward navigation, discriminant switching
//! and a guarded asynchronous submit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;

use crate::core::errors::Result;
use crate::logger::activity::{ActivityEvent, ActivityLoggerHandle};
use crate::wizard::draft::FormDraft;
use crate::wizard::step::StepDescriptor;
use crate::wizard::submit::Submitter;
use crate::wizard::validation::{ValidationErrors, Validator};

/// Active step, draft and the errors currently shown inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WizardState<D> {
    pub active_step: usize,
    pub draft: D,
    pub errors: ValidationErrors,
}

impl<D> WizardState<D> {
    fn fresh(draft: D) -> Self {
        Self {
            active_step: 0,
            draft,
            errors: ValidationErrors::new(),
        }
    }
}

/// Why a navigation request left the active step where it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StayReason {
    FirstStep,
    LastStep,
    /// The listed fields are empty-but-required or failed validation.
    Invalid { fields: Vec<String> },
}

/// Result of [`WizardController::go_next`] / [`WizardController::go_back`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    Moved { from: usize, to: usize },
    Stayed(StayReason),
}

impl NavOutcome {
    #[must_use]
    pub const fn moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }
}

/// Why [`WizardController::submit`] did not produce a record.
#[derive(Debug, Error)]
pub enum SubmitError<E> {
    #[error("submit is only available from the last step (active step {step})")]
    NotOnLastStep { step: usize },

    #[error("a submission is already in flight")]
    InFlight,

    #[error("draft has {} invalid field(s)", .errors.len())]
    Invalid { errors: ValidationErrors },

    /// The submit collaborator's own error, untouched.
    #[error("{0}")]
    Collaborator(E),
}

/// Clears the in-flight flag when the submit future finishes or is dropped.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives one wizard instance.
///
/// Navigation and edits take `&mut self`; only [`submit`](Self::submit)
/// works through `&self`, so a second submit can only race the first, which
/// the in-flight flag turns away. The state lock is never held across the
/// collaborator await.
pub struct WizardController<D, V> {
    state: Mutex<WizardState<D>>,
    initial: D,
    validator: V,
    in_flight: AtomicBool,
    logger: Option<ActivityLoggerHandle>,
}

impl<D: FormDraft, V: Validator<D>> WizardController<D, V> {
    /// Create-mode wizard over an empty draft.
    #[must_use]
    pub fn new(validator: V) -> Self
    where
        D: Default,
    {
        Self::editing(D::default(), validator)
    }

    /// Edit-mode wizard. `draft` is also what [`reset`](Self::reset) and a
    /// successful submit return to.
    #[must_use]
    pub fn editing(draft: D, validator: V) -> Self {
        Self {
            state: Mutex::new(WizardState::fresh(draft.clone())),
            initial: draft,
            validator,
            in_flight: AtomicBool::new(false),
            logger: None,
        }
    }

    #[must_use]
    pub fn with_logger(mut self, logger: ActivityLoggerHandle) -> Self {
        self.logger = Some(logger);
        self
    }

    #[must_use]
    pub fn active_step(&self) -> usize {
        self.state.lock().active_step
    }

    #[must_use]
    pub fn steps(&self) -> Vec<StepDescriptor> {
        self.state.lock().draft.steps()
    }

    #[must_use]
    pub fn current_step(&self) -> Option<StepDescriptor> {
        let state = self.state.lock();
        state.draft.steps().get(state.active_step).copied()
    }

    #[must_use]
    pub fn is_last_step(&self) -> bool {
        let state = self.state.lock();
        state.active_step + 1 >= state.draft.steps().len()
    }

    #[must_use]
    pub fn errors(&self) -> ValidationErrors {
        self.state.lock().errors.clone()
    }

    #[must_use]
    pub fn draft(&self) -> D {
        self.state.lock().draft.clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> WizardState<D> {
        let state = self.state.lock();
        WizardState {
            active_step: state.active_step,
            draft: state.draft.clone(),
            errors: state.errors.clone(),
        }
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Validate the active step and advance when it is clean.
    ///
    /// The step's previous errors are replaced by the fresh result, so a
    /// corrected field stops blocking. Does nothing on the last step.
    pub fn go_next(&mut self) -> NavOutcome {
        let state = self.state.get_mut();
        let steps = state.draft.steps();
        let from = state.active_step;
        let Some(step) = steps.get(from).filter(|_| from + 1 < steps.len()) else {
            return NavOutcome::Stayed(StayReason::LastStep);
        };

        let errors = check(&self.validator, &state.draft, step.fields, step.required);
        state.errors.retain(|field| !step.contains(field));

        if errors.is_empty() {
            state.active_step = from + 1;
            emit(
                self.logger.as_ref(),
                ActivityEvent::StepAdvanced {
                    form: D::FORM,
                    from,
                    to: from + 1,
                },
            );
            return NavOutcome::Moved { from, to: from + 1 };
        }

        let fields = errors.fields();
        state.errors.merge(errors);
        emit(
            self.logger.as_ref(),
            ActivityEvent::StepBlocked {
                form: D::FORM,
                step: from,
                reason: "invalid".to_string(),
                fields: fields.clone(),
            },
        );
        NavOutcome::Stayed(StayReason::Invalid { fields })
    }

    /// Step back unconditionally. Later steps keep their data.
    pub fn go_back(&mut self) -> NavOutcome {
        let state = self.state.get_mut();
        let from = state.active_step;
        if from == 0 {
            return NavOutcome::Stayed(StayReason::FirstStep);
        }
        state.active_step = from - 1;
        emit(
            self.logger.as_ref(),
            ActivityEvent::StepBack {
                form: D::FORM,
                from,
                to: from - 1,
            },
        );
        NavOutcome::Moved { from, to: from - 1 }
    }

    /// Switch the draft to `kind`. The active step is kept; errors for
    /// fields that left the schema are dropped. Returns whether the kind
    /// changed.
    pub fn set_discriminant(&mut self, kind: D::Kind) -> bool {
        let state = self.state.get_mut();
        let previous = state.draft.discriminant();
        if !state.draft.switch_discriminant(kind) {
            return false;
        }

        let schema = state.draft.schema_fields();
        state
            .errors
            .retain(|field| schema.iter().any(|known| *known == field));
        if let Some(field) = D::DISCRIMINANT_FIELD {
            state.errors.remove(field);
        }

        emit(
            self.logger.as_ref(),
            ActivityEvent::DiscriminantChanged {
                form: D::FORM,
                from: previous.map(|k| k.to_string()),
                to: kind.to_string(),
            },
        );
        true
    }

    /// Edit one field and clear its error.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let state = self.state.get_mut();
        state.draft.set_field(name, value.into())?;
        state.errors.remove(name);
        Ok(())
    }

    /// Cancel: discard the draft and return to the first step.
    pub fn reset(&mut self) {
        *self.state.get_mut() = WizardState::fresh(self.initial.clone());
        emit(
            self.logger.as_ref(),
            ActivityEvent::DraftReset { form: D::FORM },
        );
    }

    /// Validate the whole draft and hand its DTO to `submitter`.
    ///
    /// - not on the last step: [`SubmitError::NotOnLastStep`];
    /// - another submit pending: [`SubmitError::InFlight`];
    /// - any field invalid: [`SubmitError::Invalid`], errors stored on the
    ///   state, collaborator not called;
    /// - collaborator failure: [`SubmitError::Collaborator`], step and draft
    ///   untouched so the user can retry;
    /// - success: the draft is discarded and the wizard restarts.
    pub async fn submit<S>(&self, submitter: &S) -> std::result::Result<S::Output, SubmitError<S::Error>>
    where
        S: Submitter<D::Dto>,
    {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            return Err(SubmitError::InFlight);
        };
        let dto = self.prepare::<S::Error>()?;

        emit(
            self.logger.as_ref(),
            ActivityEvent::SubmitStarted { form: D::FORM },
        );
        let started = Instant::now();
        let result = submitter.submit(dto).await;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(output) => {
                *self.state.lock() = WizardState::fresh(self.initial.clone());
                emit(
                    self.logger.as_ref(),
                    ActivityEvent::SubmitSucceeded {
                        form: D::FORM,
                        duration_ms,
                    },
                );
                Ok(output)
            }
            Err(err) => {
                emit(
                    self.logger.as_ref(),
                    ActivityEvent::SubmitFailed {
                        form: D::FORM,
                        message: err.to_string(),
                        duration_ms,
                    },
                );
                Err(SubmitError::Collaborator(err))
            }
        }
    }

    /// Full-draft validation and DTO transform under the state lock.
    fn prepare<E>(&self) -> std::result::Result<D::Dto, SubmitError<E>> {
        let mut state = self.state.lock();
        let last = state.draft.steps().len().saturating_sub(1);
        if state.active_step != last {
            return Err(SubmitError::NotOnLastStep {
                step: state.active_step,
            });
        }

        let errors = match review(&self.validator, &state.draft) {
            Ok(dto) => return Ok(dto),
            Err(errors) => errors,
        };

        state.errors = errors.clone();
        emit(
            self.logger.as_ref(),
            ActivityEvent::SubmitRejected {
                form: D::FORM,
                reason: "invalid".to_string(),
                fields: errors.fields(),
            },
        );
        Err(SubmitError::Invalid { errors })
    }
}

/// Full-record validation followed by the DTO transform.
///
/// This is the check [`WizardController::submit`] runs, usable without a
/// wizard (for drafts loaded from disk).
pub fn review<D: FormDraft, V: Validator<D>>(
    validator: &V,
    draft: &D,
) -> std::result::Result<D::Dto, ValidationErrors> {
    let fields = draft.schema_fields();
    let required = draft.required_fields();
    let mut errors = check(validator, draft, &fields, &required);
    if errors.is_empty() {
        match draft.to_dto() {
            Ok(dto) => return Ok(dto),
            Err(parse_errors) => errors.merge(parse_errors),
        }
    }
    Err(errors)
}

/// Required-but-empty fields plus the validator's verdict on `fields`.
fn check<D: FormDraft, V: Validator<D>>(
    validator: &V,
    draft: &D,
    fields: &[&'static str],
    required: &[&'static str],
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for field in required {
        if draft.field(field).is_none_or(|value| value.trim().is_empty()) {
            errors.insert(*field, "is required");
        }
    }
    errors.merge(validator.validate(draft, fields));
    errors
}

fn emit(logger: Option<&ActivityLoggerHandle>, event: ActivityEvent) {
    if let Some(logger) = logger {
        logger.send(event);
    }
}
