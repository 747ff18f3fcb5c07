//! Submit collaborator seam.

use std::fmt;

/// External endpoint that persists a finished draft.
///
/// Called at most once per successful [`submit`](crate::wizard::WizardController::submit).
/// Any retry policy belongs to the implementor.
pub trait Submitter<Dto> {
    /// Created or updated record as returned by the backend.
    type Output;
    /// Failure surfaced verbatim to the caller.
    type Error: fmt::Display;

    /// Send `dto` to the backend.
    fn submit(&self, dto: Dto) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send;
}
