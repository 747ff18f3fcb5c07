//! Static step layout of a wizard.

use serde::Serialize;

/// One wizard step: its position, label, the fields it edits and which of
/// them must be filled before moving on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepDescriptor {
    pub index: usize,
    pub label: &'static str,
    pub fields: &'static [&'static str],
    pub required: &'static [&'static str],
}

impl StepDescriptor {
    #[must_use]
    pub const fn new(
        index: usize,
        label: &'static str,
        fields: &'static [&'static str],
        required: &'static [&'static str],
    ) -> Self {
        Self {
            index,
            label,
            fields,
            required,
        }
    }

    /// Whether this step edits `field`.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| *f == field)
    }

    /// Review steps edit nothing.
    #[must_use]
    pub const fn is_review(&self) -> bool {
        self.fields.is_empty()
    }
}
