//! The draft contract shared by every wizard.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::core::errors::Result;
use crate::wizard::step::StepDescriptor;
use crate::wizard::validation::ValidationErrors;

/// A partially filled record edited across wizard steps.
///
/// Field values are held as entered (text) and only parsed when the draft is
/// turned into its submission DTO.
pub trait FormDraft: Clone + Send {
    /// Form name used in errors and log lines.
    const FORM: &'static str;

    /// Field that carries the discriminant, if the form has one.
    const DISCRIMINANT_FIELD: Option<&'static str>;

    /// Record subtype selecting the details sub-schema.
    type Kind: Copy + Eq + fmt::Display + Send;

    /// What the submit collaborator receives.
    type Dto: Serialize + Send;

    /// Step layout for the draft as it currently stands. Never empty.
    fn steps(&self) -> Vec<StepDescriptor>;

    /// Current text of `name`; `None` when the field is not part of the
    /// current schema.
    fn field(&self, name: &str) -> Option<&str>;

    /// Overwrite a field. The discriminant field is rejected; it changes
    /// only through [`FormDraft::switch_discriminant`].
    fn set_field(&mut self, name: &str, value: String) -> Result<()>;

    fn discriminant(&self) -> Option<Self::Kind>;

    /// Switch to `kind`, dropping the previous subtype's sub-object and
    /// seeding an empty one for `kind`. Returns whether anything changed.
    fn switch_discriminant(&mut self, kind: Self::Kind) -> bool;

    /// Build the DTO: active sub-object only, optional blanks as `None`.
    /// Values that fail to parse come back as field errors.
    fn to_dto(&self) -> std::result::Result<Self::Dto, ValidationErrors>;

    /// Every field of the current schema, in step order.
    fn schema_fields(&self) -> Vec<&'static str> {
        self.steps()
            .iter()
            .flat_map(|step| step.fields.iter().copied())
            .collect()
    }

    /// Every required field of the current schema, in step order.
    fn required_fields(&self) -> Vec<&'static str> {
        self.steps()
            .iter()
            .flat_map(|step| step.required.iter().copied())
            .collect()
    }
}

/// `None` for blank input, trimmed text otherwise.
pub(crate) fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Trimmed text of a required field; blank records an error.
pub(crate) fn required(errors: &mut ValidationErrors, field: &str, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.insert(field, "is required");
    }
    trimmed.to_string()
}

/// Parse an optional field; bad input records `message`.
pub(crate) fn parse_optional<T: FromStr>(
    errors: &mut ValidationErrors,
    field: &str,
    value: &str,
    message: &str,
) -> Option<T> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            errors.insert(field, message);
            None
        }
    }
}

/// Parse a required field; blank or bad input records an error.
pub(crate) fn parse_required<T: FromStr>(
    errors: &mut ValidationErrors,
    field: &str,
    value: &str,
    message: &str,
) -> Option<T> {
    if value.trim().is_empty() {
        errors.insert(field, "is required");
        return None;
    }
    parse_optional(errors, field, value, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_blank_is_none() {
        assert_eq!(optional("  "), None);
        assert_eq!(optional(" Blanco "), Some("Blanco".to_string()));
    }

    #[test]
    fn parse_helpers_record_errors() {
        let mut errors = ValidationErrors::new();
        assert_eq!(parse_optional::<u32>(&mut errors, "mileage_km", "", "bad"), None);
        assert!(errors.is_empty());
        assert_eq!(
            parse_optional::<u32>(&mut errors, "mileage_km", " 1200 ", "bad"),
            Some(1200)
        );
        assert_eq!(
            parse_required::<u32>(&mut errors, "year", "", "must be a year"),
            None
        );
        assert_eq!(errors.get("year"), Some("is required"));
        assert_eq!(
            parse_required::<u32>(&mut errors, "mileage_km", "lots", "must be a whole number"),
            None
        );
        assert_eq!(errors.get("mileage_km"), Some("must be a whole number"));
        assert_eq!(required(&mut errors, "plate", "  "), "");
        assert!(errors.contains("plate"));
    }
}
