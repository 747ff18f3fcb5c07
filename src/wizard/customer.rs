//! Customer wizard: draft, steps, validation rules and submission DTO.
//!
//! Individuals, businesses and endorsers share the contact step; the details
//! step is chosen by the customer kind, modelled as a tagged union so that
//! switching kind is an explicit variant change.

#![allow(missing_docs)]

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::errors::{FleetError, Result};
use crate::domain::customer::{Customer, CustomerKind};
use crate::wizard::draft::{FormDraft, optional, parse_optional, required};
use crate::wizard::step::StepDescriptor;
use crate::wizard::validation::{Rule, RuleValidator, ValidationErrors, Validator};

const KIND_FIELD: &str = "kind";

const TYPE_STEP: StepDescriptor =
    StepDescriptor::new(0, "Customer type", &[KIND_FIELD], &[KIND_FIELD]);
const CONTACT_STEP: StepDescriptor = StepDescriptor::new(
    1,
    "Contact",
    &["email", "phone", "street", "city", "state", "postal_code"],
    &["email", "phone"],
);
const REVIEW_STEP: StepDescriptor = StepDescriptor::new(3, "Review", &[], &[]);

const fn details_step(kind: Option<CustomerKind>) -> StepDescriptor {
    match kind {
        Some(CustomerKind::Individual) => StepDescriptor::new(
            2,
            "Details",
            &["first_name", "last_name", "birth_date", "national_id"],
            &["first_name", "last_name"],
        ),
        Some(CustomerKind::Business) => StepDescriptor::new(
            2,
            "Details",
            &["legal_name", "tax_id", "industry", "representative"],
            &["legal_name", "tax_id"],
        ),
        Some(CustomerKind::Endorser) => StepDescriptor::new(
            2,
            "Details",
            &["full_name", "relationship", "national_id", "monthly_income"],
            &["full_name", "relationship"],
        ),
        None => StepDescriptor::new(2, "Details", &[], &[]),
    }
}

/// Relationship of an endorser to the customer they back.
pub const RELATIONSHIPS: &[&str] = &["family", "partner", "friend", "employer", "other"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactFields {
    pub email: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl ContactFields {
    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "email" => Some(&mut self.email),
            "phone" => Some(&mut self.phone),
            "street" => Some(&mut self.street),
            "city" => Some(&mut self.city),
            "state" => Some(&mut self.state),
            "postal_code" => Some(&mut self.postal_code),
            _ => None,
        }
    }

    fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "email" => &self.email,
            "phone" => &self.phone,
            "street" => &self.street,
            "city" => &self.city,
            "state" => &self.state,
            "postal_code" => &self.postal_code,
            _ => return None,
        };
        Some(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndividualFields {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
    pub national_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessFields {
    pub legal_name: String,
    pub tax_id: String,
    pub industry: String,
    pub representative: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndorserFields {
    pub full_name: String,
    pub relationship: String,
    pub national_id: String,
    pub monthly_income: String,
}

/// The kind-specific sub-object. Exactly one exists at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CustomerDetails {
    Individual(IndividualFields),
    Business(BusinessFields),
    Endorser(EndorserFields),
}

impl CustomerDetails {
    /// Default empty sub-object for `kind`.
    #[must_use]
    pub fn empty(kind: CustomerKind) -> Self {
        match kind {
            CustomerKind::Individual => Self::Individual(IndividualFields::default()),
            CustomerKind::Business => Self::Business(BusinessFields::default()),
            CustomerKind::Endorser => Self::Endorser(EndorserFields::default()),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> CustomerKind {
        match self {
            Self::Individual(_) => CustomerKind::Individual,
            Self::Business(_) => CustomerKind::Business,
            Self::Endorser(_) => CustomerKind::Endorser,
        }
    }

    fn field(&self, name: &str) -> Option<&str> {
        let value = match (self, name) {
            (Self::Individual(f), "first_name") => &f.first_name,
            (Self::Individual(f), "last_name") => &f.last_name,
            (Self::Individual(f), "birth_date") => &f.birth_date,
            (Self::Individual(f), "national_id") => &f.national_id,
            (Self::Business(f), "legal_name") => &f.legal_name,
            (Self::Business(f), "tax_id") => &f.tax_id,
            (Self::Business(f), "industry") => &f.industry,
            (Self::Business(f), "representative") => &f.representative,
            (Self::Endorser(f), "full_name") => &f.full_name,
            (Self::Endorser(f), "relationship") => &f.relationship,
            (Self::Endorser(f), "national_id") => &f.national_id,
            (Self::Endorser(f), "monthly_income") => &f.monthly_income,
            _ => return None,
        };
        Some(value)
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match (self, name) {
            (Self::Individual(f), "first_name") => Some(&mut f.first_name),
            (Self::Individual(f), "last_name") => Some(&mut f.last_name),
            (Self::Individual(f), "birth_date") => Some(&mut f.birth_date),
            (Self::Individual(f), "national_id") => Some(&mut f.national_id),
            (Self::Business(f), "legal_name") => Some(&mut f.legal_name),
            (Self::Business(f), "tax_id") => Some(&mut f.tax_id),
            (Self::Business(f), "industry") => Some(&mut f.industry),
            (Self::Business(f), "representative") => Some(&mut f.representative),
            (Self::Endorser(f), "full_name") => Some(&mut f.full_name),
            (Self::Endorser(f), "relationship") => Some(&mut f.relationship),
            (Self::Endorser(f), "national_id") => Some(&mut f.national_id),
            (Self::Endorser(f), "monthly_income") => Some(&mut f.monthly_income),
            _ => None,
        }
    }
}

/// Customer being created or edited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerDraft {
    pub contact: ContactFields,
    /// `None` until a kind is chosen.
    pub details: Option<CustomerDetails>,
}

impl CustomerDraft {
    /// Empty draft with `kind` already chosen.
    #[must_use]
    pub fn with_kind(kind: CustomerKind) -> Self {
        Self {
            contact: ContactFields::default(),
            details: Some(CustomerDetails::empty(kind)),
        }
    }
}

impl From<&Customer> for CustomerDraft {
    /// Pre-populate an edit draft from a listed customer.
    fn from(customer: &Customer) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        let contact = ContactFields {
            email: text(&customer.email),
            phone: text(&customer.phone),
            city: text(&customer.city),
            ..ContactFields::default()
        };
        let details = match customer.kind {
            CustomerKind::Individual => {
                let (first, last) = customer
                    .display_name
                    .trim()
                    .split_once(' ')
                    .unwrap_or((customer.display_name.trim(), ""));
                CustomerDetails::Individual(IndividualFields {
                    first_name: first.to_string(),
                    last_name: last.trim().to_string(),
                    ..IndividualFields::default()
                })
            }
            CustomerKind::Business => CustomerDetails::Business(BusinessFields {
                legal_name: customer.display_name.clone(),
                tax_id: text(&customer.tax_id),
                ..BusinessFields::default()
            }),
            CustomerKind::Endorser => CustomerDetails::Endorser(EndorserFields {
                full_name: customer.display_name.clone(),
                ..EndorserFields::default()
            }),
        };
        Self {
            contact,
            details: Some(details),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddressDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

impl AddressDto {
    /// `None` when every address field is blank.
    fn from_contact(contact: &ContactFields) -> Option<Self> {
        let address = Self {
            street: optional(&contact.street),
            city: optional(&contact.city),
            state: optional(&contact.state),
            postal_code: optional(&contact.postal_code),
        };
        (address != Self::default()).then_some(address)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndividualDto {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusinessDto {
    pub legal_name: String,
    /// Upper-cased.
    pub tax_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representative: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndorserDto {
    pub full_name: String,
    /// Lower-cased.
    pub relationship: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_income: Option<f64>,
}

/// Only the sub-object of the chosen kind is sent, under
/// `individual_details`, `business_details` or `endorser_details`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CustomerDetailsDto {
    #[serde(rename = "individual_details")]
    Individual(IndividualDto),
    #[serde(rename = "business_details")]
    Business(BusinessDto),
    #[serde(rename = "endorser_details")]
    Endorser(EndorserDto),
}

/// Payload for the create/update customer endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerDto {
    pub kind: CustomerKind,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<AddressDto>,
    #[serde(flatten)]
    pub details: CustomerDetailsDto,
}

impl FormDraft for CustomerDraft {
    const FORM: &'static str = "customer";
    const DISCRIMINANT_FIELD: Option<&'static str> = Some(KIND_FIELD);

    type Kind = CustomerKind;
    type Dto = CustomerDto;

    fn steps(&self) -> Vec<StepDescriptor> {
        vec![
            TYPE_STEP,
            CONTACT_STEP,
            details_step(self.discriminant()),
            REVIEW_STEP,
        ]
    }

    fn field(&self, name: &str) -> Option<&str> {
        if name == KIND_FIELD {
            return Some(self.details.as_ref().map_or("", |d| d.kind().as_str()));
        }
        self.contact
            .field(name)
            .or_else(|| self.details.as_ref()?.field(name))
    }

    fn set_field(&mut self, name: &str, value: String) -> Result<()> {
        if name == KIND_FIELD {
            return Err(FleetError::DiscriminantField {
                form: Self::FORM,
                field: name.to_string(),
            });
        }
        let slot = match self.contact.field_mut(name) {
            Some(slot) => Some(slot),
            None => self.details.as_mut().and_then(|d| d.field_mut(name)),
        };
        let slot = slot.ok_or_else(|| FleetError::UnknownField {
            form: Self::FORM,
            field: name.to_string(),
        })?;
        *slot = value;
        Ok(())
    }

    fn discriminant(&self) -> Option<CustomerKind> {
        self.details.as_ref().map(CustomerDetails::kind)
    }

    fn switch_discriminant(&mut self, kind: CustomerKind) -> bool {
        if self.discriminant() == Some(kind) {
            return false;
        }
        self.details = Some(CustomerDetails::empty(kind));
        true
    }

    fn to_dto(&self) -> std::result::Result<CustomerDto, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let Some(details) = &self.details else {
            errors.insert(KIND_FIELD, "is required");
            return Err(errors);
        };

        let email = required(&mut errors, "email", &self.contact.email);
        let phone = required(&mut errors, "phone", &self.contact.phone);
        let details = match details {
            CustomerDetails::Individual(f) => CustomerDetailsDto::Individual(IndividualDto {
                first_name: required(&mut errors, "first_name", &f.first_name),
                last_name: required(&mut errors, "last_name", &f.last_name),
                birth_date: parse_optional(
                    &mut errors,
                    "birth_date",
                    &f.birth_date,
                    "must use YYYY-MM-DD",
                ),
                national_id: optional(&f.national_id),
            }),
            CustomerDetails::Business(f) => CustomerDetailsDto::Business(BusinessDto {
                legal_name: required(&mut errors, "legal_name", &f.legal_name),
                tax_id: required(&mut errors, "tax_id", &f.tax_id).to_uppercase(),
                industry: optional(&f.industry),
                representative: optional(&f.representative),
            }),
            CustomerDetails::Endorser(f) => CustomerDetailsDto::Endorser(EndorserDto {
                full_name: required(&mut errors, "full_name", &f.full_name),
                relationship: required(&mut errors, "relationship", &f.relationship)
                    .to_lowercase(),
                national_id: optional(&f.national_id),
                monthly_income: parse_optional(
                    &mut errors,
                    "monthly_income",
                    &f.monthly_income,
                    "must be a non-negative number",
                ),
            }),
        };

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(CustomerDto {
            kind: details_kind(&details),
            email,
            phone,
            address: AddressDto::from_contact(&self.contact),
            details,
        })
    }
}

const fn details_kind(details: &CustomerDetailsDto) -> CustomerKind {
    match details {
        CustomerDetailsDto::Individual(_) => CustomerKind::Individual,
        CustomerDetailsDto::Business(_) => CustomerKind::Business,
        CustomerDetailsDto::Endorser(_) => CustomerKind::Endorser,
    }
}

/// Contact rules shared by every kind plus one rule table per kind.
#[derive(Debug, Clone)]
pub struct CustomerValidator {
    common: RuleValidator,
    individual: RuleValidator,
    business: RuleValidator,
    endorser: RuleValidator,
}

impl CustomerValidator {
    pub fn new() -> Result<Self> {
        let common = RuleValidator::new()?
            .rules(
                KIND_FIELD,
                [Rule::Required, Rule::OneOf(&["individual", "business", "endorser"])],
            )
            .rules("email", [Rule::Required, Rule::MaxLen(120), Rule::Email])
            .rules("phone", [Rule::Required, Rule::Phone])
            .rule("street", Rule::MaxLen(120))
            .rule("city", Rule::MaxLen(60))
            .rule("state", Rule::MaxLen(60))
            .rule("postal_code", Rule::PostalCode);
        let patterns = common.patterns();

        let individual = RuleValidator::with_patterns(patterns.clone())
            .rules("first_name", [Rule::Required, Rule::MaxLen(60)])
            .rules("last_name", [Rule::Required, Rule::MaxLen(60)])
            .rule("birth_date", Rule::Date)
            .rule("national_id", Rule::MaxLen(18));
        let business = RuleValidator::with_patterns(patterns.clone())
            .rules("legal_name", [Rule::Required, Rule::MaxLen(120)])
            .rules("tax_id", [Rule::Required, Rule::TaxId])
            .rule("industry", Rule::MaxLen(60))
            .rule("representative", Rule::MaxLen(120));
        let endorser = RuleValidator::with_patterns(patterns)
            .rules("full_name", [Rule::Required, Rule::MaxLen(120)])
            .rules("relationship", [Rule::Required, Rule::OneOf(RELATIONSHIPS)])
            .rule("national_id", Rule::MaxLen(18))
            .rule("monthly_income", Rule::Decimal);

        Ok(Self {
            common,
            individual,
            business,
            endorser,
        })
    }

    const fn for_kind(&self, kind: CustomerKind) -> &RuleValidator {
        match kind {
            CustomerKind::Individual => &self.individual,
            CustomerKind::Business => &self.business,
            CustomerKind::Endorser => &self.endorser,
        }
    }
}

impl Validator<CustomerDraft> for CustomerValidator {
    fn validate(&self, draft: &CustomerDraft, fields: &[&str]) -> ValidationErrors {
        let mut errors = self.common.validate(draft, fields);
        if let Some(kind) = draft.discriminant() {
            errors.merge(self.for_kind(kind).validate(draft, fields));
        }
        errors
    }
}
