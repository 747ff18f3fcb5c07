//! FLT-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, FleetError>;

/// Top-level error type for fleetdesk.
///
/// Field validation problems are not errors: they travel as
/// [`ValidationErrors`](crate::wizard::validation::ValidationErrors) on the
/// wizard state.
#[derive(Debug, Error)]
pub enum FleetError {
    #[error("[FLT-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[FLT-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[FLT-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[FLT-2001] unknown form field {field:?} in {form}")]
    UnknownField { form: &'static str, field: String },

    #[error("[FLT-2002] unknown record field {field:?} for {record}")]
    UnknownRecordField {
        record: &'static str,
        field: String,
    },

    #[error("[FLT-2003] invalid list expression {input:?}: {details}")]
    InvalidExpression { input: String, details: String },

    #[error("[FLT-2004] field {field:?} of {form} changes only through set_discriminant")]
    DiscriminantField { form: &'static str, field: String },

    #[error("[FLT-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[FLT-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[FLT-3003] channel closed in component {component}")]
    ChannelClosed { component: &'static str },

    #[error("[FLT-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl FleetError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "FLT-1001",
            Self::MissingConfig { .. } => "FLT-1002",
            Self::ConfigParse { .. } => "FLT-1003",
            Self::UnknownField { .. } => "FLT-2001",
            Self::UnknownRecordField { .. } => "FLT-2002",
            Self::InvalidExpression { .. } => "FLT-2003",
            Self::DiscriminantField { .. } => "FLT-2004",
            Self::Serialization { .. } => "FLT-2101",
            Self::Io { .. } => "FLT-3002",
            Self::ChannelClosed { .. } => "FLT-3003",
            Self::Runtime { .. } => "FLT-3900",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::ChannelClosed { .. } | Self::Runtime { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Convenience constructor for malformed sort/filter expressions.
    #[must_use]
    pub fn expression(input: impl Into<String>, details: impl Into<String>) -> Self {
        Self::InvalidExpression {
            input: input.into(),
            details: details.into(),
        }
    }
}

impl From<serde_json::Error> for FleetError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for FleetError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
