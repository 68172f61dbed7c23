//! Error types for the analytics engine
//!
//! Computations themselves are total. Errors only come from the edges:
//! - MalformedInput: a record collection that is not an array, or a record
//!   missing an identity field
//! - Configuration: a threshold table that fails validation or cannot be read

use thiserror::Error;

/// Error types for input normalization and configuration loading
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Expected {collection} to be a JSON array")]
    NotAnArray { collection: &'static str },

    #[error("{collection}[{index}] is not a JSON object")]
    NotAnObject {
        collection: &'static str,
        index: usize,
    },

    #[error("{collection}[{index}] is missing required field '{field}'")]
    MissingField {
        collection: &'static str,
        index: usize,
        field: &'static str,
    },

    #[error("{collection}[{index}] has an invalid '{field}': {reason}")]
    InvalidField {
        collection: &'static str,
        index: usize,
        field: &'static str,
        reason: String,
    },

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl AnalyticsError {
    /// Returns true if the error came from a record collection rather than config
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AnalyticsError::NotAnArray { .. }
                | AnalyticsError::NotAnObject { .. }
                | AnalyticsError::MissingField { .. }
                | AnalyticsError::InvalidField { .. }
                | AnalyticsError::InvalidJson(_)
        )
    }

    /// The offending field, when the error can name one
    pub fn field(&self) -> Option<&'static str> {
        match self {
            AnalyticsError::MissingField { field, .. }
            | AnalyticsError::InvalidField { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Get a user-facing recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AnalyticsError::NotAnArray { .. } | AnalyticsError::NotAnObject { .. } => {
                "The data feed returned an unexpected shape. Refresh to reload."
            }
            AnalyticsError::MissingField { .. } => {
                "A record is missing its identifier. Check the upstream extract."
            }
            AnalyticsError::InvalidField { .. } => {
                "A record carries an unrecognized value. Check the upstream extract."
            }
            AnalyticsError::InvalidJson(_) => "The data feed is not valid JSON. Refresh to reload.",
            AnalyticsError::InvalidConfig(_) => "Check the analytics threshold configuration.",
            AnalyticsError::Io(_) => "Check that the configuration file exists and is readable.",
        }
    }
}

impl From<std::io::Error> for AnalyticsError {
    fn from(err: std::io::Error) -> Self {
        AnalyticsError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AnalyticsError {
    fn from(err: serde_json::Error) -> Self {
        AnalyticsError::InvalidJson(err.to_string())
    }
}

/// Serializable error representation for the rendering layer
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineError {
    pub message: String,
    pub error_type: ErrorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub recovery_suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorType {
    MalformedInput,
    Configuration,
}

impl From<&AnalyticsError> for EngineError {
    fn from(err: &AnalyticsError) -> Self {
        let error_type = if err.is_input_error() {
            ErrorType::MalformedInput
        } else {
            ErrorType::Configuration
        };

        EngineError {
            message: err.to_string(),
            error_type,
            field: err.field().map(ToString::to_string),
            recovery_suggestion: err.recovery_suggestion().to_string(),
        }
    }
}
