//! # Error Types
//!
//! Structured error types for takeoff_core. Every calculator, the block
//! catalog and the session loader report failures through [`CalcError`],
//! which carries enough context (field, value, reason) for a caller to tell
//! the user exactly which input to fix.
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::errors::{CalcError, CalcResult};
//!
//! fn validate_days(days: u32) -> CalcResult<()> {
//!     if days == 0 {
//!         return Err(CalcError::invalid_input(
//!             "days",
//!             days.to_string(),
//!             "Working days must be greater than zero",
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_days(0).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for takeoff_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for takeoff operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is invalid (negative, zero where it must be positive, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required selection or field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Named entry not present in a reference catalog
    #[error("Catalog entry not found: {name}")]
    CatalogEntryNotFound { name: String },

    /// Dimensions are individually valid but describe an impossible shape
    #[error("Geometry error: {element} - {reason}")]
    GeometryError { element: String, reason: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON/TOML serialization or deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Unsupported session file version: {file_version} (expected {expected_version})")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Session document has the wrong shape
    #[error("Invalid session file: {reason}")]
    MalformedDocument { reason: String },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField { field: field.into() }
    }

    /// Create a CatalogEntryNotFound error
    pub fn catalog_entry_not_found(name: impl Into<String>) -> Self {
        CalcError::CatalogEntryNotFound { name: name.into() }
    }

    /// Create a GeometryError
    pub fn geometry(element: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::GeometryError {
            element: element.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a MalformedDocument error
    pub fn malformed(reason: impl Into<String>) -> Self {
        CalcError::MalformedDocument { reason: reason.into() }
    }

    /// Create a SerializationError
    pub fn serialization(reason: impl Into<String>) -> Self {
        CalcError::SerializationError { reason: reason.into() }
    }

    /// True for errors caused by the current inputs of a calculator, as
    /// opposed to I/O or document problems.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CalcError::InvalidInput { .. }
                | CalcError::MissingField { .. }
                | CalcError::CatalogEntryNotFound { .. }
                | CalcError::GeometryError { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::CatalogEntryNotFound { .. } => "CATALOG_ENTRY_NOT_FOUND",
            CalcError::GeometryError { .. } => "GEOMETRY_ERROR",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
            CalcError::MalformedDocument { .. } => "MALFORMED_DOCUMENT",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(e: serde_json::Error) -> Self {
        CalcError::serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::invalid_input("days", "0", "Working days must be greater than zero");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"InvalidInput\""));
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::missing_field("block_name").error_code(), "MISSING_FIELD");
        assert_eq!(CalcError::catalog_entry_not_found("AAC").error_code(), "CATALOG_ENTRY_NOT_FOUND");
        assert_eq!(CalcError::geometry("Fill basin", "L <= W").error_code(), "GEOMETRY_ERROR");
        assert_eq!(CalcError::malformed("root").error_code(), "MALFORMED_DOCUMENT");
    }

    #[test]
    fn test_input_error_classification() {
        assert!(CalcError::geometry("Fill basin", "L <= W").is_input_error());
        assert!(CalcError::missing_field("block_name").is_input_error());
        assert!(!CalcError::file_error("open", "x.json", "not found").is_input_error());
        assert!(!CalcError::malformed("root").is_input_error());
    }

    #[test]
    fn test_version_mismatch_message() {
        let error = CalcError::VersionMismatch {
            file_version: "2".to_string(),
            expected_version: "1".to_string(),
        };
        assert_eq!(error.to_string(), "Unsupported session file version: 2 (expected 1)");
    }
}
