//! Error types for schema loading and record validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while locating, reading or resolving a schema document.
#[derive(Debug, Error)]
pub enum LoadError {
    // Lookup errors (exit code 2)
    #[error("schema not found: {name}")]
    SchemaNotFound { name: String },

    // IO errors (exit code 3)
    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON in {path}: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("schema {name} is not a JSON object (got {actual})")]
    NotAnObject { name: String, actual: String },

    // Reference errors (exit code 2)
    #[error("remote reference not allowed: {reference}")]
    RemoteRef { reference: String },

    #[error("failed to resolve references: {message}")]
    BundleError { message: String },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::ReadError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors from the validation gateway.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("no schema name given and the record has no \"$schema\" key")]
    SchemaKeyNotFound,

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("validation failed: {0}")]
    Invalid(Violation),
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Load(e) => e.exit_code(),
            ValidateError::Invalid(_) => 1,
            ValidateError::SchemaKeyNotFound | ValidateError::InvalidSchema { .. } => 2,
        }
    }

    /// The violation carried by a failed validation, if any.
    pub fn violation(&self) -> Option<&Violation> {
        match self {
            ValidateError::Invalid(v) => Some(v),
            _ => None,
        }
    }
}

/// First structural violation found in a record.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Violation {
    /// JSON Pointer (RFC 6901) to the offending value.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_exit_codes() {
        let err = LoadError::SchemaNotFound { name: "hep".into() };
        assert_eq!(err.exit_code(), 2);

        let err = LoadError::ReadError {
            path: PathBuf::from("hep.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.exit_code(), 3);

        let err = LoadError::RemoteRef {
            reference: "https://example.org/x.json".into(),
        };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn validate_error_exit_codes() {
        let err = ValidateError::Invalid(Violation {
            path: "/titles".into(),
            message: "missing".into(),
        });
        assert_eq!(err.exit_code(), 1);
        assert_eq!(ValidateError::SchemaKeyNotFound.exit_code(), 2);

        let err = ValidateError::from(LoadError::ReadError {
            path: PathBuf::from("hep.json"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "boom"),
        });
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn violation_display() {
        let v = Violation {
            path: "/dois/0/value".into(),
            message: "expected string".into(),
        };
        assert_eq!(v.to_string(), "/dois/0/value: expected string");

        let v = Violation {
            path: String::new(),
            message: "\"titles\" is a required property".into(),
        };
        assert_eq!(v.to_string(), "(root): \"titles\" is a required property");
    }

    #[test]
    fn violation_accessor() {
        let err = ValidateError::InvalidSchema {
            message: "bad".into(),
        };
        assert!(err.violation().is_none());
    }
}
