//! Error types for model loading and directive resolution.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading or building a type model.
#[derive(Debug, Error)]
pub enum ModelError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid model document with {} error(s)", errors.len())]
    InvalidModel { errors: Vec<SchemaError> },

    // Model errors (exit code 2)
    #[error("duplicate type \"{name}\"")]
    DuplicateType { name: String },

    #[error("unknown type \"{name}\"")]
    UnknownType { name: String },

    #[error("type \"{type_name}\" has no member \"{member}\"")]
    UnknownMember { type_name: String, member: String },
}

impl ModelError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ModelError::FileNotFound { .. } | ModelError::ReadError { .. } => 3,
            _ => 2,
        }
    }
}

/// A converter directive that cannot be honoured at its site.
///
/// This is the only resolution failure surfaced to callers; every other
/// lookup miss resolves to an absent result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("unknown converter \"{converter}\"")]
    UnknownConverter { converter: String },

    #[error("cannot construct converter \"{converter}\": {message}")]
    ConverterConstruction { converter: String, message: String },

    #[error("converter \"{converter}\" cannot convert type \"{target_type}\"")]
    ConverterRejected {
        converter: String,
        target_type: String,
    },
}

impl ConfigurationError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Single model document error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) to the invalid value.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_error_exit_codes() {
        let err = ModelError::FileNotFound {
            path: PathBuf::from("model.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let err = ModelError::DuplicateType {
            name: "Person".into(),
        };
        assert_eq!(err.exit_code(), 2);

        let err = ModelError::InvalidModel { errors: vec![] };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn configuration_error_display() {
        let err = ConfigurationError::ConverterRejected {
            converter: "iso_datetime".into(),
            target_type: "string".into(),
        };
        assert_eq!(
            err.to_string(),
            "converter \"iso_datetime\" cannot convert type \"string\""
        );
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn schema_error_display() {
        let err = SchemaError {
            path: "/types/0/kind".into(),
            message: "\"struct\" is not one of [\"class\",\"interface\"]".into(),
        };
        assert!(err.to_string().starts_with("/types/0/kind: "));
    }
}
