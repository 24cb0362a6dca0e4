//! Error types for the custom property catalogue

use std::path::PathBuf;
use thiserror::Error;

/// Result type for catalogue operations
pub type Result<T> = std::result::Result<T, FieldsError>;

/// Errors that can occur in catalogue operations
#[derive(Debug, Error)]
pub enum FieldsError {
    /// Definition not found by value
    #[error("custom property not found: {value}")]
    DefinitionNotFound { value: String },

    /// Two definitions share the same value
    #[error("duplicate custom property value: {value}")]
    DuplicateDefinition { value: String },

    /// Definition value cannot name a file in the catalogue directory
    #[error("custom property value cannot be stored as a file name: {value:?}")]
    InvalidFileName { value: String },

    /// Catalogue directory not found
    #[error("catalogue directory not found: {path}")]
    NotInitialized { path: PathBuf },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FieldsError::DefinitionNotFound {
            value: "authIP".into(),
        };
        assert_eq!(err.to_string(), "custom property not found: authIP");
    }

    #[test]
    fn test_duplicate_error() {
        let err = FieldsError::DuplicateDefinition {
            value: "walkInAccess".into(),
        };
        assert!(err.to_string().contains("duplicate"));
        assert!(err.to_string().contains("walkInAccess"));
    }

    #[test]
    fn test_invalid_file_name_quotes_value() {
        let err = FieldsError::InvalidFileName {
            value: "../escaped".into(),
        };
        assert!(err.to_string().contains("\"../escaped\""));
    }
}
