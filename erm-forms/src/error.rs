//! Error types for the forms core
//!
//! Validation outcomes are not errors in this sense: validators return
//! `Option<ValidationError>` values (see [`crate::validators`]). `FormsError`
//! covers the few fallible operations around them: parsing field paths,
//! loading configuration and reading the catalogue.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for forms operations
pub type Result<T> = std::result::Result<T, FormsError>;

/// Errors that can occur in forms operations
#[derive(Debug, Error)]
pub enum FormsError {
    /// A field path could not be parsed
    #[error("invalid field path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    /// Configuration file not found
    #[error("configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration parsing failed
    #[error("failed to parse configuration: {0}")]
    Config(#[from] Box<figment::Error>),

    /// A generated validation pattern failed to compile
    #[error("invalid validation pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Catalogue error
    #[error(transparent)]
    Fields(#[from] erm_fields::FieldsError),
}

impl FormsError {
    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<figment::Error> for FormsError {
    fn from(error: figment::Error) -> Self {
        Self::Config(Box::new(error))
    }
}
