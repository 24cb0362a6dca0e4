//! Custom property definition types.
//!
//! All types serialize to/from YAML via serde. A definition describes one
//! typed, labelled slot a form may assign to at most one visible row.

use serde::{Deserialize, Serialize};

/// A single option of a refdata-backed custom property.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectOption {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub order: i32,
}

impl SelectOption {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: None,
            order: 0,
        }
    }
}

/// The type of a custom property. Determines how its value is validated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyType {
    Text,
    /// Whole numbers.
    Number,
    /// Fixed-point numbers with a bounded number of decimal places.
    Decimal,
    /// One of the definition's `options`.
    Refdata,
}

impl PropertyType {
    /// Number and Decimal properties carry numeric payloads.
    pub fn is_numeric(self) -> bool {
        matches!(self, PropertyType::Number | PropertyType::Decimal)
    }
}

/// A custom property definition, supplied by the catalogue.
///
/// Immutable for the lifetime of a form session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomPropertyDefinition {
    /// Identifier, also the key under which entries are stored.
    pub value: String,
    pub label: String,
    #[serde(rename = "type")]
    pub type_: PropertyType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    /// Primary properties always render as a fixed, non-deletable group.
    #[serde(default)]
    pub primary: bool,
    /// Visibility used when an entry leaves `internal` unset.
    #[serde(default)]
    pub default_internal: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub order: i32,
}

impl CustomPropertyDefinition {
    pub fn new(value: impl Into<String>, label: impl Into<String>, type_: PropertyType) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            type_,
            options: Vec::new(),
            primary: false,
            default_internal: false,
            description: None,
            order: 0,
        }
    }

    /// Mark the definition as primary.
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn internal_by_default(mut self, internal: bool) -> Self {
        self.default_internal = internal;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Optional definitions are the complement of primary ones.
    pub fn is_optional(&self) -> bool {
        !self.primary
    }
}
