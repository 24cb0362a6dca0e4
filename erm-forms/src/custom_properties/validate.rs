//! Type-dependent validation of custom property values.

use erm_fields::{CustomPropertyDefinition, PropertyType};
use regex::Regex;
use serde_json::Value;

use super::entry::{entry_path, CustomPropertyEntry};
use crate::error::Result;
use crate::path::FieldPath;
use crate::validators::{
    coerce_number, field_text, is_truthy, FieldMeta, ValidationError, Validator, MAX_SAFE_INTEGER,
    MIN_SAFE_INTEGER,
};

/// Accepted shape of decimal text: optional minus, digits, and at most
/// `places` digits after the point.
#[derive(Debug, Clone)]
pub struct DecimalFormat {
    places: u32,
    pattern: Regex,
}

impl DecimalFormat {
    pub fn new(places: u32) -> Result<Self> {
        let pattern = Regex::new(&format!(r"^-?[0-9]*(\.[0-9]{{0,{places}}})?$"))?;
        Ok(Self { places, pattern })
    }

    pub fn places(&self) -> u32 {
        self.places
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// Validator for the value field of one custom property row.
///
/// The entry is looked up in the whole value tree, so the note checks see
/// the same data the value field does.
pub struct PropertyValidator<'a> {
    definition: &'a CustomPropertyDefinition,
    root: &'a FieldPath,
    decimal: &'a DecimalFormat,
}

impl<'a> PropertyValidator<'a> {
    pub fn new(
        definition: &'a CustomPropertyDefinition,
        root: &'a FieldPath,
        decimal: &'a DecimalFormat,
    ) -> Self {
        Self {
            definition,
            root,
            decimal,
        }
    }

    fn entry(&self, all_values: &Value) -> CustomPropertyEntry {
        entry_path(self.root, &self.definition.value)
            .get(all_values)
            .map(CustomPropertyEntry::from_stored)
            .unwrap_or_default()
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.is_empty())
}

fn value_absent(value: &Option<Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// A note or public note is filled in while the value is not.
pub fn note_without_value(
    entry: &CustomPropertyEntry,
    definition: &CustomPropertyDefinition,
) -> Option<ValidationError> {
    let noted = has_text(&entry.note) || has_text(&entry.public_note);
    (noted && value_absent(&entry.value)).then_some(ValidationError::NoteWithoutValue {
        numeric: definition.type_.is_numeric(),
    })
}

/// Type checks on the raw field value. Empty values always pass.
pub fn check_type(
    value: &Value,
    definition: &CustomPropertyDefinition,
    decimal: &DecimalFormat,
) -> Option<ValidationError> {
    if !is_truthy(value) {
        return None;
    }
    match definition.type_ {
        PropertyType::Decimal => {
            let ok = field_text(value).is_some_and(|text| decimal.matches(&text));
            (!ok).then_some(ValidationError::InvalidDecimalFormat {
                places: decimal.places(),
            })
        }
        PropertyType::Number => {
            let ok = coerce_number(value).is_some_and(|n| {
                n.is_finite()
                    && n.fract() == 0.0
                    && n >= MIN_SAFE_INTEGER as f64
                    && n <= MAX_SAFE_INTEGER as f64
            });
            (!ok).then_some(ValidationError::IntegerOutOfRangeOrNonInteger {
                min: MIN_SAFE_INTEGER,
                max: MAX_SAFE_INTEGER,
            })
        }
        PropertyType::Text | PropertyType::Refdata => None,
    }
}

impl Validator for PropertyValidator<'_> {
    fn validate(&self, value: &Value, all_values: &Value, _meta: &FieldMeta) -> Option<ValidationError> {
        note_without_value(&self.entry(all_values), self.definition)
            .or_else(|| check_type(value, self.definition, self.decimal))
    }
}
