//! Field validators and the composer that chains them.
//!
//! Every validator has the same shape: it receives the field's own value,
//! the whole form value tree and the field's [`FieldMeta`], and returns
//! `Some(error)` or `None`. Validators are pure.
//!
//! ```rust
//! use erm_forms::validators::{boxed, compose, valid_url, FieldMeta, Validator};
//! use serde_json::json;
//!
//! let url = compose(vec![boxed(valid_url)]);
//! let meta = FieldMeta::new("docs[0].url");
//! assert!(url.validate(&json!("not a url"), &json!({}), &meta).is_some());
//! assert!(url.validate(&json!("https://example.com"), &json!({}), &meta).is_none());
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::{json, Value};
use thiserror::Error;

use crate::path::FieldPath;

/// Largest integer exactly representable in an IEEE-754 double.
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;
/// Smallest integer exactly representable in an IEEE-754 double.
pub const MIN_SAFE_INTEGER: i64 = -MAX_SAFE_INTEGER;

/// Validation failures, rendered next to the offending field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing required field")]
    MissingRequiredValue,

    /// A note is populated but the value is absent.
    #[error("a note requires a value")]
    NoteWithoutValue { numeric: bool },

    #[error("decimal values may have at most {places} decimal places")]
    InvalidDecimalFormat { places: u32 },

    #[error("value must be an integer between {min} and {max}")]
    IntegerOutOfRangeOrNonInteger { min: i64, max: i64 },

    #[error("invalid URL")]
    InvalidUrlFormat,

    /// A named entry lacks any location, URL or file reference.
    #[error("a location, URL or file is required")]
    MissingLocationOrUrl,

    #[error("value is not a number")]
    InvalidNumber,

    #[error("value must be at most {max}")]
    RangeOverflow { max: f64 },

    #[error("value must be at least {min}")]
    RangeUnderflow { min: f64 },

    #[error("end date is before start date")]
    DateRangeInverted,
}

impl ValidationError {
    /// Stable translation key for the displayed message.
    pub fn message_id(&self) -> &'static str {
        match self {
            Self::MissingRequiredValue => "errors.missingRequiredField",
            Self::NoteWithoutValue { numeric: true } => "errors.customProperty.noteInvalidNumber",
            Self::NoteWithoutValue { numeric: false } => "errors.customProperty.noteWithoutValue",
            Self::InvalidDecimalFormat { .. } => "errors.customProperty.maxDecimalPlaces",
            Self::IntegerOutOfRangeOrNonInteger { .. } => "errors.customProperty.valueNotInRange",
            Self::InvalidUrlFormat => "errors.doc.invalidURL",
            Self::MissingLocationOrUrl => "errors.doc.mustHaveLocationOrURL",
            Self::InvalidNumber => "errors.invalidNumber",
            Self::RangeOverflow { .. } => "errors.rangeOverflow",
            Self::RangeUnderflow { .. } => "errors.rangeUnderflow",
            Self::DateRangeInverted => "errors.dateFilter.onOrAfterGreaterThanOnOrBefore",
        }
    }

    /// Context values interpolated into the message.
    pub fn values(&self) -> BTreeMap<&'static str, Value> {
        let mut values = BTreeMap::new();
        match self {
            Self::InvalidDecimalFormat { places } => {
                values.insert("places", json!(places));
            }
            Self::IntegerOutOfRangeOrNonInteger { min, max } => {
                values.insert("min", json!(min));
                values.insert("max", json!(max));
            }
            Self::RangeOverflow { max } => {
                values.insert("max", json!(max));
            }
            Self::RangeUnderflow { min } => {
                values.insert("min", json!(min));
            }
            _ => {}
        }
        values
    }
}

/// Metadata about the field being validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMeta {
    /// Full path of the field, e.g. `docs[2].url`.
    pub name: String,
}

impl FieldMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The parsed path, `None` if `name` is not a valid path.
    pub fn path(&self) -> Option<FieldPath> {
        FieldPath::parse(&self.name).ok()
    }
}

/// A field validator.
pub trait Validator<E = ValidationError> {
    fn validate(&self, value: &Value, all_values: &Value, meta: &FieldMeta) -> Option<E>;
}

impl<E, F> Validator<E> for F
where
    F: Fn(&Value, &Value, &FieldMeta) -> Option<E>,
{
    fn validate(&self, value: &Value, all_values: &Value, meta: &FieldMeta) -> Option<E> {
        self(value, all_values, meta)
    }
}

pub type BoxedValidator<'a, E = ValidationError> = Box<dyn Validator<E> + 'a>;

/// A validator taking one trailing argument, bound before composition.
pub type ArgValidator<'a, A, E = ValidationError> =
    Box<dyn Fn(&Value, &Value, &FieldMeta, &A) -> Option<E> + 'a>;

/// Box a validator function.
pub fn boxed<'a, E, F>(f: F) -> BoxedValidator<'a, E>
where
    F: Fn(&Value, &Value, &FieldMeta) -> Option<E> + 'a,
{
    Box::new(f)
}

/// How a [`Composed`] validator reports failures from `validate_all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComposePolicy {
    /// Stop at the first failure.
    #[default]
    FirstError,
    /// Run every validator and report each failure.
    CollectAll,
}

/// Validators chained in order.
pub struct Composed<'a, E = ValidationError> {
    validators: Vec<BoxedValidator<'a, E>>,
    policy: ComposePolicy,
}

impl<'a, E> Composed<'a, E> {
    pub fn with_policy(mut self, policy: ComposePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Failures according to the policy, in validator order.
    pub fn validate_all(&self, value: &Value, all_values: &Value, meta: &FieldMeta) -> Vec<E> {
        match self.policy {
            ComposePolicy::FirstError => self.validate(value, all_values, meta).into_iter().collect(),
            ComposePolicy::CollectAll => self
                .validators
                .iter()
                .filter_map(|v| v.validate(value, all_values, meta))
                .collect(),
        }
    }
}

impl<E> Validator<E> for Composed<'_, E> {
    /// The first failure, or `None` if every validator passes.
    fn validate(&self, value: &Value, all_values: &Value, meta: &FieldMeta) -> Option<E> {
        self.validators
            .iter()
            .find_map(|v| v.validate(value, all_values, meta))
    }
}

/// Compose validators into one that returns the first failure.
pub fn compose<'a, E>(validators: Vec<BoxedValidator<'a, E>>) -> Composed<'a, E> {
    Composed {
        validators,
        policy: ComposePolicy::default(),
    }
}

/// Bind a trailing argument to a validator.
pub fn bind_args<'a, A, E, F>(f: F, args: A) -> BoxedValidator<'a, E>
where
    A: 'a,
    E: 'a,
    F: Fn(&Value, &Value, &FieldMeta, &A) -> Option<E> + 'a,
{
    Box::new(move |value: &Value, all_values: &Value, meta: &FieldMeta| {
        f(value, all_values, meta, &args)
    })
}

/// Compose validators, each pre-bound with its own trailing argument.
pub fn compose_with_args<'a, A, E>(pairs: Vec<(ArgValidator<'a, A, E>, A)>) -> Composed<'a, E>
where
    A: 'a,
    E: 'a,
{
    compose(
        pairs
            .into_iter()
            .map(|(f, args)| bind_args(f, args))
            .collect(),
    )
}

/// Truthiness of a form value: null, empty strings, `false` and zero are
/// all "not populated".
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// The raw text of a scalar value, as typed into an input.
pub fn field_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        _ => None,
    }
}

/// Coerce a value to a number the way a numeric input does: surrounding
/// whitespace is ignored, empty text is zero, `0x`/`0o`/`0b` prefixes are
/// honoured.
pub fn coerce_number(value: &Value) -> Option<f64> {
    if let Value::Number(n) = value {
        return n.as_f64();
    }
    let text = field_text(value)?;
    let text = text.trim();
    if text.is_empty() {
        return Some(0.0);
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = text.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix).ok().map(|n| n as f64);
        }
    }
    let lowered = text.to_ascii_lowercase();
    if lowered.contains("inf") || lowered.contains("nan") {
        return match text {
            "Infinity" | "+Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            _ => None,
        };
    }
    text.parse::<f64>().ok()
}

/// Fails when the value is absent or empty.
pub fn required(value: &Value, _all_values: &Value, _meta: &FieldMeta) -> Option<ValidationError> {
    let missing = match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    };
    missing.then_some(ValidationError::MissingRequiredValue)
}

/// Fails when the value is not an object with at least one key.
pub fn required_object(
    value: &Value,
    _all_values: &Value,
    _meta: &FieldMeta,
) -> Option<ValidationError> {
    match value {
        Value::Object(map) if !map.is_empty() => None,
        _ => Some(ValidationError::MissingRequiredValue),
    }
}

/// Fails when populated text does not read as a number.
pub fn invalid_number(
    value: &Value,
    _all_values: &Value,
    _meta: &FieldMeta,
) -> Option<ValidationError> {
    if !is_truthy(value) {
        return None;
    }
    match coerce_number(value) {
        Some(n) if n.is_finite() => None,
        _ => Some(ValidationError::InvalidNumber),
    }
}

/// Fails when a numeric value exceeds `max`.
pub fn range_overflow(max: f64) -> impl Fn(&Value, &Value, &FieldMeta) -> Option<ValidationError> {
    move |value: &Value, _all_values: &Value, _meta: &FieldMeta| {
        if !is_truthy(value) {
            return None;
        }
        match coerce_number(value) {
            Some(n) if n > max => Some(ValidationError::RangeOverflow { max }),
            _ => None,
        }
    }
}

/// Fails when a numeric value is below `min`.
pub fn range_underflow(min: f64) -> impl Fn(&Value, &Value, &FieldMeta) -> Option<ValidationError> {
    move |value: &Value, _all_values: &Value, _meta: &FieldMeta| {
        if !is_truthy(value) {
            return None;
        }
        match coerce_number(value) {
            Some(n) if n < min => Some(ValidationError::RangeUnderflow { min }),
            _ => None,
        }
    }
}

/// Fails when populated text is not an absolute URL.
pub fn valid_url(value: &Value, _all_values: &Value, _meta: &FieldMeta) -> Option<ValidationError> {
    let text = field_text(value)?;
    if text.is_empty() {
        return None;
    }
    url::Url::parse(&text)
        .err()
        .map(|_| ValidationError::InvalidUrlFormat)
}

/// Fails when this (end) date is before the start date found at `from`.
///
/// Dates are `YYYY-MM-DD`; a longer timestamp is compared on its date part.
/// Unparseable dates are left to other validators.
pub fn date_range(from: FieldPath) -> impl Fn(&Value, &Value, &FieldMeta) -> Option<ValidationError> {
    move |value: &Value, all_values: &Value, _meta: &FieldMeta| {
        let to = parse_date(value)?;
        let start = parse_date(from.get(all_values)?)?;
        (start > to).then_some(ValidationError::DateRangeInverted)
    }
}

fn parse_date(value: &Value) -> Option<NaiveDate> {
    let text = value.as_str()?;
    let date_part = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
