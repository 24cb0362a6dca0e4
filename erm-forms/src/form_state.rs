//! Form-state container.
//!
//! The container owns the persisted form values and the `pristine` flag. It
//! is the single source of truth the field-array controller and the custom
//! property editor read from and write back into.

use serde_json::Value;
use tracing::{debug, trace};

use crate::path::FieldPath;

/// External form-state container.
///
/// Values are addressable both as whole sequences (`docs`) and by nested
/// record paths (`docs[0].url`). `set` is the only mutation primitive and
/// flips `pristine` to false.
pub trait FormState {
    /// Read the value at `path`, `None` when unset.
    fn get(&self, path: &FieldPath) -> Option<&Value>;

    /// Write `value` at `path`. Marks the form dirty. Paths that index more
    /// than one past the end of an array are ignored.
    fn set(&mut self, path: &FieldPath, value: Value);

    /// The whole value tree.
    fn values(&self) -> &Value;

    /// True until the first user-driven mutation of the session.
    fn pristine(&self) -> bool;
}

/// In-memory [`FormState`] over a `serde_json::Value` tree.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryFormState {
    values: Value,
    pristine: bool,
}

impl MemoryFormState {
    /// Start a session with `initial` values.
    pub fn new(initial: Value) -> Self {
        Self {
            values: normalize(initial),
            pristine: true,
        }
    }

    /// Replace the values with data that arrived after the session started,
    /// e.g. loaded defaults. Does not dirty the form, and is ignored once the
    /// user has edited anything.
    pub fn initialize(&mut self, values: Value) {
        if !self.pristine {
            debug!("ignoring late initial values, form is dirty");
            return;
        }
        self.values = normalize(values);
        trace!("form values initialized");
    }

    /// Start a new session with `values`, pristine again.
    pub fn reset(&mut self, values: Value) {
        self.values = normalize(values);
        self.pristine = true;
        debug!("form reset");
    }

    /// The string at `path`, if it is one.
    pub fn get_str(&self, path: &FieldPath) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// The array at `path`, empty when unset or not an array.
    pub fn get_array(&self, path: &FieldPath) -> &[Value] {
        self.get(path)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl Default for MemoryFormState {
    fn default() -> Self {
        Self::new(Value::Null)
    }
}

impl FormState for MemoryFormState {
    fn get(&self, path: &FieldPath) -> Option<&Value> {
        path.get(&self.values)
    }

    fn set(&mut self, path: &FieldPath, value: Value) {
        trace!(%path, "form set");
        if path.set(&mut self.values, value) {
            self.pristine = false;
        }
    }

    fn values(&self) -> &Value {
        &self.values
    }

    fn pristine(&self) -> bool {
        self.pristine
    }
}

fn normalize(values: Value) -> Value {
    match values {
        Value::Null => Value::Object(Default::default()),
        other => other,
    }
}
