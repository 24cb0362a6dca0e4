//! Custom property value entries and their storage rule.
//!
//! The entry for definition `d` lives at `customProperties[d][0]`: a
//! single-element array under the definition's value. Only index 0 is used,
//! but the array shape is kept as stored so tombstoned entries can carry the
//! id of the record they delete.

use erm_fields::CustomPropertyDefinition;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::path::FieldPath;

/// The value map stored at the custom properties root, keyed by definition.
pub type PropertyValues = Map<String, Value>;

/// One custom property value as held by the form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomPropertyEntry {
    /// Identity of a previously persisted entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_text"
    )]
    pub note: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_text"
    )]
    pub public_note: Option<String>,
    /// Unset means "inherit the definition's default".
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_internal"
    )]
    pub internal: Option<bool>,
    /// Tombstone: delete the persisted record on submit.
    #[serde(
        rename = "_delete",
        default,
        skip_serializing_if = "std::ops::Not::not",
        deserialize_with = "deserialize_flag"
    )]
    pub delete: bool,
    /// Fields this crate does not interpret, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CustomPropertyEntry {
    /// Read a stored entry object. Fields of an unexpected type read as unset;
    /// anything that is not an object reads as empty.
    pub fn from_stored(stored: &Value) -> Self {
        serde_json::from_value(stored.clone()).unwrap_or_default()
    }

    /// Visibility after falling back to the definition's default.
    pub fn effective_internal(&self, definition: &CustomPropertyDefinition) -> bool {
        self.internal.unwrap_or(definition.default_internal)
    }
}

/// Select inputs hand back `"true"`/`"false"` strings; stored data uses bools.
fn deserialize_internal<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::String(s)) if s == "true" => Some(true),
        Some(Value::String(s)) if s == "false" => Some(false),
        _ => None,
    })
}

fn deserialize_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    })
}

/// A change to one field of an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "to", rename_all = "camelCase")]
pub enum EntryPatch {
    Value(Option<Value>),
    Note(Option<String>),
    PublicNote(Option<String>),
    Internal(Option<bool>),
}

impl EntryPatch {
    fn key(&self) -> &'static str {
        match self {
            EntryPatch::Value(_) => "value",
            EntryPatch::Note(_) => "note",
            EntryPatch::PublicNote(_) => "publicNote",
            EntryPatch::Internal(_) => "internal",
        }
    }

    /// Shallow-merge the change into a stored entry object. Every other key,
    /// including ones this crate does not interpret, is kept as stored.
    pub fn merge_into(self, stored: &mut Map<String, Value>) {
        let key = self.key();
        let value = match self {
            EntryPatch::Value(v) => v,
            EntryPatch::Note(n) | EntryPatch::PublicNote(n) => n.map(Value::String),
            EntryPatch::Internal(i) => i.map(Value::Bool),
        };
        match value {
            Some(v) => stored.insert(key.to_string(), v),
            None => stored.remove(key),
        };
    }
}

/// Path of the entry for `definition` under `root`.
pub fn entry_path(root: &FieldPath, definition: &str) -> FieldPath {
    root.child(definition).index(0)
}

/// Whether any value is stored for `definition`, tombstoned or not.
pub fn is_set(values: &PropertyValues, definition: &str) -> bool {
    values.contains_key(definition)
}

/// The raw object stored for `definition`, `None` when unset.
///
/// A stored slot that does not hold an object at index 0 reads as empty.
pub fn stored_object(values: &PropertyValues, definition: &str) -> Option<Map<String, Value>> {
    let slot = values.get(definition)?;
    Some(
        slot.as_array()
            .and_then(|items| items.first())
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default(),
    )
}

/// Read the entry stored for `definition`, `None` when unset.
pub fn read_entry(values: &PropertyValues, definition: &str) -> Option<CustomPropertyEntry> {
    stored_object(values, definition).map(|obj| CustomPropertyEntry::from_stored(&Value::Object(obj)))
}

/// Store `entry` as the single element under `definition`.
pub fn write_entry(values: &mut PropertyValues, definition: &str, entry: Map<String, Value>) {
    values.insert(definition.to_string(), Value::Array(vec![Value::Object(entry)]));
}

/// The stored entry for `definition` marked for deletion, all fields kept.
pub fn tombstone(values: &PropertyValues, definition: &str) -> Map<String, Value> {
    let mut entry = stored_object(values, definition).unwrap_or_default();
    entry.insert("_delete".to_string(), Value::Bool(true));
    entry
}

/// A tombstone for the stored entry keeping only its id.
pub fn tombstone_id_only(values: &PropertyValues, definition: &str) -> Map<String, Value> {
    let mut entry = Map::new();
    if let Some(id) = stored_object(values, definition).and_then(|mut obj| obj.remove("id")) {
        entry.insert("id".to_string(), id);
    }
    entry.insert("_delete".to_string(), Value::Bool(true));
    entry
}

/// A definition can take a new row iff it is unset or its entry is tombstoned.
pub fn is_available(values: &PropertyValues, definition: &str) -> bool {
    match values.get(definition) {
        None => true,
        Some(_) => read_entry(values, definition).is_some_and(|e| e.delete),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use erm_fields::PropertyType;
    use serde_json::json;

    fn values(v: Value) -> PropertyValues {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn empty_entry_serializes_to_empty_object() {
        assert_eq!(
            serde_json::to_value(CustomPropertyEntry::default()).unwrap(),
            json!({})
        );
    }

    #[test]
    fn entry_round_trips_wire_names() {
        let raw = json!({
            "id": "cp-1",
            "value": "42",
            "note": "internal",
            "publicNote": "public",
            "internal": false,
            "_delete": true,
            "type": { "id": "t-9" }
        });
        let entry: CustomPropertyEntry = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(entry.public_note.as_deref(), Some("public"));
        assert!(entry.delete);
        assert_eq!(entry.extra["type"], json!({ "id": "t-9" }));
        assert_eq!(serde_json::to_value(&entry).unwrap(), raw);
    }

    #[test]
    fn internal_accepts_select_strings() {
        let entry: CustomPropertyEntry =
            serde_json::from_value(json!({ "internal": "true" })).unwrap();
        assert_eq!(entry.internal, Some(true));
        let entry: CustomPropertyEntry =
            serde_json::from_value(json!({ "internal": "false" })).unwrap();
        assert_eq!(entry.internal, Some(false));
    }

    #[test]
    fn effective_internal_inherits_default() {
        let def = CustomPropertyDefinition::new("authIP", "Auth IP", PropertyType::Text)
            .internal_by_default(true);
        let mut entry = CustomPropertyEntry::default();
        assert!(entry.effective_internal(&def));
        entry.internal = Some(false);
        assert!(!entry.effective_internal(&def));
    }

    #[test]
    fn tombstones_keep_id() {
        let values = values(json!({ "authIP": [{ "id": "cp-1", "value": "x" }] }));
        assert_eq!(
            Value::Object(tombstone_id_only(&values, "authIP")),
            json!({ "id": "cp-1", "_delete": true })
        );
        assert_eq!(
            Value::Object(tombstone(&values, "authIP")),
            json!({ "id": "cp-1", "value": "x", "_delete": true })
        );
    }

    #[test]
    fn mistyped_fields_survive_tombstoning() {
        let values = values(json!({ "authIP": [{ "id": "cp-9", "value": "x", "note": 5 }] }));

        let entry = read_entry(&values, "authIP").unwrap();
        assert_eq!(entry.id, Some(json!("cp-9")));
        assert_eq!(entry.note, None);

        assert_eq!(
            Value::Object(tombstone(&values, "authIP")),
            json!({ "id": "cp-9", "value": "x", "note": 5, "_delete": true })
        );
        assert_eq!(
            Value::Object(tombstone_id_only(&values, "authIP")),
            json!({ "id": "cp-9", "_delete": true })
        );
    }

    #[test]
    fn delete_flag_accepts_select_strings() {
        let values = values(json!({ "gone": [{ "id": 3, "_delete": "true" }] }));
        assert!(is_available(&values, "gone"));
    }

    #[test]
    fn availability_follows_tombstones() {
        let values = values(json!({
            "live": [{ "value": "1" }],
            "gone": [{ "id": "cp-2", "_delete": true }],
        }));
        assert!(!is_available(&values, "live"));
        assert!(is_available(&values, "gone"));
        assert!(is_available(&values, "unset"));
        assert!(is_set(&values, "gone"));
        assert!(!is_set(&values, "unset"));
    }

    #[test]
    fn read_and_write_use_singleton_array() {
        let mut values = PropertyValues::new();
        assert!(read_entry(&values, "authIP").is_none());

        let mut stored = Map::new();
        stored.insert("note".into(), json!("n"));
        write_entry(&mut values, "authIP", stored);
        assert_eq!(values["authIP"], json!([{ "note": "n" }]));
        assert_eq!(read_entry(&values, "authIP").unwrap().note.as_deref(), Some("n"));
    }

    #[test]
    fn malformed_slot_reads_as_empty_entry() {
        let values = values(json!({ "authIP": [], "walkIn": ["text"] }));
        assert_eq!(read_entry(&values, "authIP"), Some(CustomPropertyEntry::default()));
        assert_eq!(stored_object(&values, "walkIn"), Some(Map::new()));
    }

    #[test]
    fn patch_preserves_other_fields() {
        let mut stored = values(json!({ "id": 7, "note": "keep", "_delete": true, "score": [1] }));
        EntryPatch::Value(Some(json!("v"))).merge_into(&mut stored);
        assert_eq!(
            Value::Object(stored.clone()),
            json!({ "id": 7, "note": "keep", "_delete": true, "score": [1], "value": "v" })
        );

        EntryPatch::Note(None).merge_into(&mut stored);
        EntryPatch::Internal(Some(false)).merge_into(&mut stored);
        assert_eq!(stored.get("note"), None);
        assert_eq!(stored["internal"], json!(false));
    }

    #[test]
    fn entry_path_points_at_index_zero() {
        let root = FieldPath::key("customProperties");
        assert_eq!(entry_path(&root, "authIP").to_string(), "customProperties.authIP[0]");
    }
}
