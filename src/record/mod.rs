//! Tolerant access to schema-less test-case records.
//!
//! Records come straight out of the test-management service (or a knowledge
//! base file written from it) and have no fixed shape: the template decides
//! which step fields exist, every project adds its own `custom_*` fields, and
//! any field may be missing, `null` or of an unexpected type. This module
//! keeps records as plain [`serde_json::Value`]s and layers a small set of
//! typed accessors on top that degrade to "absent" instead of failing.
//!
//! ```rust
//! use caseforge::record::{get, Record};
//! use serde_json::json;
//!
//! let case = json!({"title": "Login", "priority_id": 3, "refs": null});
//! assert_eq!(get(&case, "refs", json!("none")), json!("none"));
//! assert_eq!(Record::new(&case).identifier("priority_id").as_deref(), Some("3"));
//!
//! // Non-mapping records behave like empty ones.
//! assert_eq!(get(&json!("oops"), "title", json!("")), json!(""));
//! ```

pub mod steps;

pub use steps::{extract_steps, step_encoding, Step, StepEncoding, StepFormat};

use serde_json::{Map, Value};

/// Prefix shared by every project-defined field.
pub const CUSTOM_FIELD_PREFIX: &str = "custom_";

pub const TITLE: &str = "title";
pub const TYPE: &str = "type";
pub const TYPE_ID: &str = "type_id";
pub const PRIORITY: &str = "priority";
pub const PRIORITY_ID: &str = "priority_id";
pub const SECTION_ID: &str = "section_id";
pub const PRECONDITIONS: &str = "custom_preconds";

/// Borrowed view over one record.
///
/// A value that is not a JSON object is viewed as an empty record, so every
/// accessor answers `None` for it.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    fields: Option<&'a Map<String, Value>>,
}

impl<'a> Record<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self {
            fields: value.as_object(),
        }
    }

    /// Whether the underlying value was a mapping at all.
    pub fn is_mapping(&self) -> bool {
        self.fields.is_some()
    }

    /// Field names in input order.
    pub fn keys(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .into_iter()
            .flat_map(|map| map.keys().map(String::as_str))
    }

    /// Whether the key exists, even when its value is `null`.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.is_some_and(|map| map.contains_key(field))
    }

    /// The field's value, treating `null` like absence.
    pub fn value(&self, field: &str) -> Option<&'a Value> {
        self.fields?.get(field).filter(|value| !value.is_null())
    }

    pub fn str_field(&self, field: &str) -> Option<&'a str> {
        self.value(field)?.as_str()
    }

    /// String field with surrounding whitespace removed; blank counts as absent.
    pub fn non_empty_str(&self, field: &str) -> Option<&'a str> {
        self.str_field(field)
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    pub fn i64_field(&self, field: &str) -> Option<i64> {
        self.value(field)?.as_i64()
    }

    /// Scalar value rendered as a map key.
    ///
    /// Integers and their string spellings collapse to the same key (`1` and
    /// `"1"` both become `"1"`) so counts never split on representation.
    pub fn identifier(&self, field: &str) -> Option<String> {
        match self.value(field)? {
            Value::String(text) => {
                let text = text.trim();
                (!text.is_empty()).then(|| text.to_string())
            }
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        }
    }

    /// First field in `fields` that yields an identifier.
    pub fn first_identifier(&self, fields: &[&str]) -> Option<String> {
        fields.iter().find_map(|field| self.identifier(field))
    }

    /// Human-readable type, falling back to the numeric `type_id`.
    pub fn case_type(&self) -> Option<String> {
        self.first_identifier(&[TYPE, TYPE_ID])
    }

    /// Human-readable priority, falling back to the numeric `priority_id`.
    pub fn priority(&self) -> Option<String> {
        self.first_identifier(&[PRIORITY, PRIORITY_ID])
    }

    pub fn title(&self) -> Option<&'a str> {
        self.non_empty_str(TITLE)
    }

    pub fn preconditions(&self) -> Option<&'a str> {
        self.non_empty_str(PRECONDITIONS)
    }

    /// Project-defined fields present on this record, in input order.
    pub fn custom_fields(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.keys().filter(|key| is_custom_field(key))
    }
}

/// `record[field]` when present and non-null, `default` otherwise.
///
/// Never fails, whatever `record` turns out to be.
pub fn get(record: &Value, field: &str, default: Value) -> Value {
    Record::new(record).value(field).cloned().unwrap_or(default)
}

/// Whether `name` follows the custom-field naming convention.
pub fn is_custom_field(name: &str) -> bool {
    name.len() > CUSTOM_FIELD_PREFIX.len() && name.starts_with(CUSTOM_FIELD_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_returns_default_for_null_and_missing() {
        let case = json!({"title": "A", "refs": null});
        assert_eq!(get(&case, "title", json!("x")), json!("A"));
        assert_eq!(get(&case, "refs", json!("x")), json!("x"));
        assert_eq!(get(&case, "estimate", json!(0)), json!(0));
    }

    #[test]
    fn test_non_mapping_record_is_empty() {
        for value in [json!("bare string"), json!(42), json!([1, 2]), Value::Null] {
            let record = Record::new(&value);
            assert!(!record.is_mapping());
            assert_eq!(record.keys().count(), 0);
            assert_eq!(record.title(), None);
            assert_eq!(get(&value, "title", json!("d")), json!("d"));
        }
    }

    #[test]
    fn test_identifier_normalizes_numbers_and_strings() {
        let case = json!({"type_id": 1, "priority": " High ", "type": ""});
        let record = Record::new(&case);
        assert_eq!(record.case_type().as_deref(), Some("1"));
        assert_eq!(record.priority().as_deref(), Some("High"));
    }

    #[test]
    fn test_wrong_typed_fields_degrade() {
        let case = json!({"title": 17, "custom_preconds": ["a"], "type": {"id": 1}});
        let record = Record::new(&case);
        assert_eq!(record.title(), None);
        assert_eq!(record.preconditions(), None);
        assert_eq!(record.case_type(), None);
    }

    #[test]
    fn test_custom_field_detection() {
        assert!(is_custom_field("custom_flag"));
        assert!(!is_custom_field("custom_"));
        assert!(!is_custom_field("title"));
        let case = json!({"custom_b": 1, "title": "t", "custom_a": true});
        let names: Vec<_> = Record::new(&case).custom_fields().collect();
        assert_eq!(names, vec!["custom_b", "custom_a"]);
    }
}
