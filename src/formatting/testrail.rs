//! Mapping between generator output and TestRail's case shape.

use serde_json::{Map, Value};

use crate::record::steps::STEPS_SEPARATED;
use crate::record::{Record, PRECONDITIONS, PRIORITY, PRIORITY_ID, TITLE, TYPE, TYPE_ID};

/// Fields added by duplicate detection that TestRail would reject.
const DUPLICATE_DETECTION_FIELDS: [&str; 3] =
    ["similarity_score", "similarity_reasons", "similar_to_existing_id"];

const FUNCTIONAL_TYPE_ID: i64 = 1;
const ACCESSIBILITY_TYPE_ID: i64 = 2;
const MEDIUM_PRIORITY_ID: i64 = 3;

/// TestRail case type id for a generator test type.
pub fn testrail_type_id(test_type: &str) -> i64 {
    match test_type.trim().to_lowercase().as_str() {
        "accessibility" => ACCESSIBILITY_TYPE_ID,
        // positive, negative and edge cases are all functional in TestRail
        _ => FUNCTIONAL_TYPE_ID,
    }
}

/// TestRail priority id for a priority name.
pub fn testrail_priority_id(priority: &str) -> i64 {
    match priority.trim().to_lowercase().as_str() {
        "critical" => 5,
        "high" => 4,
        "medium" => 3,
        "low" => 2,
        _ => MEDIUM_PRIORITY_ID,
    }
}

/// Display name for a priority id in extraction summaries.
pub fn priority_display_name(id: &str) -> String {
    match id {
        "1" => "Low".to_string(),
        "2" => "Medium".to_string(),
        "3" => "High".to_string(),
        "4" => "Critical".to_string(),
        other => format!("Unknown ({other})"),
    }
}

/// Display name for a case type id in extraction summaries.
pub fn type_display_name(id: &str) -> String {
    match id {
        "1" => "Functional".to_string(),
        "2" => "Accessibility".to_string(),
        "3" => "Performance".to_string(),
        "4" => "Usability".to_string(),
        other => format!("Unknown ({other})"),
    }
}

fn is_testrail_shaped(case: &Map<String, Value>) -> bool {
    case.contains_key(STEPS_SEPARATED) && case.contains_key(PRECONDITIONS)
}

/// Steps from a generic `steps: [{step, expected}]` list, or from
/// already-separated steps.
fn convert_steps(value: &Value) -> Vec<Value> {
    let record = Record::new(value);
    let steps = record
        .value("steps")
        .or_else(|| record.value(STEPS_SEPARATED))
        .and_then(Value::as_array);

    steps
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .map(|step| {
            let content = step
                .get("step")
                .or_else(|| step.get("content"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            let expected = step
                .get("expected")
                .and_then(Value::as_str)
                .unwrap_or_default();
            serde_json::json!({"content": content, "expected": expected})
        })
        .collect()
}

fn format_case(value: &Value) -> Option<Map<String, Value>> {
    let case = value.as_object()?;
    let record = Record::new(value);

    let mut formatted = if is_testrail_shaped(case) {
        let mut formatted = case.clone();
        if !formatted.contains_key(TYPE_ID) {
            if let Some(name) = record.str_field(TYPE) {
                formatted.insert(TYPE_ID.to_string(), testrail_type_id(name).into());
            }
        }
        if !formatted.contains_key(PRIORITY_ID) {
            if let Some(name) = record.str_field(PRIORITY) {
                formatted.insert(PRIORITY_ID.to_string(), testrail_priority_id(name).into());
            }
        }
        formatted
    } else {
        let mut formatted = Map::new();
        formatted.insert(
            TITLE.to_string(),
            record.str_field(TITLE).unwrap_or_default().into(),
        );
        formatted.insert(
            TYPE_ID.to_string(),
            testrail_type_id(record.str_field(TYPE).unwrap_or("positive")).into(),
        );
        formatted.insert(
            PRIORITY_ID.to_string(),
            testrail_priority_id(record.str_field(PRIORITY).unwrap_or("Medium")).into(),
        );
        let preconditions = record
            .str_field("preconditions")
            .or_else(|| record.str_field(PRECONDITIONS))
            .unwrap_or_default();
        formatted.insert(PRECONDITIONS.to_string(), preconditions.into());
        formatted.insert(STEPS_SEPARATED.to_string(), Value::Array(convert_steps(value)));
        formatted
    };

    for field in DUPLICATE_DETECTION_FIELDS {
        formatted.remove(field);
    }
    Some(formatted)
}

/// Prepare generated cases for `add_case`.
///
/// Non-mapping entries are dropped with a warning.
pub fn format_for_testrail(cases: &[Value]) -> Vec<Value> {
    cases
        .iter()
        .filter_map(|case| {
            let formatted = format_case(case);
            if formatted.is_none() {
                tracing::warn!("Skipping generated test case that is not a mapping");
            }
            formatted
        })
        .map(Value::Object)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_generic_case_is_converted() {
        let cases = vec![json!({
            "title": "Login works",
            "type": "accessibility",
            "priority": "High",
            "preconditions": "Account exists",
            "steps": [{"step": "Open login", "expected": "Form shown"}, "junk"],
            "similarity_score": 0.4
        })];
        assert_eq!(
            format_for_testrail(&cases),
            vec![json!({
                "title": "Login works",
                "type_id": 2,
                "priority_id": 4,
                "custom_preconds": "Account exists",
                "custom_steps_separated": [{"content": "Open login", "expected": "Form shown"}]
            })]
        );
    }

    #[test]
    fn test_testrail_shaped_case_keeps_fields_and_gains_ids() {
        let cases = vec![json!({
            "title": "Already formatted",
            "type": "negative",
            "priority": "Critical",
            "custom_preconds": "",
            "custom_steps_separated": [],
            "refs": "ABC-1",
            "similar_to_existing_id": 12
        })];
        let formatted = format_for_testrail(&cases);
        assert_eq!(formatted[0]["type_id"], json!(1));
        assert_eq!(formatted[0]["priority_id"], json!(5));
        assert_eq!(formatted[0]["refs"], json!("ABC-1"));
        assert!(formatted[0].get("similar_to_existing_id").is_none());
    }

    #[test]
    fn test_existing_ids_are_not_overwritten() {
        let cases = vec![json!({
            "type_id": 16, "priority": "Low", "priority_id": 2,
            "custom_preconds": "p", "custom_steps_separated": []
        })];
        assert_eq!(format_for_testrail(&cases)[0]["type_id"], json!(16));
    }

    #[test]
    fn test_defaults_and_non_mappings() {
        let formatted = format_for_testrail(&[json!("nope"), json!({})]);
        assert_eq!(formatted.len(), 1);
        assert_eq!(formatted[0]["type_id"], json!(1));
        assert_eq!(formatted[0]["priority_id"], json!(3));
        assert_eq!(formatted[0]["title"], json!(""));
    }

    #[test]
    fn test_display_names() {
        assert_eq!(priority_display_name("4"), "Critical");
        assert_eq!(type_display_name("3"), "Performance");
        assert_eq!(type_display_name("Unknown"), "Unknown (Unknown)");
    }
}
