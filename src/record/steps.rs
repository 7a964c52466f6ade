//! Step extraction across the three TestRail step templates.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Record;

pub const STEPS_SEPARATED: &str = "custom_steps_separated";
pub const EXPLORATORY_STEPS: &str = "custom_steps";
pub const EXPLORATORY_EXPECTED: &str = "custom_expected";
pub const BDD_SCENARIO: &str = "custom_testrail_bdd_scenario";

/// One actionable step in canonical shape.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Step {
    pub content: String,
    #[serde(default)]
    pub expected: String,
}

impl Step {
    pub fn new(content: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            expected: expected.into(),
        }
    }

    /// Both sides carry text, i.e. the step is usable as an example.
    pub fn is_complete(&self) -> bool {
        !self.content.trim().is_empty() && !self.expected.trim().is_empty()
    }

    /// Canonical step from one raw `custom_steps_separated` entry.
    ///
    /// Malformed entries are kept as empty steps so step counts stay aligned
    /// with the source records.
    pub fn from_entry(entry: &Value) -> Self {
        match entry {
            Value::Object(map) => Self {
                content: text_of(map.get("content")),
                expected: text_of(map.get("expected")),
            },
            Value::String(text) => Self::new(text.as_str(), ""),
            _ => Self::default(),
        }
    }
}

fn text_of(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}

/// Which template a record's steps were written in.
///
/// Serialized as the field that carries the steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StepFormat {
    #[serde(rename = "custom_steps_separated")]
    StepsSeparated,
    #[serde(rename = "custom_steps")]
    Exploratory,
    #[serde(rename = "custom_testrail_bdd_scenario")]
    Bdd,
}

impl StepFormat {
    pub const fn field(self) -> &'static str {
        match self {
            Self::StepsSeparated => STEPS_SEPARATED,
            Self::Exploratory => EXPLORATORY_STEPS,
            Self::Bdd => BDD_SCENARIO,
        }
    }
}

/// A record's procedure in whichever template it used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepEncoding {
    StepSeparated(Vec<Step>),
    Exploratory { steps: String, expected: String },
    Bdd(String),
}

impl StepEncoding {
    pub fn format(&self) -> StepFormat {
        match self {
            Self::StepSeparated(_) => StepFormat::StepsSeparated,
            Self::Exploratory { .. } => StepFormat::Exploratory,
            Self::Bdd(_) => StepFormat::Bdd,
        }
    }

    /// Fold into the canonical step sequence.
    pub fn into_steps(self) -> Vec<Step> {
        match self {
            Self::StepSeparated(steps) => steps,
            Self::Exploratory { steps, expected } => vec![Step::new(steps, expected)],
            Self::Bdd(scenario) => vec![Step::new(scenario, "")],
        }
    }
}

/// Raw `custom_steps_separated` entries.
///
/// The field is normally an array; a JSON-encoded string holding an array is
/// accepted too. Anything else counts as no steps.
pub fn separated_entries(value: &Value) -> Vec<Value> {
    match value.get(STEPS_SEPARATED) {
        Some(Value::Array(entries)) => entries.clone(),
        Some(Value::String(encoded)) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Array(entries)) => entries,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Detect the template a record uses, trying step-separated, then
/// exploratory, then BDD.
pub fn step_encoding(value: &Value) -> Option<StepEncoding> {
    let record = Record::new(value);
    if !record.is_mapping() {
        return None;
    }

    let entries = separated_entries(value);
    if !entries.is_empty() {
        return Some(StepEncoding::StepSeparated(
            entries.iter().map(Step::from_entry).collect(),
        ));
    }

    let steps = record.non_empty_str(EXPLORATORY_STEPS);
    let expected = record.non_empty_str(EXPLORATORY_EXPECTED);
    if steps.is_some() || expected.is_some() {
        return Some(StepEncoding::Exploratory {
            steps: steps.unwrap_or_default().to_string(),
            expected: expected.unwrap_or_default().to_string(),
        });
    }

    record
        .non_empty_str(BDD_SCENARIO)
        .map(|scenario| StepEncoding::Bdd(scenario.to_string()))
}

/// Canonical steps of a record; empty when it has none in any template.
pub fn extract_steps(value: &Value) -> Vec<Step> {
    step_encoding(value)
        .map(StepEncoding::into_steps)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_separated_steps_default_missing_expected() {
        let case = json!({
            "custom_steps_separated": [
                {"content": "Open page", "expected": "Page shown"},
                {"content": "Click"},
                {"expected": "orphan"}
            ]
        });
        let steps = extract_steps(&case);
        assert_eq!(
            steps,
            vec![
                Step::new("Open page", "Page shown"),
                Step::new("Click", ""),
                Step::new("", "orphan"),
            ]
        );
    }

    #[test]
    fn test_exploratory_folds_into_one_step() {
        let case = json!({"custom_steps": "Explore menus", "custom_expected": "No crash"});
        let encoding = step_encoding(&case).unwrap();
        assert_eq!(encoding.format(), StepFormat::Exploratory);
        assert_eq!(
            encoding.into_steps(),
            vec![Step::new("Explore menus", "No crash")]
        );
    }

    #[test]
    fn test_bdd_scenario_has_empty_expected() {
        let case = json!({"custom_testrail_bdd_scenario": "Given a user\nWhen ..."});
        assert_eq!(
            extract_steps(&case),
            vec![Step::new("Given a user\nWhen ...", "")]
        );
    }

    #[test]
    fn test_empty_separated_falls_through_to_other_templates() {
        let case = json!({"custom_steps_separated": [], "custom_steps": "Do it"});
        assert_eq!(
            step_encoding(&case).map(|e| e.format()),
            Some(StepFormat::Exploratory)
        );
    }

    #[test]
    fn test_json_encoded_steps_are_decoded() {
        let case = json!({"custom_steps_separated": r#"[{"content":"a","expected":"b"}]"#});
        assert_eq!(extract_steps(&case), vec![Step::new("a", "b")]);
    }

    #[test]
    fn test_no_steps_anywhere() {
        assert!(extract_steps(&json!({"custom_steps_separated": null})).is_empty());
        assert!(extract_steps(&json!({"title": "x"})).is_empty());
        assert!(extract_steps(&json!("not a record")).is_empty());
    }

    #[test]
    fn test_step_format_serializes_as_field_name() {
        assert_eq!(
            serde_json::to_value(StepFormat::Bdd).unwrap(),
            json!("custom_testrail_bdd_scenario")
        );
    }
}
