//! Output schema derivation from sample test cases.
//!
//! Generated test cases have to be accepted by the same TestRail project the
//! samples came from, so instead of a fixed schema the generator is handed a
//! skeleton derived from the samples themselves: every field that actually
//! occurs, each mapped to a placeholder of the field's observed type.
//!
//! Representative values are chosen by strict input order (first sample with
//! a non-null value wins, then the wider knowledge base), and field order is
//! first-seen order followed by the sorted variation keys, so the same inputs
//! always produce the same schema.
//!
//! The step list is structural: a test case without an actionable step is
//! useless, so `custom_steps_separated` is always present with exactly one
//! step whose `content` and `expected` are both non-empty.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::record::steps::{separated_entries, STEPS_SEPARATED};
use crate::record::{Record, Step};

const DEFAULT_STEP_CONTENT: &str = "Describe the action to perform";
const DEFAULT_STEP_EXPECTED: &str = "Describe the observable expected result";

/// Field name to placeholder value, in derivation order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct DerivedSchema {
    fields: Map<String, Value>,
    #[serde(skip)]
    salience: BTreeMap<String, f64>,
}

impl DerivedSchema {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }

    /// The placeholder steps in canonical shape.
    pub fn steps(&self) -> Vec<Step> {
        self.fields
            .get(STEPS_SEPARATED)
            .and_then(Value::as_array)
            .map(|entries| entries.iter().map(Step::from_entry).collect())
            .unwrap_or_default()
    }

    /// Share of existing cases carrying `field`, when it was counted.
    pub fn salience(&self, field: &str) -> Option<f64> {
        self.salience.get(field).copied()
    }
}

/// Schema derivation with a configurable set of excluded fields.
///
/// Exclusions are meant for server-managed fields (`id`, timestamps) that a
/// generator must not invent; the steps field can never be excluded.
#[derive(Debug, Clone, Default)]
pub struct SchemaDeriver {
    excluded: BTreeSet<String>,
}

impl SchemaDeriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exclusions<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(fields.into_iter().map(Into::into));
        self
    }

    fn is_candidate(&self, field: &str) -> bool {
        field != STEPS_SEPARATED && !self.excluded.contains(field)
    }

    /// Candidate fields: sample keys in first-seen order, then the counted
    /// variation keys in sorted order.
    fn candidate_fields(
        &self,
        samples: &[Value],
        field_variations: &BTreeMap<String, usize>,
    ) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let sample_keys = samples.iter().flat_map(|sample| Record::new(sample).keys());
        let variation_keys = field_variations
            .iter()
            .filter(|(_, &count)| count > 0)
            .map(|(field, _)| field.as_str());

        sample_keys
            .chain(variation_keys)
            .filter(|field| self.is_candidate(field))
            .filter(|field| seen.insert(field.to_string()))
            .map(str::to_string)
            .collect()
    }

    pub fn derive(
        &self,
        samples: &[Value],
        field_variations: &BTreeMap<String, usize>,
        existing_count: usize,
        existing_cases: &[Value],
    ) -> DerivedSchema {
        let mut fields = Map::new();

        for field in self.candidate_fields(samples, field_variations) {
            let representative = samples
                .iter()
                .chain(existing_cases)
                .find_map(|case| Record::new(case).value(&field));
            fields.insert(field.clone(), placeholder(&field, representative));
        }

        let step = seed_step(samples)
            .or_else(|| seed_step(existing_cases))
            .unwrap_or_else(default_step);
        fields.insert(
            STEPS_SEPARATED.to_string(),
            Value::Array(vec![Value::Object(step)]),
        );

        let salience = if existing_count == 0 {
            BTreeMap::new()
        } else {
            field_variations
                .iter()
                .filter(|(field, _)| fields.contains_key(field.as_str()))
                .map(|(field, &count)| (field.clone(), count as f64 / existing_count as f64))
                .collect()
        };

        debug!(
            samples = samples.len(),
            existing = existing_count,
            fields = fields.len(),
            "Derived test case schema"
        );

        DerivedSchema { fields, salience }
    }
}

/// Derive a schema with no excluded fields.
pub fn derive_schema(
    samples: &[Value],
    field_variations: &BTreeMap<String, usize>,
    existing_count: usize,
    existing_cases: &[Value],
) -> DerivedSchema {
    SchemaDeriver::new().derive(samples, field_variations, existing_count, existing_cases)
}

/// Type-matching stand-in for a field's value.
fn placeholder(field: &str, representative: Option<&Value>) -> Value {
    match representative {
        Some(Value::Bool(_)) => Value::Bool(true),
        Some(Value::Number(number)) if number.is_i64() || number.is_u64() => Value::from(0),
        _ => Value::String(describe(field)),
    }
}

fn describe(field: &str) -> String {
    let description = match field {
        "title" => "Verify that <expected behaviour> when <condition>",
        "custom_preconds" => "Preconditions that must hold before the first step",
        "refs" => "Reference ID of the covered requirement",
        "estimate" => "Estimated execution time, e.g. 5min",
        "custom_steps" => "Steps to perform",
        "custom_expected" => "Expected result of the steps",
        "custom_testrail_bdd_scenario" => "Given <context> When <action> Then <outcome>",
        _ => return format!("<{field}>"),
    };
    description.to_string()
}

/// First complete step entry among `cases`, in input order.
fn seed_step(cases: &[Value]) -> Option<Map<String, Value>> {
    cases
        .iter()
        .flat_map(separated_entries)
        .find_map(|entry| {
            let step = Step::from_entry(&entry);
            match entry {
                Value::Object(map) if step.is_complete() => Some(step_skeleton(step, &map)),
                _ => None,
            }
        })
}

/// Seed step with its real text and any extra keys typed as placeholders.
fn step_skeleton(step: Step, entry: &Map<String, Value>) -> Map<String, Value> {
    let mut skeleton = Map::new();
    skeleton.insert("content".to_string(), Value::String(step.content));
    skeleton.insert("expected".to_string(), Value::String(step.expected));
    for (key, value) in entry {
        if key != "content" && key != "expected" {
            let representative = (!value.is_null()).then_some(value);
            skeleton.insert(key.clone(), placeholder(key, representative));
        }
    }
    skeleton
}

fn default_step() -> Map<String, Value> {
    let mut step = Map::new();
    step.insert(
        "content".to_string(),
        Value::String(DEFAULT_STEP_CONTENT.to_string()),
    );
    step.insert(
        "expected".to_string(),
        Value::String(DEFAULT_STEP_EXPECTED.to_string()),
    );
    step
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn no_variations() -> BTreeMap<String, usize> {
        BTreeMap::new()
    }

    #[test]
    fn test_numeric_and_boolean_placeholders() {
        let samples = vec![json!({
            "title": "Sample",
            "type_id": 16,
            "priority_id": 2,
            "custom_preconds": "{}",
            "custom_steps_separated": [{"content": "Do X", "expected": "See Y"}],
            "custom_automation_type": 1,
            "custom_flag": true,
        })];
        let variations =
            BTreeMap::from([("custom_automation_type".to_string(), 10), ("custom_flag".to_string(), 8)]);
        let schema = derive_schema(&samples, &variations, 10, &samples);

        assert_eq!(schema.get("custom_automation_type"), Some(&json!(0)));
        assert_eq!(schema.get("custom_flag"), Some(&json!(true)));
        assert_eq!(schema.get("type_id"), Some(&json!(0)));
        assert!(schema.get("title").and_then(Value::as_str).is_some_and(|s| !s.is_empty()));
        assert_eq!(schema.steps(), vec![Step::new("Do X", "See Y")]);
        assert_eq!(schema.salience("custom_flag"), Some(0.8));
    }

    #[test]
    fn test_empty_steps_get_default_placeholder() {
        let samples = vec![json!({"title": "S", "custom_steps_separated": []})];
        let schema = derive_schema(&samples, &no_variations(), 0, &[]);
        let steps = schema.get("custom_steps_separated").unwrap().as_array().unwrap();
        assert_eq!(steps.len(), 1);
        assert!(steps[0]["content"].as_str().is_some_and(|s| !s.is_empty()));
        assert!(steps[0]["expected"].as_str().is_some_and(|s| !s.is_empty()));
    }

    #[test]
    fn test_nothing_at_all_yields_only_steps() {
        let schema = derive_schema(&[], &no_variations(), 0, &[]);
        assert_eq!(schema.field_names().collect::<Vec<_>>(), vec!["custom_steps_separated"]);
        assert_eq!(schema.steps().len(), 1);
        assert!(schema.steps()[0].is_complete());
    }

    #[test]
    fn test_steps_fall_back_to_existing_cases() {
        let samples = vec![json!({"custom_steps_separated": [{"content": "", "expected": ""}]})];
        let existing = vec![
            json!({"custom_steps_separated": [{"content": "Only content", "expected": ""}]}),
            json!({"custom_steps_separated": [{"content": "Step", "expected": "Result", "additional_info": "note"}]}),
        ];
        let schema = derive_schema(&samples, &no_variations(), 2, &existing);
        assert_eq!(
            schema.get("custom_steps_separated"),
            Some(&json!([{"content": "Step", "expected": "Result", "additional_info": "<additional_info>"}]))
        );
    }

    #[test]
    fn test_first_non_null_sample_wins() {
        let samples = vec![
            json!({"custom_level": null}),
            json!({"custom_level": 3}),
            json!({"custom_level": "high"}),
        ];
        let schema = derive_schema(&samples, &no_variations(), 0, &[]);
        assert_eq!(schema.get("custom_level"), Some(&json!(0)));
    }

    #[test]
    fn test_variation_only_fields_use_existing_cases_for_type() {
        let existing = vec![json!({"custom_flag": false})];
        let variations = BTreeMap::from([
            ("custom_flag".to_string(), 1),
            ("custom_unused".to_string(), 0),
            ("custom_unseen".to_string(), 4),
        ]);
        let schema = derive_schema(&[], &variations, 1, &existing);
        assert_eq!(schema.get("custom_flag"), Some(&json!(true)));
        assert_eq!(schema.get("custom_unseen"), Some(&json!("<custom_unseen>")));
        assert!(!schema.contains("custom_unused"));
    }

    #[test]
    fn test_exclusions_and_field_order() {
        let samples = vec![json!({"id": 9, "title": "t", "custom_b": "x"}), json!({"custom_a": 1})];
        let schema = SchemaDeriver::new()
            .with_exclusions(["id", STEPS_SEPARATED])
            .derive(&samples, &no_variations(), 0, &[]);
        assert_eq!(
            schema.field_names().collect::<Vec<_>>(),
            vec!["title", "custom_b", "custom_a", "custom_steps_separated"]
        );
    }

    #[test]
    fn test_floats_and_arrays_become_strings() {
        let samples = vec![json!({"custom_ratio": 0.5, "labels": ["a"]})];
        let schema = derive_schema(&samples, &no_variations(), 0, &[]);
        assert_eq!(schema.get("custom_ratio"), Some(&json!("<custom_ratio>")));
        assert_eq!(schema.get("labels"), Some(&json!("<labels>")));
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let samples = vec![json!({"z": 1, "a": true, "m": "x"})];
        let variations = BTreeMap::from([("custom_q".to_string(), 2)]);
        let first = serde_json::to_string(&derive_schema(&samples, &variations, 2, &samples)).unwrap();
        let second = serde_json::to_string(&derive_schema(&samples, &variations, 2, &samples)).unwrap();
        assert_eq!(first, second);
        assert!(first.starts_with(r#"{"z":0,"a":true,"m":"<m>""#));
    }
}
