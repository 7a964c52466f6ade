//! Convention statistics over existing test cases.
//!
//! One pass over the knowledge base collects how the team writes test cases:
//! which types and priorities they use, how titles read, how steps are
//! written and in which template, which preconditions recur and which custom
//! fields are in play. The result feeds both the generation prompt and the
//! schema deriver (through [`PatternSummary::field_variations`]).
//!
//! Every per-record contribution is an increment, an append or a set union,
//! so two summaries over consecutive slices [`merge`](PatternSummary::merge)
//! into the summary of the whole.

use std::collections::{BTreeMap, BTreeSet};

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::record::{step_encoding, Record, StepFormat};

/// A single step as observed in the knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepDescriptor {
    pub format: StepFormat,
    pub content: String,
    pub expected: String,
}

/// Aggregated conventions of a set of records.
///
/// Serializes to `{}` when built from no records at all, and to a mapping
/// with all eight keys otherwise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternSummary {
    records_seen: usize,
    pub types: BTreeMap<String, usize>,
    pub priorities: BTreeMap<String, usize>,
    pub naming_conventions: Vec<String>,
    pub step_patterns: Vec<StepDescriptor>,
    pub common_preconditions: Vec<String>,
    pub custom_fields: BTreeSet<String>,
    pub field_variations: BTreeMap<String, usize>,
    pub step_formats: BTreeSet<StepFormat>,
}

impl PatternSummary {
    /// True when no input records were seen.
    pub fn is_empty(&self) -> bool {
        self.records_seen == 0
    }

    /// Number of input entries, including skipped non-mapping ones.
    pub fn records_seen(&self) -> usize {
        self.records_seen
    }

    /// Fold one record into the summary.
    pub fn observe(&mut self, value: &Value) {
        self.records_seen += 1;

        let record = Record::new(value);
        if !record.is_mapping() {
            warn!(
                "Skipping test case that is not a mapping: {}",
                preview(value)
            );
            return;
        }

        if let Some(case_type) = record.case_type() {
            *self.types.entry(case_type).or_insert(0) += 1;
        }
        if let Some(priority) = record.priority() {
            *self.priorities.entry(priority).or_insert(0) += 1;
        }

        if let Some(title) = record.title() {
            self.naming_conventions.push(title.to_string());
        }

        if let Some(encoding) = step_encoding(value) {
            let format = encoding.format();
            self.step_formats.insert(format);
            self.step_patterns
                .extend(encoding.into_steps().into_iter().map(|step| StepDescriptor {
                    format,
                    content: step.content,
                    expected: step.expected,
                }));
        }

        if let Some(precondition) = record.preconditions().and_then(precondition_text) {
            if !self.common_preconditions.contains(&precondition) {
                self.common_preconditions.push(precondition);
            }
        }

        for field in record.custom_fields() {
            self.custom_fields.insert(field.to_string());
            *self.field_variations.entry(field.to_string()).or_insert(0) += 1;
        }
    }

    /// Combine with the summary of the records that followed this one's.
    pub fn merge(mut self, other: PatternSummary) -> PatternSummary {
        self.records_seen += other.records_seen;
        add_counts(&mut self.types, other.types);
        add_counts(&mut self.priorities, other.priorities);
        add_counts(&mut self.field_variations, other.field_variations);
        self.naming_conventions.extend(other.naming_conventions);
        self.step_patterns.extend(other.step_patterns);
        for precondition in other.common_preconditions {
            if !self.common_preconditions.contains(&precondition) {
                self.common_preconditions.push(precondition);
            }
        }
        self.custom_fields.extend(other.custom_fields);
        self.step_formats.extend(other.step_formats);
        self
    }

    /// Most frequent type; ties resolve to the smallest key.
    pub fn dominant_type(&self) -> Option<&str> {
        dominant(&self.types)
    }

    /// Most frequent priority; ties resolve to the smallest key.
    pub fn dominant_priority(&self) -> Option<&str> {
        dominant(&self.priorities)
    }

    /// Mean number of steps per input record.
    pub fn average_steps(&self) -> f64 {
        if self.records_seen == 0 {
            return 0.0;
        }
        self.step_patterns.len() as f64 / self.records_seen as f64
    }
}

impl Serialize for PatternSummary {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if self.is_empty() {
            return serializer.serialize_map(Some(0))?.end();
        }
        let mut map = serializer.serialize_map(Some(8))?;
        map.serialize_entry("types", &self.types)?;
        map.serialize_entry("priorities", &self.priorities)?;
        map.serialize_entry("naming_conventions", &self.naming_conventions)?;
        map.serialize_entry("step_patterns", &self.step_patterns)?;
        map.serialize_entry("common_preconditions", &self.common_preconditions)?;
        map.serialize_entry("custom_fields", &self.custom_fields)?;
        map.serialize_entry("field_variations", &self.field_variations)?;
        map.serialize_entry("step_formats", &self.step_formats)?;
        map.end()
    }
}

/// Summarize the conventions of `records`.
pub fn analyze(records: &[Value]) -> PatternSummary {
    let summary = records
        .iter()
        .fold(PatternSummary::default(), |mut summary, record| {
            summary.observe(record);
            summary
        });
    debug!(
        records = summary.records_seen,
        steps = summary.step_patterns.len(),
        custom_fields = summary.custom_fields.len(),
        "Analyzed test case patterns"
    );
    summary
}

/// Readable text of a precondition field.
///
/// Some projects store preconditions JSON-encoded; an encoded string is
/// unwrapped and an encoded empty object or array means "none".
fn precondition_text(raw: &str) -> Option<String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::String(inner)) => {
            let inner = inner.trim();
            (!inner.is_empty()).then(|| inner.to_string())
        }
        Ok(Value::Object(map)) if map.is_empty() => None,
        Ok(Value::Array(items)) if items.is_empty() => None,
        Ok(Value::Null) => None,
        _ => Some(raw.to_string()),
    }
}

fn add_counts(into: &mut BTreeMap<String, usize>, from: BTreeMap<String, usize>) {
    for (key, count) in from {
        *into.entry(key).or_insert(0) += count;
    }
}

fn dominant(counts: &BTreeMap<String, usize>) -> Option<&str> {
    counts
        .iter()
        .fold(None, |best: Option<(&String, usize)>, (key, &count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((key, count)),
        })
        .map(|(key, _)| key.as_str())
}

fn preview(value: &Value) -> String {
    let text = value.to_string();
    match text.char_indices().nth(60) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text,
    }
}
