//! Pattern analysis over knowledge-base shaped records.

use caseforge::analysis::{analyze, PatternSummary};
use caseforge::StepFormat;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value};

fn sample_knowledge_base() -> Vec<Value> {
    vec![
        json!({
            "id": 101,
            "title": "Verify login with valid credentials",
            "section_id": 5,
            "type_id": 1,
            "priority_id": 4,
            "custom_preconds": "User account exists",
            "custom_steps_separated": [
                {"content": "Open the login page", "expected": "Login form is shown"},
                {"content": "Submit valid credentials", "expected": "Dashboard is shown"}
            ],
            "custom_automation_type": 0
        }),
        json!({
            "id": 102,
            "title": "Verify logout",
            "section_id": 5,
            "type_id": "1",
            "priority_id": 3,
            "custom_preconds": "User account exists",
            "custom_steps_separated": [
                {"content": "Click logout", "expected": "Login page is shown"}
            ]
        }),
    ]
}

#[test]
fn test_summary_of_knowledge_base() {
    let summary = analyze(&sample_knowledge_base());

    assert_eq!(summary.types.get("1"), Some(&2));
    assert_eq!(summary.priorities.get("4"), Some(&1));
    assert_eq!(summary.priorities.get("3"), Some(&1));
    assert_eq!(summary.naming_conventions.len(), 2);
    assert_eq!(summary.step_patterns.len(), 3);
    assert_eq!(summary.common_preconditions, vec!["User account exists"]);
    assert!(summary.custom_fields.contains("custom_automation_type"));
    assert_eq!(summary.field_variations.get("custom_preconds"), Some(&2));
    assert_eq!(summary.field_variations.get("custom_automation_type"), Some(&1));
    assert_eq!(
        summary.step_formats.iter().copied().collect::<Vec<_>>(),
        vec![StepFormat::StepsSeparated]
    );
}

#[test]
fn test_empty_input_serializes_to_empty_mapping() {
    let summary = analyze(&[]);
    assert!(summary.is_empty());
    assert_eq!(serde_json::to_value(&summary).unwrap(), json!({}));
}

#[test]
fn test_non_empty_input_serializes_all_keys() {
    let value = serde_json::to_value(analyze(&[json!({})])).unwrap();
    let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "types",
            "priorities",
            "naming_conventions",
            "step_patterns",
            "common_preconditions",
            "custom_fields",
            "field_variations",
            "step_formats"
        ]
    );
}

#[test]
fn test_malformed_records_are_skipped() {
    let records = vec![
        json!("a string"),
        json!(42),
        json!(null),
        json!({"title": "Only valid one", "type_id": 2}),
    ];
    let summary = analyze(&records);
    assert_eq!(summary.naming_conventions, vec!["Only valid one"]);
    assert_eq!(summary.types.get("2"), Some(&1));
    assert_eq!(summary.records_seen(), 4);
}

#[test]
fn test_mixed_step_templates_are_all_recorded() {
    let records = vec![
        json!({"custom_steps": "Open the app", "custom_expected": "App opens"}),
        json!({"custom_testrail_bdd_scenario": "Given a user When they log in Then they see home"}),
        json!({"custom_steps_separated": "[{\"content\": \"Encoded\", \"expected\": \"Decoded\"}]"}),
    ];
    let summary = analyze(&records);
    assert_eq!(summary.step_formats.len(), 3);
    assert_eq!(summary.step_patterns.len(), 3);
    assert_eq!(summary.step_patterns[2].content, "Encoded");
}

fn record_strategy() -> impl Strategy<Value = Value> {
    (
        "[A-Za-z][A-Za-z ]{0,20}",
        1u8..5,
        1u8..5,
        prop::option::of("[a-z]{1,8}"),
        0usize..4,
    )
        .prop_map(|(title, type_id, priority_id, custom, steps)| {
            let mut record = json!({
                "title": title,
                "type_id": type_id,
                "priority_id": priority_id,
                "custom_steps_separated": (0..steps)
                    .map(|i| json!({"content": format!("step {i}"), "expected": "ok"}))
                    .collect::<Vec<_>>(),
            });
            if let Some(name) = custom {
                record[format!("custom_{name}")] = json!(true);
            }
            record
        })
}

proptest! {
    /// Every record with a title, type and priority is counted exactly once.
    #[test]
    fn prop_counts_cover_every_record(records in prop::collection::vec(record_strategy(), 0..40)) {
        let summary = analyze(&records);
        prop_assert_eq!(summary.naming_conventions.len(), records.len());
        prop_assert_eq!(summary.types.values().sum::<usize>(), records.len());
        prop_assert_eq!(summary.priorities.values().sum::<usize>(), records.len());
    }

    /// Splitting the input anywhere and merging gives the single-pass summary.
    #[test]
    fn prop_merge_matches_single_pass(
        records in prop::collection::vec(record_strategy(), 0..30),
        split in 0usize..30,
    ) {
        let split = split.min(records.len());
        let (head, tail) = records.split_at(split);
        let merged: PatternSummary = analyze(head).merge(analyze(tail));
        prop_assert_eq!(merged, analyze(&records));
    }

    /// A custom field's variation count never exceeds the number of records.
    #[test]
    fn prop_field_variations_bounded(records in prop::collection::vec(record_strategy(), 1..30)) {
        let summary = analyze(&records);
        for count in summary.field_variations.values() {
            prop_assert!(*count <= records.len());
        }
        prop_assert!(summary.field_variations.keys().all(|k| summary.custom_fields.contains(k)));
    }
}
