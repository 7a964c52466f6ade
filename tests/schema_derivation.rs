use std::collections::BTreeMap;

use caseforge::analysis::{analyze, derive_schema, SchemaDeriver};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn assert_single_complete_step(schema: &Value) {
    let steps = schema["custom_steps_separated"].as_array().unwrap();
    assert_eq!(steps.len(), 1);
    assert!(!steps[0]["content"].as_str().unwrap().is_empty());
    assert!(!steps[0]["expected"].as_str().unwrap().is_empty());
}

#[test]
fn test_placeholders_follow_observed_types() {
    let samples = vec![json!({
        "title": "Checkout succeeds",
        "template_id": 2,
        "custom_automated": false,
        "estimate": null,
        "custom_steps_separated": [{"content": "Pay", "expected": "Receipt shown"}]
    })];
    let existing = vec![json!({"estimate": "5m"})];
    let schema = derive_schema(&samples, &BTreeMap::new(), 1, &existing);
    let value = serde_json::to_value(&schema).unwrap();

    assert_eq!(value["template_id"], json!(0));
    assert_eq!(value["custom_automated"], json!(true));
    assert!(value["title"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(value["estimate"].is_string());
    assert_eq!(
        value["custom_steps_separated"],
        json!([{"content": "Pay", "expected": "Receipt shown"}])
    );
}

#[test]
fn test_no_samples_still_yields_a_step() {
    let schema = derive_schema(&[], &BTreeMap::new(), 0, &[]);
    assert_eq!(schema.len(), 1);
    assert_single_complete_step(&serde_json::to_value(&schema).unwrap());
}

#[test]
fn test_incomplete_sample_steps_fall_back_to_existing_cases() {
    let samples = vec![json!({
        "title": "x",
        "custom_steps_separated": [{"content": "", "expected": "Nothing"}]
    })];
    let existing = vec![json!({
        "custom_steps_separated": [{"content": "Open cart", "expected": "Cart shown"}]
    })];
    let schema = derive_schema(&samples, &BTreeMap::new(), 1, &existing);
    let steps = schema.steps();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].content, "Open cart");
}

#[test]
fn test_variation_fields_join_after_sample_fields() {
    let existing = vec![
        json!({"title": "a", "custom_browser": "Chrome"}),
        json!({"title": "b", "custom_browser": "Firefox", "custom_flaky": true}),
    ];
    let patterns = analyze(&existing);
    let samples = vec![existing[0].clone()];
    let schema = derive_schema(&samples, &patterns.field_variations, existing.len(), &existing);

    let names: Vec<&str> = schema.field_names().collect();
    assert_eq!(
        names,
        vec!["title", "custom_browser", "custom_flaky", "custom_steps_separated"]
    );
    assert_eq!(schema.get("custom_flaky"), Some(&json!(true)));
    assert_eq!(schema.salience("custom_browser"), Some(1.0));
    assert_eq!(schema.salience("custom_flaky"), Some(0.5));
}

#[test]
fn test_exclusions_drop_server_managed_fields() {
    let samples = vec![json!({"id": 7, "created_on": 1700000000, "title": "t"})];
    let schema = SchemaDeriver::new()
        .with_exclusions(["id", "created_on", "custom_steps_separated"])
        .derive(&samples, &BTreeMap::new(), 1, &samples);
    assert!(!schema.contains("id"));
    assert!(!schema.contains("created_on"));
    assert!(schema.contains("title"));
    assert_single_complete_step(&serde_json::to_value(&schema).unwrap());
}

#[test]
fn test_derivation_is_deterministic() {
    let existing = vec![
        json!({"title": "a", "custom_x": 1, "refs": "R-1"}),
        json!({"title": "b", "custom_y": "y"}),
    ];
    let patterns = analyze(&existing);
    let first = derive_schema(&existing, &patterns.field_variations, 2, &existing);
    let second = derive_schema(&existing, &patterns.field_variations, 2, &existing);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}
