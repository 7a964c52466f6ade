use comfy_table::presets::ASCII_MARKDOWN;
use comfy_table::Table;
use serde_json::Value;

use crate::formatting::{priority_display_name, type_display_name};
use crate::record::{Record, PRIORITY, PRIORITY_ID, SECTION_ID, TYPE, TYPE_ID};

const UNKNOWN: &str = "Unknown";

/// Counts in first-seen key order.
#[derive(Debug, Default)]
struct Tally(Vec<(String, usize)>);

impl Tally {
    fn add(&mut self, key: String) {
        match self.0.iter_mut().find(|(seen, _)| *seen == key) {
            Some((_, count)) => *count += 1,
            None => self.0.push((key, 1)),
        }
    }

    fn table(&self, heading: &str, label: impl Fn(&str) -> String) -> Table {
        let mut table = Table::new();
        table.load_preset(ASCII_MARKDOWN).set_header(vec![heading, "Count"]);
        for (key, count) in &self.0 {
            table.add_row(vec![label(key), count.to_string()]);
        }
        table
    }
}

/// Human-readable summary of an extracted knowledge base.
///
/// Breakdowns are by TestRail priority, type and section id; entries that
/// are not mappings are counted in the total only.
pub fn extraction_summary(records: &[Value]) -> String {
    if records.is_empty() {
        return "No test cases extracted.\n".to_string();
    }

    let mut priorities = Tally::default();
    let mut types = Tally::default();
    let mut sections = Tally::default();

    for record in records.iter().map(Record::new).filter(Record::is_mapping) {
        let id_or_unknown = |field| record.identifier(field).unwrap_or_else(|| UNKNOWN.to_string());
        priorities.add(id_or_unknown(PRIORITY_ID));
        types.add(id_or_unknown(TYPE_ID));
        sections.add(id_or_unknown(SECTION_ID));
    }

    format!(
        "Test Case Extraction Summary\n\
         ============================\n\n\
         Total Test Cases: {}\n\n\
         Breakdown by Priority:\n{}\n\n\
         Breakdown by Type:\n{}\n\n\
         Breakdown by Section:\n{}\n",
        records.len(),
        priorities.table("Priority", priority_display_name),
        types.table("Type", type_display_name),
        sections.table("Section", |id| format!("Section {id}")),
    )
}

/// Summary of generator output, by requested test type and priority name.
pub fn generation_summary(cases: &[Value]) -> String {
    let mut types = Tally::default();
    let mut priorities = Tally::default();

    for record in cases.iter().map(Record::new).filter(Record::is_mapping) {
        let name_or_unknown = |field| {
            record
                .non_empty_str(field)
                .map(str::to_string)
                .unwrap_or_else(|| UNKNOWN.to_string())
        };
        types.add(name_or_unknown(TYPE));
        priorities.add(name_or_unknown(PRIORITY));
    }

    format!(
        "Generated Test Cases: {}\n\nBy Type:\n{}\n\nBy Priority:\n{}\n",
        cases.len(),
        types.table("Type", str::to_string),
        priorities.table("Priority", str::to_string),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn has_row(summary: &str, label: &str, count: &str) -> bool {
        summary.lines().any(|line| {
            let cells: Vec<&str> = line
                .split('|')
                .map(str::trim)
                .filter(|cell| !cell.is_empty())
                .collect();
            cells == [label, count]
        })
    }

    #[test]
    fn test_empty_extraction() {
        assert_eq!(extraction_summary(&[]), "No test cases extracted.\n");
    }

    #[test]
    fn test_extraction_breakdowns_use_display_names() {
        let records = vec![
            json!({"priority_id": 4, "type_id": 1, "section_id": 10}),
            json!({"priority_id": "4", "type_id": 2, "section_id": 10}),
            json!({"title": "no ids"}),
            json!("not a record"),
        ];
        let summary = extraction_summary(&records);
        assert!(summary.contains("Total Test Cases: 4"));
        assert!(has_row(&summary, "Critical", "2"));
        assert!(has_row(&summary, "Accessibility", "1"));
        assert!(has_row(&summary, "Unknown (Unknown)", "1"));
        assert!(has_row(&summary, "Section 10", "2"));
    }

    #[test]
    fn test_generation_summary_counts_names() {
        let cases = vec![
            json!({"type": "positive", "priority": "High"}),
            json!({"type": "positive", "priority": "Low"}),
            json!({"type": "edge"}),
        ];
        let summary = generation_summary(&cases);
        assert!(summary.starts_with("Generated Test Cases: 3"));
        assert!(has_row(&summary, "positive", "2"));
        assert!(has_row(&summary, "Unknown", "1"));
    }
}
