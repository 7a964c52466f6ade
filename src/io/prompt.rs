use std::io::Write;

use serde_json::Value;

use crate::analysis::{PatternSummary, RequirementSet, CATEGORIES};
use crate::config::GenerationConfig;
use crate::errors::Result;
use crate::orchestrator::GenerationPayload;

const MAX_TITLES: usize = 10;
const MAX_PRECONDITIONS: usize = 5;
const MAX_FEATURE_CHARS: usize = 4000;

/// Markdown rendering of a generation payload for an external generator.
pub struct PromptWriter<W: Write> {
    writer: W,
}

impl<W: Write> PromptWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn write_payload(&mut self, payload: &GenerationPayload) -> Result<()> {
        writeln!(self.writer, "# Test Case Generation Request")?;
        writeln!(self.writer)?;
        self.write_config(&payload.config)?;
        self.write_conventions(&payload.patterns)?;
        self.write_requirements(&payload.requirements)?;
        self.write_features(payload)?;
        self.write_schema(payload)?;
        self.write_example(&payload.existing_test_cases)?;
        self.write_instructions(&payload.config)?;
        Ok(())
    }

    fn write_config(&mut self, config: &GenerationConfig) -> Result<()> {
        writeln!(self.writer, "## Configuration")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "- Test cases to generate: {}", config.test_case_count)?;
        let types: Vec<&str> = config.test_types.iter().map(|t| t.as_str()).collect();
        writeln!(self.writer, "- Test types: {}", types.join(", "))?;
        let distribution: Vec<String> = config
            .priority_distribution
            .iter()
            .map(|(name, share)| format!("{name} {share}%"))
            .collect();
        writeln!(self.writer, "- Priority distribution: {}", distribution.join(", "))?;
        if let Some(guideline) = &config.wcag_guideline {
            writeln!(self.writer, "- Accessibility guideline: {}", guideline)?;
        }
        writeln!(
            self.writer,
            "- Similarity threshold for duplicates: {:.2}",
            config.similarity_threshold
        )?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_conventions(&mut self, patterns: &PatternSummary) -> Result<()> {
        writeln!(self.writer, "## Existing Test Case Conventions")?;
        writeln!(self.writer)?;

        if patterns.is_empty() {
            writeln!(self.writer, "_No existing test cases._")?;
            writeln!(self.writer)?;
            return Ok(());
        }

        writeln!(self.writer, "- Existing test cases: {}", patterns.records_seen())?;
        if let Some(type_id) = patterns.dominant_type() {
            writeln!(self.writer, "- Most common type id: {}", type_id)?;
        }
        if let Some(priority_id) = patterns.dominant_priority() {
            writeln!(self.writer, "- Most common priority id: {}", priority_id)?;
        }
        writeln!(
            self.writer,
            "- Average steps per case: {:.1}",
            patterns.average_steps()
        )?;
        if !patterns.step_formats.is_empty() {
            let formats: Vec<&str> = patterns.step_formats.iter().map(|f| f.field()).collect();
            writeln!(self.writer, "- Step templates in use: {}", formats.join(", "))?;
        }
        if !patterns.custom_fields.is_empty() {
            let fields: Vec<&str> = patterns.custom_fields.iter().map(String::as_str).collect();
            writeln!(self.writer, "- Custom fields in use: {}", fields.join(", "))?;
        }
        writeln!(self.writer)?;

        if !patterns.naming_conventions.is_empty() {
            writeln!(self.writer, "Example titles:")?;
            writeln!(self.writer)?;
            for title in patterns.naming_conventions.iter().take(MAX_TITLES) {
                writeln!(self.writer, "- {}", title)?;
            }
            writeln!(self.writer)?;
        }

        if !patterns.common_preconditions.is_empty() {
            writeln!(self.writer, "Recurring preconditions:")?;
            writeln!(self.writer)?;
            for precondition in patterns.common_preconditions.iter().take(MAX_PRECONDITIONS) {
                writeln!(self.writer, "- {}", precondition.replace('\n', " "))?;
            }
            writeln!(self.writer)?;
        }
        Ok(())
    }

    fn write_requirements(&mut self, requirements: &RequirementSet) -> Result<()> {
        writeln!(self.writer, "## Requirements")?;
        writeln!(self.writer)?;

        if requirements.is_empty() {
            writeln!(self.writer, "_No categorized requirements found._")?;
            writeln!(self.writer)?;
            return Ok(());
        }

        for category in CATEGORIES {
            let items = requirements.bucket(category);
            if items.is_empty() {
                continue;
            }
            writeln!(self.writer, "### {}", category.label())?;
            writeln!(self.writer)?;
            for item in items {
                writeln!(self.writer, "- {}", item)?;
            }
            writeln!(self.writer)?;
        }
        Ok(())
    }

    fn write_features(&mut self, payload: &GenerationPayload) -> Result<()> {
        writeln!(self.writer, "## Feature Documents")?;
        writeln!(self.writer)?;

        if payload.features.is_empty() {
            writeln!(self.writer, "_No feature documents._")?;
            writeln!(self.writer)?;
            return Ok(());
        }

        for document in &payload.features {
            writeln!(self.writer, "### {}", document.filename)?;
            writeln!(self.writer)?;
            writeln!(self.writer, "{}", truncate(document.content.trim(), MAX_FEATURE_CHARS))?;
            writeln!(self.writer)?;
        }
        Ok(())
    }

    fn write_schema(&mut self, payload: &GenerationPayload) -> Result<()> {
        writeln!(self.writer, "## Output Schema")?;
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "Every generated test case must be a JSON object with these fields:"
        )?;
        writeln!(self.writer)?;
        writeln!(self.writer, "```json")?;
        writeln!(self.writer, "{}", serde_json::to_string_pretty(&payload.schema)?)?;
        writeln!(self.writer, "```")?;
        writeln!(self.writer)?;

        let usage: Vec<(&str, f64)> = payload
            .schema
            .field_names()
            .filter_map(|field| payload.schema.salience(field).map(|share| (field, share)))
            .collect();
        if !usage.is_empty() {
            writeln!(self.writer, "Custom field usage in existing test cases:")?;
            writeln!(self.writer)?;
            for (field, share) in usage {
                writeln!(self.writer, "- `{}`: {:.0}%", field, share * 100.0)?;
            }
            writeln!(self.writer)?;
        }
        Ok(())
    }

    fn write_example(&mut self, existing: &[Value]) -> Result<()> {
        let Some(example) = existing.iter().find(|case| case.is_object()) else {
            return Ok(());
        };
        writeln!(self.writer, "## Example Existing Test Case")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "```json")?;
        writeln!(self.writer, "{}", serde_json::to_string_pretty(example)?)?;
        writeln!(self.writer, "```")?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_instructions(&mut self, config: &GenerationConfig) -> Result<()> {
        writeln!(self.writer, "## Instructions")?;
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "1. Generate {} test cases covering the requirements above.",
            config.test_case_count
        )?;
        writeln!(
            self.writer,
            "2. Add `type` (one of the test types) and `priority` (one of the priority names) to each case."
        )?;
        writeln!(
            self.writer,
            "3. Follow the titles, preconditions and step style of the existing test cases."
        )?;
        writeln!(
            self.writer,
            "4. When a case resembles an existing one with similarity of {:.2} or more, add `similarity_score`, `similarity_reasons` and `similar_to_existing_id`.",
            config.similarity_threshold
        )?;
        writeln!(
            self.writer,
            "5. Return a JSON array and save it as `generated_test_cases.json` in the target directory."
        )?;
        Ok(())
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}\n\n_(truncated)_", &text[..cut]),
        None => text.to_string(),
    }
}

/// Render the whole prompt to a string.
pub fn render_prompt(payload: &GenerationPayload) -> Result<String> {
    let mut writer = PromptWriter::new(Vec::new());
    writer.write_payload(payload)?;
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}
