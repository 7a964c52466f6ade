use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::warn;

use crate::clients::{TestCaseStore, TestRailClient};
use crate::config::services::DEFAULT_SECTION_ID;
use crate::config::TestRailConfig;
use crate::errors::Error;
use crate::formatting::{format_for_testrail, Console};
use crate::io;
use crate::record::Record;

pub struct SaveConfig {
    pub input: PathBuf,
    pub section: Option<u64>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaveReport {
    pub processed: usize,
    pub saved: usize,
    pub failed: usize,
}

/// Push generated cases to TestRail.
pub fn save_test_cases(config: SaveConfig, console: &Console) -> Result<SaveReport> {
    println!("{}", console.header("Test Case Saver"));

    let cases = io::read_generated_cases(&config.input)
        .with_context(|| format!("Failed to load test cases from {}", config.input.display()))?;
    if cases.is_empty() {
        println!("{}", console.warning("No test cases to save"));
        return Ok(SaveReport::default());
    }
    println!("{}", io::generation_summary(&cases));

    if config.dry_run {
        let formatted = format_for_testrail(&cases);
        println!("{}", serde_json::to_string_pretty(&formatted)?);
        println!(
            "{}",
            console.info(&format!("Dry run: {} test cases not sent", formatted.len()))
        );
        return Ok(SaveReport {
            processed: cases.len(),
            ..SaveReport::default()
        });
    }

    let testrail = TestRailConfig::from_env().context("TestRail is not configured")?;
    let client = TestRailClient::new(&testrail)?;
    let report = save_with(&client, &testrail, config.section, &cases, console)?;

    println!("{}", console.header("Summary"));
    println!("Total test cases processed: {}", report.processed);
    println!("Successfully saved to TestRail: {}", report.saved);
    if report.failed > 0 {
        println!("{}", console.warning(&format!("Failed: {}", report.failed)));
    }
    Ok(report)
}

/// Target section: the explicit one, else `TARGET_SECTION_ID`, and when that
/// is still the default, the first section of the project's suite.
pub fn resolve_section<S: TestCaseStore>(
    store: &S,
    testrail: &TestRailConfig,
    explicit: Option<u64>,
) -> Result<u64> {
    if let Some(section) = explicit {
        return Ok(section);
    }
    if testrail.target_section_id != DEFAULT_SECTION_ID {
        return Ok(testrail.target_section_id);
    }

    let sections = store
        .sections(testrail.project_id, Some(testrail.suite_id))
        .context("Failed to list TestRail sections")?;
    sections
        .iter()
        .find_map(|section| {
            Record::new(section)
                .i64_field("id")
                .and_then(|id| u64::try_from(id).ok())
        })
        .ok_or_else(|| {
            Error::NotFound(format!(
                "no sections in TestRail project {} suite {}",
                testrail.project_id, testrail.suite_id
            ))
            .into()
        })
}

/// Format and add every case, carrying on past individual failures.
pub fn save_with<S: TestCaseStore>(
    store: &S,
    testrail: &TestRailConfig,
    section: Option<u64>,
    cases: &[Value],
    console: &Console,
) -> Result<SaveReport> {
    let section_id = resolve_section(store, testrail, section)?;
    let formatted = format_for_testrail(cases);

    let mut report = SaveReport {
        processed: cases.len(),
        ..SaveReport::default()
    };
    for case in &formatted {
        match store.add_case(section_id, case) {
            Ok(stored) => {
                report.saved += 1;
                let title = Record::new(&stored)
                    .str_field("title")
                    .unwrap_or("Untitled")
                    .to_string();
                println!("{}", console.success(&format!("Saved test case: {title}")));
            }
            Err(e) => {
                report.failed += 1;
                warn!("Error saving test case: {}", e);
                println!("{}", console.error(&format!("Error saving test case: {e}")));
            }
        }
    }
    Ok(report)
}
