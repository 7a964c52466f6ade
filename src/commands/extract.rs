use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde_json::Value;
use tracing::info;

use crate::clients::{TestCaseStore, TestRailClient};
use crate::config::TestRailConfig;
use crate::formatting::Console;
use crate::io;
use crate::record::Record;

pub struct ExtractConfig {
    pub output: PathBuf,
}

impl ExtractConfig {
    /// `extraction_summary.txt` beside the knowledge base file.
    pub fn summary_path(&self) -> PathBuf {
        self.output
            .parent()
            .map(|dir| dir.join("extraction_summary.txt"))
            .unwrap_or_else(|| PathBuf::from("extraction_summary.txt"))
    }
}

/// Pull every case of the configured project into the knowledge base.
pub fn extract_test_cases(config: ExtractConfig, console: &Console) -> Result<()> {
    let testrail = TestRailConfig::from_env().context("TestRail is not configured")?;
    let client = TestRailClient::new(&testrail)?;

    println!("{}", console.header("TestRail Test Case Extractor"));
    println!("TestRail URL: {}", client.base_url());
    println!("Project ID: {}", testrail.project_id);
    println!("Output file: {}", config.output.display());

    extract_with(&client, testrail.project_id, &config, console).map(|_| ())
}

/// Name of project `project_id`, when the store lists it.
fn project_name(projects: &[Value], project_id: u64) -> Option<String> {
    projects
        .iter()
        .map(Record::new)
        .find(|project| project.i64_field("id") == i64::try_from(project_id).ok())
        .map(|project| project.str_field("name").unwrap_or("Unnamed").to_string())
}

/// Extraction against any store; returns the stored cases.
pub fn extract_with<S: TestCaseStore>(
    store: &S,
    project_id: u64,
    config: &ExtractConfig,
    console: &Console,
) -> Result<Vec<Value>> {
    let projects = store.projects().context("Failed to list TestRail projects")?;
    println!(
        "{}",
        console.success(&format!("Connected. Found {} projects.", projects.len()))
    );

    let Some(name) = project_name(&projects, project_id) else {
        let available: Vec<String> = projects
            .iter()
            .map(Record::new)
            .filter(Record::is_mapping)
            .map(|p| {
                format!(
                    "  - ID: {}, Name: {}",
                    p.identifier("id").unwrap_or_default(),
                    p.str_field("name").unwrap_or_default()
                )
            })
            .collect();
        anyhow::bail!(
            "Project with ID {} not found. Available projects:\n{}",
            project_id,
            available.join("\n")
        );
    };
    println!("{}", console.info(&format!("Extracting test cases from project: {name}")));

    let cases = store
        .fetch_cases(project_id, None)
        .with_context(|| format!("Failed to fetch test cases for project {project_id}"))?;
    info!(cases = cases.len(), project = project_id, "Fetched test cases");

    io::write_json_pretty(&config.output, &cases)
        .with_context(|| format!("Failed to write {}", config.output.display()))?;
    println!(
        "{}",
        console.success(&format!(
            "Exported {} test cases to {}",
            cases.len(),
            config.output.display()
        ))
    );

    if cases.is_empty() {
        println!("{}", console.warning("No test cases found in the project"));
        return Ok(cases);
    }

    write_summary(&config.summary_path(), &cases)?;
    Ok(cases)
}

fn write_summary(path: &Path, cases: &[Value]) -> Result<()> {
    let summary = io::extraction_summary(cases);
    println!("\n{}", summary);
    let stamped = format!(
        "{}\nExtracted at: {}\n",
        summary,
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    io::write_file(path, &stamped)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Summary saved to: {}", path.display());
    Ok(())
}
