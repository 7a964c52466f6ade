//! Remote service settings taken from the environment.
//!
//! A `.env` file in the working directory is honoured; real environment
//! variables win over it.

use std::env;

use crate::errors::{Error, Result};

pub const DEFAULT_PROJECT_ID: u64 = 1;
pub const DEFAULT_SUITE_ID: u64 = 1;
pub const DEFAULT_SECTION_ID: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRailConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    pub project_id: u64,
    pub suite_id: u64,
    pub target_section_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JiraConfig {
    pub url: String,
    pub username: String,
    pub api_token: String,
    pub ticket_id: Option<String>,
}

/// Load `.env` once; a missing file is not an error.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => log::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => log::warn!("Failed to load .env file: {}", e),
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(name: &str) -> Result<String> {
    var(name).ok_or_else(|| Error::configuration(format!("{name} is not set")))
}

fn numeric(name: &str, default: u64) -> Result<u64> {
    match var(name) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::configuration(format!("{name} must be a number, got '{raw}'"))),
    }
}

impl TestRailConfig {
    /// Read `TESTRAIL_*` and `TARGET_SECTION_ID`.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            url: required("TESTRAIL_URL")?.trim_end_matches('/').to_string(),
            username: required("TESTRAIL_USERNAME")?,
            password: required("TESTRAIL_PASSWORD")?,
            project_id: numeric("TESTRAIL_PROJECT_ID", DEFAULT_PROJECT_ID)?,
            suite_id: numeric("TESTRAIL_SUITE_ID", DEFAULT_SUITE_ID)?,
            target_section_id: numeric("TARGET_SECTION_ID", DEFAULT_SECTION_ID)?,
        })
    }
}

impl JiraConfig {
    /// Read `JIRA_URL`, `JIRA_USERNAME`, `JIRA_API_TOKEN` and `JIRA_TICKET_ID`.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            url: required("JIRA_URL")?.trim_end_matches('/').to_string(),
            username: required("JIRA_USERNAME")?,
            api_token: required("JIRA_API_TOKEN")?,
            ticket_id: var("JIRA_TICKET_ID"),
        })
    }
}
