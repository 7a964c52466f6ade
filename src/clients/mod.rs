//! Blocking REST clients for TestRail and Jira.

pub mod jira;
pub mod testrail;

pub use jira::{flatten_adf, Attachment, JiraClient, TicketDetails};
pub use testrail::TestRailClient;

use std::time::Duration;

use serde_json::Value;

use crate::errors::{Error, Result};

/// Per-request timeout for both services.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The part of TestRail the commands depend on.
pub trait TestCaseStore {
    fn projects(&self) -> Result<Vec<Value>>;

    fn fetch_cases(&self, project_id: u64, suite_id: Option<u64>) -> Result<Vec<Value>>;

    fn sections(&self, project_id: u64, suite_id: Option<u64>) -> Result<Vec<Value>>;

    /// Create `case` in `section_id`, returning the stored case.
    fn add_case(&self, section_id: u64, case: &Value) -> Result<Value>;
}

/// Turn a non-success response into [`Error::Api`], otherwise parse JSON.
pub(crate) fn json_response(
    service: &'static str,
    response: reqwest::blocking::Response,
) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(Error::Api {
            service,
            status: status.as_u16(),
            body,
        });
    }
    let text = response.text()?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}
