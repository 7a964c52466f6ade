//! TestRail API v2 client.
//!
//! Every endpoint lives under `index.php?/api/v2/`, so filters are appended
//! with `&` rather than `?`. List endpoints on TestRail 6.7+ answer with a
//! page object (`{offset, limit, size, _links: {next}, <items>: [...]}`);
//! older servers answer with a bare list. Both are accepted and pages are
//! followed until `_links.next` is null, a page comes back empty, a link
//! repeats or [`MAX_PAGES`] pages have been read.

use std::collections::HashSet;

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{json_response, TestCaseStore, REQUEST_TIMEOUT};
use crate::config::TestRailConfig;
use crate::errors::{Error, Result};

const SERVICE: &str = "TestRail";
const API_PREFIX: &str = "/api/v2/";

/// 250-item pages up to offset 10000.
pub const MAX_PAGES: usize = 40;

#[derive(Debug, Clone)]
pub struct TestRailClient {
    http: Client,
    base_url: String,
    username: String,
    password: String,
}

/// One page of a list endpoint.
#[derive(Debug, PartialEq)]
struct Page {
    items: Vec<Value>,
    next: Option<String>,
}

impl Page {
    /// Split a response into its items and the next endpoint, if any.
    fn parse(response: Value, items_key: &str) -> Self {
        match response {
            Value::Array(items) => Self { items, next: None },
            Value::Object(mut map) => {
                let next = map
                    .get("_links")
                    .and_then(|links| links.get("next"))
                    .and_then(Value::as_str)
                    .and_then(|link| link.split_once(API_PREFIX))
                    .map(|(_, endpoint)| endpoint.to_string());
                let key = [items_key, "data"]
                    .into_iter()
                    .find(|key| map.get(*key).is_some_and(Value::is_array));
                let items = match key.and_then(|key| map.remove(key)) {
                    Some(Value::Array(items)) => items,
                    _ => vec![Value::Object(map)],
                };
                Self { items, next }
            }
            _ => Self {
                items: Vec::new(),
                next: None,
            },
        }
    }
}

/// Read pages starting at `endpoint` through `fetch` and concatenate them.
fn collect_pages<F>(endpoint: String, items_key: &str, mut fetch: F) -> Result<Vec<Value>>
where
    F: FnMut(&str) -> Result<Value>,
{
    let mut items = Vec::new();
    let mut seen = HashSet::new();
    let mut next = Some(endpoint);
    while let Some(endpoint) = next.take() {
        if seen.len() == MAX_PAGES {
            warn!("Stopping after {} pages of {}", MAX_PAGES, items_key);
            break;
        }
        if !seen.insert(endpoint.clone()) {
            warn!("TestRail repeated page link {}; stopping", endpoint);
            break;
        }
        let page = Page::parse(fetch(&endpoint)?, items_key);
        if page.items.is_empty() {
            break;
        }
        items.extend(page.items);
        next = page.next;
    }
    Ok(items)
}

fn with_filters(mut endpoint: String, filters: &[(&str, Option<u64>)]) -> String {
    for (name, value) in filters {
        if let Some(value) = value {
            endpoint.push_str(&format!("&{name}={value}"));
        }
    }
    endpoint
}

impl TestRailClient {
    pub fn new(config: &TestRailConfig) -> Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/index.php?{}{}", self.base_url, API_PREFIX, endpoint)
    }

    fn get(&self, endpoint: &str) -> Result<Value> {
        let url = self.url(endpoint);
        debug!("GET {}", url);
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()?;
        json_response(SERVICE, response)
    }

    fn post(&self, endpoint: &str, body: &Value) -> Result<Value> {
        let url = self.url(endpoint);
        debug!("POST {}", url);
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .json(body)
            .send()?;
        json_response(SERVICE, response)
    }

    /// Fetch every page of a list endpoint.
    fn get_list(&self, endpoint: String, items_key: &str) -> Result<Vec<Value>> {
        collect_pages(endpoint, items_key, |endpoint| self.get(endpoint))
    }

    pub fn get_projects(&self) -> Result<Vec<Value>> {
        self.get_list("get_projects".to_string(), "projects")
    }

    pub fn get_suites(&self, project_id: u64) -> Result<Vec<Value>> {
        self.get_list(format!("get_suites/{project_id}"), "suites")
    }

    pub fn get_sections(&self, project_id: u64, suite_id: Option<u64>) -> Result<Vec<Value>> {
        let endpoint = with_filters(
            format!("get_sections/{project_id}"),
            &[("suite_id", suite_id)],
        );
        self.get_list(endpoint, "sections")
    }

    pub fn get_cases(
        &self,
        project_id: u64,
        suite_id: Option<u64>,
        section_id: Option<u64>,
    ) -> Result<Vec<Value>> {
        let endpoint = with_filters(
            format!("get_cases/{project_id}"),
            &[("suite_id", suite_id), ("section_id", section_id)],
        );
        self.get_list(endpoint, "cases")
    }

    pub fn get_case(&self, case_id: u64) -> Result<Value> {
        self.get(&format!("get_case/{case_id}"))
    }

    pub fn add_case(&self, section_id: u64, case: &Value) -> Result<Value> {
        self.post(&format!("add_case/{section_id}"), case)
    }

    pub fn update_case(&self, case_id: u64, case: &Value) -> Result<Value> {
        self.post(&format!("update_case/{case_id}"), case)
    }

    pub fn delete_case(&self, case_id: u64) -> Result<()> {
        self.post(&format!("delete_case/{case_id}"), &Value::Object(Default::default()))?;
        Ok(())
    }

    pub fn add_section(&self, project_id: u64, section: &Value) -> Result<Value> {
        self.post(&format!("add_section/{project_id}"), section)
    }

    pub fn get_case_fields(&self) -> Result<Vec<Value>> {
        self.get_list("get_case_fields".to_string(), "case_fields")
    }

    pub fn get_priorities(&self) -> Result<Vec<Value>> {
        self.get_list("get_priorities".to_string(), "priorities")
    }

    pub fn get_case_types(&self) -> Result<Vec<Value>> {
        self.get_list("get_case_types".to_string(), "case_types")
    }

    /// Number of visible projects; an empty list means the credentials work
    /// but see nothing.
    pub fn test_connection(&self) -> Result<usize> {
        let projects = self.get_projects()?;
        if projects.is_empty() {
            return Err(Error::NotFound(format!(
                "no projects visible at {}",
                self.base_url
            )));
        }
        info!(projects = projects.len(), "Connected to TestRail");
        Ok(projects.len())
    }
}

impl TestCaseStore for TestRailClient {
    fn projects(&self) -> Result<Vec<Value>> {
        self.get_projects()
    }

    fn fetch_cases(&self, project_id: u64, suite_id: Option<u64>) -> Result<Vec<Value>> {
        self.get_cases(project_id, suite_id, None)
    }

    fn sections(&self, project_id: u64, suite_id: Option<u64>) -> Result<Vec<Value>> {
        self.get_sections(project_id, suite_id)
    }

    fn add_case(&self, section_id: u64, case: &Value) -> Result<Value> {
        TestRailClient::add_case(self, section_id, case)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn client() -> TestRailClient {
        TestRailClient::new(&TestRailConfig {
            url: "https://example.testrail.io/".to_string(),
            username: "qa@example.com".to_string(),
            password: "secret".to_string(),
            project_id: 1,
            suite_id: 1,
            target_section_id: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_url_uses_query_style_routing() {
        assert_eq!(
            client().url("get_cases/3&suite_id=4"),
            "https://example.testrail.io/index.php?/api/v2/get_cases/3&suite_id=4"
        );
    }

    #[test]
    fn test_filters_skip_missing_values() {
        assert_eq!(
            with_filters(
                "get_cases/1".to_string(),
                &[("suite_id", Some(2)), ("section_id", None)]
            ),
            "get_cases/1&suite_id=2"
        );
    }

    #[test]
    fn test_page_from_bare_list() {
        let page = Page::parse(json!([{"id": 1}]), "cases");
        assert_eq!(
            page,
            Page {
                items: vec![json!({"id": 1})],
                next: None
            }
        );
    }

    #[test]
    fn test_page_follows_next_link() {
        let page = Page::parse(
            json!({
                "offset": 0,
                "limit": 250,
                "_links": {"next": "/api/v2/get_cases/1&limit=250&offset=250", "prev": null},
                "cases": [{"id": 1}, {"id": 2}]
            }),
            "cases",
        );
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.next.as_deref(), Some("get_cases/1&limit=250&offset=250"));
    }

    #[test]
    fn test_page_with_data_key_and_single_object() {
        let page = Page::parse(json!({"data": [{"id": 9}], "_links": {"next": null}}), "cases");
        assert_eq!(page.items, vec![json!({"id": 9})]);
        assert_eq!(page.next, None);

        let page = Page::parse(json!({"id": 5, "name": "Only"}), "projects");
        assert_eq!(page.items, vec![json!({"id": 5, "name": "Only"})]);
    }

    fn page(ids: &[u64], next: Option<&str>) -> Value {
        let cases: Vec<Value> = ids.iter().map(|id| json!({"id": id})).collect();
        json!({"_links": {"next": next.map(|n| format!("/api/v2/{n}"))}, "cases": cases})
    }

    #[test]
    fn test_empty_page_with_next_link_stops() {
        let page_one = page(&[], Some("get_cases/1&offset=250"));
        assert_eq!(Page::parse(page_one.clone(), "cases").items, Vec::<Value>::new());

        let mut calls = 0;
        let items = collect_pages("get_cases/1".to_string(), "cases", |_| {
            calls += 1;
            Ok(page_one.clone())
        })
        .unwrap();
        assert!(items.is_empty());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_repeated_next_link_stops() {
        let mut calls = 0;
        let items = collect_pages("get_cases/1".to_string(), "cases", |endpoint| {
            calls += 1;
            Ok(match endpoint {
                "get_cases/1" => page(&[1, 2], Some("get_cases/1&offset=2")),
                _ => page(&[3], Some("get_cases/1&offset=2")),
            })
        })
        .unwrap();
        assert_eq!(items, vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})]);
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_page_count_is_capped() {
        let mut calls = 0;
        let items = collect_pages("get_cases/1".to_string(), "cases", |_| {
            calls += 1;
            Ok(page(&[calls], Some(&format!("get_cases/1&offset={calls}"))))
        })
        .unwrap();
        assert_eq!(calls as usize, MAX_PAGES);
        assert_eq!(items.len(), MAX_PAGES);
    }
}
