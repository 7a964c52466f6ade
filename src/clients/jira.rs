//! Jira Cloud REST API v3 client (basic auth with an API token).

use std::fs::File;
use std::path::Path;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{json_response, REQUEST_TIMEOUT};
use crate::config::JiraConfig;
use crate::errors::{Error, Result};

const SERVICE: &str = "Jira";

/// Attachment metadata as stored in `ticket_details_<ID>.json`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub size: u64,
    pub mime_type: String,
    pub created: String,
    pub author: String,
    pub url: String,
    pub thumbnail: String,
}

impl Attachment {
    fn from_issue_field(attachment: &Value) -> Self {
        let text = |field: &str| {
            attachment
                .get(field)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            filename: text("filename"),
            size: attachment.get("size").and_then(Value::as_u64).unwrap_or(0),
            mime_type: text("mimeType"),
            created: text("created"),
            author: attachment
                .pointer("/author/displayName")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            url: text("content"),
            thumbnail: text("thumbnail"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TicketDetails {
    pub ticket_id: String,
    pub key: String,
    pub summary: String,
    pub description: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl TicketDetails {
    /// Build from a `GET /issue/{key}` response.
    pub fn from_issue(ticket_id: &str, issue: &Value) -> Self {
        let fields = issue.get("fields");
        let description = fields
            .and_then(|fields| fields.get("description"))
            .map(description_text)
            .unwrap_or_default();
        let attachments = fields
            .and_then(|fields| fields.get("attachment"))
            .and_then(Value::as_array)
            .map(|list| list.iter().map(Attachment::from_issue_field).collect())
            .unwrap_or_default();

        Self {
            ticket_id: ticket_id.to_string(),
            key: issue
                .get("key")
                .and_then(Value::as_str)
                .unwrap_or(ticket_id)
                .to_string(),
            summary: fields
                .and_then(|fields| fields.get("summary"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            description,
            attachments,
        }
    }

    /// File name used when saving under the feature directory.
    pub fn file_name(&self) -> String {
        format!("ticket_details_{}.json", self.ticket_id)
    }
}

/// Markdown-flavoured text of an Atlassian Document Format node.
///
/// Each block becomes one line. Headings keep their level as `#` marks and
/// list items become `- ` or `1. ` lines, indented per nesting depth, so
/// the result reads like a feature document.
pub fn flatten_adf(node: &Value) -> String {
    let mut lines = Vec::new();
    render_block(node, 0, &mut lines);
    lines.join("\n")
}

fn node_type(node: &Value) -> &str {
    node.get("type").and_then(Value::as_str).unwrap_or_default()
}

fn children(node: &Value) -> &[Value] {
    node.get("content")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Concatenated text of the inline nodes under `node`.
fn inline_text(node: &Value, out: &mut String) {
    match node_type(node) {
        "text" => {
            if let Some(text) = node.get("text").and_then(Value::as_str) {
                out.push_str(text);
            }
        }
        "hardBreak" => out.push(' '),
        "mention" | "emoji" => {
            if let Some(text) = node.pointer("/attrs/text").and_then(Value::as_str) {
                out.push_str(text);
            }
        }
        _ => children(node).iter().for_each(|child| inline_text(child, out)),
    }
}

fn block_text(node: &Value) -> String {
    let mut text = String::new();
    inline_text(node, &mut text);
    text.trim().to_string()
}

fn render_block(node: &Value, depth: usize, lines: &mut Vec<String>) {
    match node {
        Value::Array(items) => items.iter().for_each(|item| render_block(item, depth, lines)),
        Value::Object(_) => match node_type(node) {
            "heading" => {
                let level = node
                    .pointer("/attrs/level")
                    .and_then(Value::as_u64)
                    .map_or(2, |level| level.clamp(1, 6) as usize);
                let text = block_text(node);
                if !text.is_empty() {
                    lines.push(format!("{} {}", "#".repeat(level), text));
                }
            }
            list @ ("bulletList" | "orderedList") => {
                for (index, item) in children(node).iter().enumerate() {
                    let marker = if list == "orderedList" {
                        format!("{}.", index + 1)
                    } else {
                        "-".to_string()
                    };
                    render_list_item(item, depth, &marker, lines);
                }
            }
            "rule" => {}
            "paragraph" | "codeBlock" | "text" => {
                let text = block_text(node);
                if !text.is_empty() {
                    lines.push(text);
                }
            }
            _ => children(node)
                .iter()
                .for_each(|child| render_block(child, depth, lines)),
        },
        _ => {}
    }
}

fn render_list_item(item: &Value, depth: usize, marker: &str, lines: &mut Vec<String>) {
    let (nested, blocks): (Vec<&Value>, Vec<&Value>) = children(item)
        .iter()
        .partition(|child| matches!(node_type(child), "bulletList" | "orderedList"));

    let text = blocks
        .into_iter()
        .map(block_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if !text.is_empty() {
        lines.push(format!("{}{} {}", "  ".repeat(depth), marker, text));
    }
    for list in nested {
        render_block(list, depth + 1, lines);
    }
}

/// Description field as text, whether plain or ADF.
fn description_text(description: &Value) -> String {
    match description {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => flatten_adf(other),
    }
}

#[derive(Debug, Clone)]
pub struct JiraClient {
    http: Client,
    base_url: String,
    username: String,
    api_token: String,
}

impl JiraClient {
    pub fn new(config: &JiraConfig) -> Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            api_token: config.api_token.clone(),
        })
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response> {
        debug!("GET {}", url);
        Ok(self
            .http
            .get(url)
            .basic_auth(&self.username, Some(&self.api_token))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()?)
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/rest/api/3/{}", self.base_url, path)
    }

    /// The raw issue, `None` when Jira answers 404.
    pub fn get_issue(&self, issue_key: &str) -> Result<Option<Value>> {
        let response = self.get(&self.api_url(&format!("issue/{issue_key}")))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        json_response(SERVICE, response).map(Some)
    }

    pub fn get_issue_description(&self, issue_key: &str) -> Result<String> {
        let url = self.api_url(&format!("issue/{issue_key}?fields=description"));
        let issue = json_response(SERVICE, self.get(&url)?)?;
        Ok(issue
            .pointer("/fields/description")
            .map(description_text)
            .unwrap_or_default())
    }

    /// Ticket details, `None` when the issue does not exist.
    pub fn ticket_details(&self, issue_key: &str) -> Result<Option<TicketDetails>> {
        Ok(self
            .get_issue(issue_key)?
            .map(|issue| TicketDetails::from_issue(issue_key, &issue)))
    }

    /// `serverTitle` from `/serverInfo`; doubles as a connection check.
    pub fn server_title(&self) -> Result<String> {
        let info = json_response(SERVICE, self.get(&self.api_url("serverInfo"))?)?;
        Ok(info
            .get("serverTitle")
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_string())
    }

    /// Stream `url` into `dest`, returning the number of bytes written.
    pub fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        let mut response = self
            .http
            .get(url)
            .basic_auth(&self.username, Some(&self.api_token))
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api {
                service: SERVICE,
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }
        let mut file = File::create(dest).map_err(|e| Error::io_at(e, dest))?;
        let written = response.copy_to(&mut file)?;
        debug!(bytes = written, path = %dest.display(), "Downloaded attachment");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{extract_requirements, FeatureDocument};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_flatten_adf_keeps_document_structure() {
        let adf = json!({
            "type": "doc",
            "version": 1,
            "content": [
                {"type": "paragraph", "content": [
                    {"type": "text", "text": "Lock "},
                    {"type": "text", "text": "accounts", "marks": [{"type": "strong"}]},
                    {"type": "hardBreak"},
                    {"type": "text", "text": "on abuse"}
                ]},
                {"type": "heading", "attrs": {"level": 2}, "content": [{"type": "text", "text": "Security"}]},
                {"type": "bulletList", "content": [
                    {"type": "listItem", "content": [
                        {"type": "paragraph", "content": [{"type": "text", "text": "Lock after 5 attempts"}]},
                        {"type": "orderedList", "content": [
                            {"type": "listItem", "content": [
                                {"type": "paragraph", "content": [{"type": "text", "text": "Notify the owner"}]}
                            ]}
                        ]}
                    ]}
                ]},
                {"type": "rule"}
            ]
        });
        assert_eq!(
            flatten_adf(&adf),
            "Lock accounts on abuse\n## Security\n- Lock after 5 attempts\n  1. Notify the owner"
        );
    }

    #[test]
    fn test_flattened_ticket_feeds_requirement_extraction() {
        let adf = json!({"type": "doc", "content": [
            {"type": "heading", "attrs": {"level": 3}, "content": [{"type": "text", "text": "Performance"}]},
            {"type": "bulletList", "content": [
                {"type": "listItem", "content": [
                    {"type": "paragraph", "content": [{"type": "text", "text": "Search answers within 1 second"}]}
                ]}
            ]}
        ]});
        let document = FeatureDocument::new(
            "ticket_details_SHOP-1.json",
            format!("# Search\n\n{}", description_text(&adf)),
            "feature/ticket_details_SHOP-1.json",
        );
        let requirements = extract_requirements(&[document]);
        assert_eq!(requirements.performance, vec!["Search answers within 1 second"]);
    }

    #[test]
    fn test_description_text_variants() {
        assert_eq!(description_text(&json!("plain")), "plain");
        assert_eq!(description_text(&Value::Null), "");
        assert_eq!(description_text(&json!({"type": "doc", "content": []})), "");
    }

    #[test]
    fn test_ticket_details_from_issue() {
        let issue = json!({
            "key": "SHOP-12",
            "fields": {
                "summary": "Checkout with saved card",
                "description": {"type": "doc", "content": [
                    {"type": "paragraph", "content": [{"type": "text", "text": "Pay fast"}]}
                ]},
                "attachment": [{
                    "filename": "flow.png",
                    "size": 2048,
                    "mimeType": "image/png",
                    "created": "2024-05-01T10:00:00.000+0000",
                    "author": {"displayName": "Dana"},
                    "content": "https://example.atlassian.net/secure/attachment/1/flow.png"
                }]
            }
        });
        let details = TicketDetails::from_issue("SHOP-12", &issue);
        assert_eq!(details.summary, "Checkout with saved card");
        assert_eq!(details.description, "Pay fast");
        assert_eq!(details.attachments.len(), 1);
        assert_eq!(details.attachments[0].author, "Dana");
        assert_eq!(details.attachments[0].mime_type, "image/png");
        assert_eq!(details.attachments[0].thumbnail, "");
        assert_eq!(details.file_name(), "ticket_details_SHOP-12.json");
    }

    #[test]
    fn test_ticket_details_tolerates_missing_fields() {
        let details = TicketDetails::from_issue("X-1", &json!({}));
        assert_eq!(details.key, "X-1");
        assert!(details.summary.is_empty());
        assert!(details.attachments.is_empty());
    }
}
