//! Feature document discovery.

use std::path::{Path, PathBuf};

use glob::Pattern;
use serde_json::Value;
use tracing::{debug, warn};

use crate::analysis::FeatureDocument;
use crate::errors::Result;

/// Extensions read verbatim as feature text.
pub const FEATURE_EXTENSIONS: [&str; 3] = ["md", "txt", "feature"];

/// Read every feature document directly inside `dir`, sorted by file name.
///
/// Ticket details saved by `fetch-ticket` (`*.json`) contribute their
/// summary as a heading followed by the description. A missing directory
/// yields no documents; unreadable files are skipped with a warning.
pub fn read_feature_documents(dir: &Path) -> Result<Vec<FeatureDocument>> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "No feature directory");
        return Ok(Vec::new());
    }

    let pattern = format!("{}/*", Pattern::escape(&dir.to_string_lossy()));
    let mut paths: Vec<PathBuf> = glob::glob(&pattern)?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Skipping unreadable feature entry: {}", e);
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();
    paths.sort_by_key(|path| path.file_name().map(|name| name.to_os_string()));

    let documents: Vec<FeatureDocument> = paths
        .iter()
        .filter_map(|path| match read_document(path) {
            Ok(document) => document,
            Err(e) => {
                warn!("Skipping feature file {}: {}", path.display(), e);
                None
            }
        })
        .collect();

    debug!(dir = %dir.display(), documents = documents.len(), "Read feature documents");
    Ok(documents)
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

fn read_document(path: &Path) -> Result<Option<FeatureDocument>> {
    let content = match extension(path).as_deref() {
        Some(ext) if FEATURE_EXTENSIONS.contains(&ext) => super::read_file(path)?,
        Some("json") => match ticket_text(&serde_json::from_str(&super::read_file(path)?)?) {
            Some(text) => text,
            None => return Ok(None),
        },
        _ => return Ok(None),
    };

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Some(FeatureDocument::new(
        filename,
        content,
        path.to_string_lossy(),
    )))
}

/// Feature text of a saved ticket, `None` for JSON that is not a ticket.
fn ticket_text(ticket: &Value) -> Option<String> {
    let summary = ticket.get("summary").and_then(Value::as_str);
    let description = ticket.get("description").and_then(Value::as_str);
    match (summary, description) {
        (None, None) => None,
        (Some(summary), None) => Some(format!("# {summary}\n")),
        (None, Some(description)) => Some(description.to_string()),
        (Some(summary), Some(description)) => Some(format!("# {summary}\n\n{description}")),
    }
}
