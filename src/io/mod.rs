//! Flat-file artifacts: the knowledge base, feature documents, summaries and
//! the rendered generation prompt.

pub mod features;
pub mod knowledge_base;
pub mod prompt;
pub mod summary;

pub use features::{read_feature_documents, FEATURE_EXTENSIONS};
pub use knowledge_base::{read_generated_cases, read_knowledge_base, unwrap_case_list};
pub use prompt::{render_prompt, PromptWriter};
pub use summary::{extraction_summary, generation_summary};

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::errors::{Error, Result};

pub fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io_at(e, path))
}

pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, content).map_err(|e| Error::io_at(e, path))
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.as_os_str().is_empty() && !path.exists() {
        fs::create_dir_all(path).map_err(|e| Error::io_at(e, path))?;
    }
    Ok(())
}

/// Serialize `value` as indented JSON, creating parent directories.
pub fn write_json_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    write_file(path, &json)
}
