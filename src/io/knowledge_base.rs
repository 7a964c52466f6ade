//! Reading test-case collections from disk.
//!
//! TestRail answers `get_cases` with a bare list on older servers and with a
//! paginated wrapper on newer ones, and exports made by hand use yet another
//! wrapper, so every reader here goes through [`unwrap_case_list`].

use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;

/// Wrapper keys that hold a case list, in lookup order.
const LIST_KEYS: [&str; 3] = ["cases", "data", "test_cases"];

/// Turn any accepted JSON shape into a list of records.
///
/// A list is returned as is; an object carrying one of the wrapper keys
/// yields that list; any other object is a single record. Scalars yield
/// nothing.
pub fn unwrap_case_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(cases) => cases,
        Value::Object(mut map) => {
            let key = LIST_KEYS
                .into_iter()
                .find(|key| map.get(*key).is_some_and(Value::is_array));
            match key {
                Some(key) => match map.remove(key) {
                    Some(Value::Array(cases)) => cases,
                    _ => Vec::new(),
                },
                None => vec![Value::Object(map)],
            }
        }
        Value::Null => Vec::new(),
        other => {
            warn!("Expected a list of test cases, found {}", kind(&other));
            Vec::new()
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Read the knowledge base. A missing file is an empty knowledge base.
pub fn read_knowledge_base(path: &Path) -> Result<Vec<Value>> {
    if !path.exists() {
        debug!(path = %path.display(), "No knowledge base file");
        return Ok(Vec::new());
    }
    let contents = super::read_file(path)?;
    let value: Value = serde_json::from_str(&contents)?;
    let cases = unwrap_case_list(value);
    debug!(path = %path.display(), cases = cases.len(), "Read knowledge base");
    Ok(cases)
}

/// Read the generator's output file.
///
/// Unlike the knowledge base a missing file is an error here: there is
/// nothing to save.
pub fn read_generated_cases(path: &Path) -> Result<Vec<Value>> {
    let contents = super::read_file(path)?;
    let value: Value = serde_json::from_str(&contents)?;
    Ok(unwrap_case_list(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_unwrap_shapes() {
        assert_eq!(unwrap_case_list(json!([{"id": 1}])), vec![json!({"id": 1})]);
        assert_eq!(
            unwrap_case_list(json!({"offset": 0, "cases": [{"id": 2}]})),
            vec![json!({"id": 2})]
        );
        assert_eq!(
            unwrap_case_list(json!({"data": [{"id": 3}, {"id": 4}]})).len(),
            2
        );
        assert_eq!(
            unwrap_case_list(json!({"test_cases": []})),
            Vec::<Value>::new()
        );
        assert_eq!(
            unwrap_case_list(json!({"title": "single"})),
            vec![json!({"title": "single"})]
        );
        assert!(unwrap_case_list(json!("text")).is_empty());
    }

    #[test]
    fn test_wrapper_key_must_hold_a_list() {
        let record = json!({"data": "not a list", "title": "x"});
        assert_eq!(unwrap_case_list(record.clone()), vec![record]);
    }

    #[test]
    fn test_missing_knowledge_base_is_empty() {
        let dir = TempDir::new().unwrap();
        let cases = read_knowledge_base(&dir.path().join("existing_test_cases.json")).unwrap();
        assert!(cases.is_empty());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("existing_test_cases.json");
        fs::write(&path, "[{").unwrap();
        assert!(read_knowledge_base(&path).is_err());
    }

    #[test]
    fn test_missing_generated_cases_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(read_generated_cases(&dir.path().join("generated_test_cases.json")).is_err());
    }
}
