use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::generation::GenerationConfig;

pub const CONFIG_FILE_NAME: &str = ".caseforge.toml";

/// Root configuration structure for caseforge
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CaseforgeConfig {
    /// Generation settings
    #[serde(default)]
    pub generation: Option<GenerationConfig>,

    /// Locations of the flat-file artifacts
    #[serde(default)]
    pub paths: Option<PathsConfig>,
}

impl CaseforgeConfig {
    pub fn paths(&self) -> PathsConfig {
        self.paths.clone().unwrap_or_default()
    }
}

pub fn default_knowledge_base() -> PathBuf {
    PathBuf::from("knowledgebase/existing_test_cases.json")
}

pub fn default_feature_dir() -> PathBuf {
    PathBuf::from("feature")
}

pub fn default_target_dir() -> PathBuf {
    PathBuf::from("target")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathsConfig {
    #[serde(default = "default_knowledge_base")]
    pub knowledge_base: PathBuf,

    #[serde(default = "default_feature_dir")]
    pub features: PathBuf,

    #[serde(default = "default_target_dir")]
    pub target: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            knowledge_base: default_knowledge_base(),
            features: default_feature_dir(),
            target: default_target_dir(),
        }
    }
}

impl PathsConfig {
    pub fn extraction_summary(&self) -> PathBuf {
        self.knowledge_base
            .parent()
            .map(|dir| dir.join("extraction_summary.txt"))
            .unwrap_or_else(|| PathBuf::from("extraction_summary.txt"))
    }

    pub fn prompt_data(&self) -> PathBuf {
        self.target.join("prompt_data.json")
    }

    pub fn prompt_markdown(&self) -> PathBuf {
        self.target.join("generation_prompt.md")
    }

    pub fn generated_cases(&self) -> PathBuf {
        self.target.join("generated_test_cases.json")
    }
}

/// Contents written by `caseforge init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# caseforge configuration

[generation]
test_case_count = 20
# Options: positive, negative, edge, accessibility
test_types = ["positive", "negative", "edge"]
similarity_threshold = 0.85
sample_size = 3
schema_exclude_fields = ["id", "created_by", "created_on", "updated_by", "updated_on"]
# Only used when "accessibility" is listed in test_types
# wcag_guideline = "WCAG 2.2 AA"

[generation.priority_distribution]
High = 40
Medium = 40
Low = 20

[paths]
knowledge_base = "knowledgebase/existing_test_cases.json"
features = "feature"
target = "target"
"#;
