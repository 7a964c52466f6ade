//! Configuration: generation settings from `.caseforge.toml`, remote service
//! credentials from the environment.

mod core;
mod generation;
mod loader;
pub mod services;

pub use self::core::{CaseforgeConfig, PathsConfig, CONFIG_FILE_NAME, DEFAULT_CONFIG_TOML};
pub use generation::{
    default_priority_distribution, default_sample_size, default_schema_exclude_fields,
    default_similarity_threshold, default_test_case_count, default_test_types, GenerationConfig,
    TestType,
};
pub use loader::{directory_ancestors, find_config, load_config, parse_and_validate_config};
pub use services::{JiraConfig, TestRailConfig};
