use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Kinds of test case a generation run can ask for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    Positive,
    Negative,
    Edge,
    Accessibility,
}

impl TestType {
    pub const ALL: [TestType; 4] = [
        TestType::Positive,
        TestType::Negative,
        TestType::Edge,
        TestType::Accessibility,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Edge => "edge",
            Self::Accessibility => "accessibility",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn default_test_case_count() -> u32 {
    20
}

pub fn default_test_types() -> Vec<TestType> {
    vec![TestType::Positive, TestType::Negative, TestType::Edge]
}

pub fn default_priority_distribution() -> BTreeMap<String, u32> {
    BTreeMap::from([
        ("High".to_string(), 40),
        ("Medium".to_string(), 40),
        ("Low".to_string(), 20),
    ])
}

pub fn default_similarity_threshold() -> f64 {
    0.85
}

pub fn default_sample_size() -> usize {
    3
}

pub fn default_schema_exclude_fields() -> Vec<String> {
    ["id", "created_by", "created_on", "updated_by", "updated_on"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Settings for one generation run.
///
/// Read from the `[generation]` table of `.caseforge.toml`; every key is
/// optional and falls back to the built-in default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_test_case_count")]
    pub test_case_count: u32,

    #[serde(default = "default_test_types", deserialize_with = "lenient_test_types")]
    pub test_types: Vec<TestType>,

    /// Priority name to percentage, summing to 100
    #[serde(default = "default_priority_distribution")]
    pub priority_distribution: BTreeMap<String, u32>,

    /// Accessibility guideline, only meaningful with `accessibility` requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wcag_guideline: Option<String>,

    /// Similarity above which a generated case counts as a duplicate
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Number of existing cases used as schema samples
    #[serde(default = "default_sample_size", skip_serializing)]
    pub sample_size: usize,

    /// Server-managed fields left out of the derived schema
    #[serde(default = "default_schema_exclude_fields", skip_serializing)]
    pub schema_exclude_fields: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TestTypeNames {
    List(Vec<String>),
    Csv(String),
}

/// Accept a list or a comma-separated string, dropping unknown names.
fn lenient_test_types<'de, D>(deserializer: D) -> Result<Vec<TestType>, D::Error>
where
    D: Deserializer<'de>,
{
    let names = match TestTypeNames::deserialize(deserializer)? {
        TestTypeNames::List(names) => names,
        TestTypeNames::Csv(joined) => joined.split(',').map(str::to_string).collect(),
    };
    Ok(names
        .iter()
        .filter(|name| !name.trim().is_empty())
        .filter_map(|name| {
            let parsed = TestType::parse(name);
            if parsed.is_none() {
                log::warn!("Ignoring unknown test type '{}'", name.trim());
            }
            parsed
        })
        .collect())
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            test_case_count: default_test_case_count(),
            test_types: default_test_types(),
            priority_distribution: default_priority_distribution(),
            wcag_guideline: None,
            similarity_threshold: default_similarity_threshold(),
            sample_size: default_sample_size(),
            schema_exclude_fields: default_schema_exclude_fields(),
        }
    }
}

impl GenerationConfig {
    pub fn wants(&self, test_type: TestType) -> bool {
        self.test_types.contains(&test_type)
    }

    // Pure function: Validate distribution percentages sum to 100
    pub fn validate_distribution_sum(distribution: &BTreeMap<String, u32>) -> Result<(), String> {
        let sum = distribution
            .values()
            .try_fold(0u32, |total, share| total.checked_add(*share));
        let Some(sum) = sum else {
            return Err("Priority distribution overflows; it must sum to 100".to_string());
        };
        if sum != 100 {
            Err(format!(
                "Priority distribution must sum to 100, but sums to {}",
                sum
            ))
        } else {
            Ok(())
        }
    }

    /// Validate the settings without changing them
    pub fn validate(&self) -> Result<(), String> {
        if self.test_case_count == 0 {
            return Err("test_case_count must be positive".to_string());
        }
        if self.test_types.is_empty() {
            return Err("at least one test type is required".to_string());
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(format!(
                "similarity_threshold must be between 0.0 and 1.0, got {}",
                self.similarity_threshold
            ));
        }
        Self::validate_distribution_sum(&self.priority_distribution)
    }

    /// Replace every invalid setting with its default, warning about each.
    pub fn sanitized(mut self) -> Self {
        if self.test_case_count == 0 {
            log::warn!("test_case_count must be positive. Using default.");
            self.test_case_count = default_test_case_count();
        }
        if self.test_types.is_empty() {
            log::warn!("No known test types configured. Using defaults.");
            self.test_types = default_test_types();
        }
        if let Err(e) = Self::validate_distribution_sum(&self.priority_distribution) {
            log::warn!("{}. Using default distribution.", e);
            self.priority_distribution = default_priority_distribution();
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            log::warn!(
                "similarity_threshold {} out of range. Using default.",
                self.similarity_threshold
            );
            self.similarity_threshold = default_similarity_threshold();
        }
        if self.sample_size == 0 {
            self.sample_size = default_sample_size();
        }
        self
    }

    /// Effective settings for a run.
    ///
    /// Duplicated test types are collapsed and the guideline is dropped unless
    /// accessibility cases were requested.
    pub fn resolve(mut self) -> Self {
        let mut seen = Vec::with_capacity(self.test_types.len());
        self.test_types.retain(|t| {
            let fresh = !seen.contains(t);
            seen.push(*t);
            fresh
        });
        if !self.wants(TestType::Accessibility) {
            self.wcag_guideline = None;
        }
        self.wcag_guideline = self
            .wcag_guideline
            .take()
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty());
        self
    }
}
