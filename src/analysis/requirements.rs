//! Requirement extraction from feature documents.
//!
//! Feature documents are free-form Markdown (hand written, or a Jira ticket
//! description saved by `fetch-ticket`). Requirements are recovered with two
//! heuristics: the heading of a section decides its category, and every list
//! item inside a categorized section is one requirement.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A feature description as read from disk.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureDocument {
    pub filename: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub path: String,
}

impl FeatureDocument {
    pub fn new(
        filename: impl Into<String>,
        content: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequirementCategory {
    Functional,
    Security,
    Accessibility,
    Technical,
    Performance,
    ApiEndpoints,
    Database,
    BrowserSupport,
}

impl RequirementCategory {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Functional => "Functional",
            Self::Security => "Security",
            Self::Accessibility => "Accessibility",
            Self::Technical => "Technical",
            Self::Performance => "Performance",
            Self::ApiEndpoints => "API Endpoints",
            Self::Database => "Database",
            Self::BrowserSupport => "Browser Support",
        }
    }
}

/// Requirements grouped by category, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RequirementSet {
    pub functional: Vec<String>,
    pub security: Vec<String>,
    pub accessibility: Vec<String>,
    pub technical: Vec<String>,
    pub performance: Vec<String>,
    pub api_endpoints: Vec<String>,
    pub database: Vec<String>,
    pub browser_support: Vec<String>,
}

impl RequirementSet {
    pub fn bucket(&self, category: RequirementCategory) -> &[String] {
        match category {
            RequirementCategory::Functional => &self.functional,
            RequirementCategory::Security => &self.security,
            RequirementCategory::Accessibility => &self.accessibility,
            RequirementCategory::Technical => &self.technical,
            RequirementCategory::Performance => &self.performance,
            RequirementCategory::ApiEndpoints => &self.api_endpoints,
            RequirementCategory::Database => &self.database,
            RequirementCategory::BrowserSupport => &self.browser_support,
        }
    }

    fn bucket_mut(&mut self, category: RequirementCategory) -> &mut Vec<String> {
        match category {
            RequirementCategory::Functional => &mut self.functional,
            RequirementCategory::Security => &mut self.security,
            RequirementCategory::Accessibility => &mut self.accessibility,
            RequirementCategory::Technical => &mut self.technical,
            RequirementCategory::Performance => &mut self.performance,
            RequirementCategory::ApiEndpoints => &mut self.api_endpoints,
            RequirementCategory::Database => &mut self.database,
            RequirementCategory::BrowserSupport => &mut self.browser_support,
        }
    }

    pub fn len(&self) -> usize {
        CATEGORIES.iter().map(|c| self.bucket(*c).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Every category, in serialization order.
pub const CATEGORIES: [RequirementCategory; 8] = [
    RequirementCategory::Functional,
    RequirementCategory::Security,
    RequirementCategory::Accessibility,
    RequirementCategory::Technical,
    RequirementCategory::Performance,
    RequirementCategory::ApiEndpoints,
    RequirementCategory::Database,
    RequirementCategory::BrowserSupport,
];

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s{0,3}(#{1,6})\s+(.*?)\s*#*\s*$").expect("valid heading regex"));

static BULLET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s+(?:\[[ xX]\]\s+)?(.*)$").expect("valid bullet regex")
});

static API_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:apis?|endpoints?)\b").expect("valid api regex"));

static TABLE_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\btables?\b").expect("valid table regex"));

/// Category of a section heading; first matching rule wins.
pub fn classify_heading(heading: &str) -> Option<RequirementCategory> {
    let text = heading.to_lowercase();
    let has = |needle: &str| text.contains(needle);

    if has("non-functional") || has("nonfunctional") || has("non functional") {
        Some(RequirementCategory::Technical)
    } else if has("security") {
        Some(RequirementCategory::Security)
    } else if has("accessibility") || has("a11y") || has("wcag") {
        Some(RequirementCategory::Accessibility)
    } else if has("performance") {
        Some(RequirementCategory::Performance)
    } else if API_WORD.is_match(&text) {
        Some(RequirementCategory::ApiEndpoints)
    } else if has("database") || has("data model") || TABLE_WORD.is_match(&text) {
        Some(RequirementCategory::Database)
    } else if has("browser") {
        Some(RequirementCategory::BrowserSupport)
    } else if has("functional") {
        Some(RequirementCategory::Functional)
    } else if has("technical") || has("requirement") || has("constraint") {
        Some(RequirementCategory::Technical)
    } else {
        None
    }
}

/// `* * *`, `- - -` and `___` style horizontal rules.
fn is_thematic_break(line: &str) -> bool {
    let marks: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
    marks.len() >= 3 && ['-', '*', '_'].iter().any(|mark| marks.iter().all(|c| c == mark))
}

/// Strip list markup from a line; `None` when the line is not a list item.
fn bullet_text(line: &str) -> Option<&str> {
    if is_thematic_break(line) {
        return None;
    }
    BULLET
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|text| text.as_str().trim())
}

/// Requirements of a single document, appended to `into`.
fn extract_document(document: &FeatureDocument, into: &mut RequirementSet) {
    // (heading level, category) of the innermost classified section
    let mut current: Option<(usize, RequirementCategory)> = None;
    let mut in_fence = false;

    for line in document.content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }

        if let Some(caps) = HEADING.captures(line) {
            let level = caps[1].len();
            let title = &caps[2];
            current = match (classify_heading(title), current) {
                (Some(category), _) => Some((level, category)),
                (None, Some((parent_level, category))) if level > parent_level => {
                    Some((parent_level, category))
                }
                (None, _) => None,
            };
            continue;
        }

        let Some((_, category)) = current else {
            continue;
        };
        if let Some(text) = bullet_text(line).filter(|text| !text.is_empty()) {
            into.bucket_mut(category).push(text.to_string());
        }
    }
}

/// Categorize the requirements of every document.
pub fn extract_requirements(documents: &[FeatureDocument]) -> RequirementSet {
    let mut requirements = RequirementSet::default();
    for document in documents {
        let before = requirements.len();
        extract_document(document, &mut requirements);
        debug!(
            file = %document.filename,
            found = requirements.len() - before,
            "Extracted feature requirements"
        );
    }
    requirements
}
