//! The analysis core: pattern statistics, requirement extraction and schema
//! derivation. Nothing in here touches the network or the file system.

pub mod patterns;
pub mod requirements;
pub mod schema;

pub use patterns::{analyze, PatternSummary, StepDescriptor};
pub use requirements::{
    classify_heading, extract_requirements, FeatureDocument, RequirementCategory,
    RequirementSet, CATEGORIES,
};
pub use schema::{derive_schema, DerivedSchema, SchemaDeriver};
