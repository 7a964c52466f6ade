// Export modules for library usage
pub mod analysis;
pub mod cli;
pub mod clients;
pub mod commands;
pub mod config;
pub mod errors;
pub mod formatting;
pub mod io;
pub mod logging;
pub mod orchestrator;
pub mod record;

// Re-export commonly used types
pub use crate::analysis::{
    analyze, derive_schema, extract_requirements, DerivedSchema, FeatureDocument,
    PatternSummary, RequirementSet, SchemaDeriver,
};

pub use crate::config::{GenerationConfig, TestType};

pub use crate::errors::{Error, Result};

pub use crate::orchestrator::{
    build_generation_payload, GenerationPayload, Orchestrator, PayloadSink, WorkflowSources,
};

pub use crate::record::{Record, Step, StepFormat};
