//! Assembly of the generation payload.
//!
//! The orchestrator only sequences: it reads through a [`WorkflowSources`]
//! implementation, runs the analysis core over what it got and hands the
//! result to a [`PayloadSink`]. A failing source empties its own slot and
//! the run carries on.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::analysis::{
    analyze, extract_requirements, DerivedSchema, FeatureDocument, PatternSummary,
    RequirementSet, SchemaDeriver,
};
use crate::config::{load_config, GenerationConfig, PathsConfig};
use crate::errors::Result;
use crate::io;

/// Where a run reads its inputs from.
pub trait WorkflowSources {
    fn read_knowledge_base(&self) -> Result<Vec<Value>>;

    fn read_feature_documents(&self) -> Result<Vec<FeatureDocument>>;

    /// `Ok(None)` when no configuration exists at all.
    fn read_configuration(&self) -> Result<Option<GenerationConfig>>;
}

/// Where a finished payload goes.
pub trait PayloadSink {
    fn persist(&mut self, payload: &GenerationPayload) -> Result<()>;
}

/// Everything an external generator needs for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationPayload {
    pub existing_test_cases: Vec<Value>,
    pub patterns: PatternSummary,
    pub features: Vec<FeatureDocument>,
    pub requirements: RequirementSet,
    pub config: GenerationConfig,
    pub schema: DerivedSchema,
}

pub fn build_generation_payload(
    existing_test_cases: Vec<Value>,
    patterns: PatternSummary,
    features: Vec<FeatureDocument>,
    requirements: RequirementSet,
    config: GenerationConfig,
    schema: DerivedSchema,
) -> GenerationPayload {
    GenerationPayload {
        existing_test_cases,
        patterns,
        features,
        requirements,
        config,
        schema,
    }
}

/// The first `size` records that are mappings.
pub fn select_samples(records: &[Value], size: usize) -> Vec<Value> {
    records
        .iter()
        .filter(|record| record.is_object())
        .take(size)
        .cloned()
        .collect()
}

pub struct Orchestrator<S: WorkflowSources> {
    sources: S,
}

impl<S: WorkflowSources> Orchestrator<S> {
    pub fn new(sources: S) -> Self {
        Self { sources }
    }

    pub fn sources(&self) -> &S {
        &self.sources
    }

    fn or_empty<T: Default>(slot: &str, read: Result<T>) -> T {
        read.unwrap_or_else(|e| {
            warn!("Could not read {}: {}. Continuing without it.", slot, e);
            T::default()
        })
    }

    fn configuration(&self) -> GenerationConfig {
        let config = match self.sources.read_configuration() {
            Ok(Some(config)) => config,
            Ok(None) => {
                info!("No generation configuration found, using defaults");
                GenerationConfig::default()
            }
            Err(e) => {
                warn!("Could not read configuration: {}. Using defaults.", e);
                GenerationConfig::default()
            }
        };
        config.resolve()
    }

    /// Read, analyze and assemble.
    pub fn build(&self) -> GenerationPayload {
        let existing = Self::or_empty("knowledge base", self.sources.read_knowledge_base());
        let patterns = analyze(&existing);

        let features = Self::or_empty("feature documents", self.sources.read_feature_documents());
        let requirements = extract_requirements(&features);

        let config = self.configuration();

        let samples = select_samples(&existing, config.sample_size);
        let schema = SchemaDeriver::new()
            .with_exclusions(config.schema_exclude_fields.iter().cloned())
            .derive(&samples, &patterns.field_variations, existing.len(), &existing);

        info!(
            existing = existing.len(),
            features = features.len(),
            requirements = requirements.len(),
            schema_fields = schema.len(),
            "Assembled generation payload"
        );

        build_generation_payload(existing, patterns, features, requirements, config, schema)
    }

    /// Build the payload and hand it to `sink`.
    pub fn run<P: PayloadSink>(&self, sink: &mut P) -> Result<GenerationPayload> {
        let payload = self.build();
        sink.persist(&payload)?;
        Ok(payload)
    }
}

/// Inputs read from the flat-file layout.
#[derive(Debug, Clone, Default)]
pub struct FileSources {
    pub paths: PathsConfig,
    pub config_file: Option<PathBuf>,
}

impl FileSources {
    pub fn new(paths: PathsConfig, config_file: Option<PathBuf>) -> Self {
        Self { paths, config_file }
    }
}

impl WorkflowSources for FileSources {
    fn read_knowledge_base(&self) -> Result<Vec<Value>> {
        io::read_knowledge_base(&self.paths.knowledge_base)
    }

    fn read_feature_documents(&self) -> Result<Vec<FeatureDocument>> {
        io::read_feature_documents(&self.paths.features)
    }

    fn read_configuration(&self) -> Result<Option<GenerationConfig>> {
        Ok(load_config(self.config_file.as_deref()).and_then(|config| config.generation))
    }
}

/// Writes `prompt_data.json` and `generation_prompt.md` under the target dir.
#[derive(Debug, Clone)]
pub struct FileSink {
    paths: PathsConfig,
}

impl FileSink {
    pub fn new(paths: PathsConfig) -> Self {
        Self { paths }
    }
}

impl PayloadSink for FileSink {
    fn persist(&mut self, payload: &GenerationPayload) -> Result<()> {
        io::ensure_dir(&self.paths.target)?;
        io::write_json_pretty(&self.paths.prompt_data(), payload)?;
        io::write_file(&self.paths.prompt_markdown(), &io::render_prompt(payload)?)?;
        info!(
            data = %self.paths.prompt_data().display(),
            prompt = %self.paths.prompt_markdown().display(),
            "Wrote generation payload"
        );
        Ok(())
    }
}
