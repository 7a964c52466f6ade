use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::{load_config, PathsConfig};
use crate::formatting::Console;
use crate::orchestrator::{FileSink, FileSources, GenerationPayload, Orchestrator};

/// Command-line overrides for the `[paths]` table.
#[derive(Debug, Default)]
pub struct PromptConfig {
    pub knowledge_base: Option<PathBuf>,
    pub features: Option<PathBuf>,
    pub target: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

impl PromptConfig {
    /// Paths from the config file, with command-line values taking precedence.
    pub fn resolve_paths(&self, from_file: PathsConfig) -> PathsConfig {
        PathsConfig {
            knowledge_base: self
                .knowledge_base
                .clone()
                .unwrap_or(from_file.knowledge_base),
            features: self.features.clone().unwrap_or(from_file.features),
            target: self.target.clone().unwrap_or(from_file.target),
        }
    }
}

/// Assemble the generation payload and write the prompt artifacts.
pub fn generate_prompt(config: PromptConfig, console: &Console) -> Result<GenerationPayload> {
    let file_paths = load_config(config.config.as_deref())
        .map(|loaded| loaded.paths())
        .unwrap_or_default();
    let paths = config.resolve_paths(file_paths);

    println!("{}", console.header("Generation Prompt"));
    println!("Knowledge base: {}", paths.knowledge_base.display());
    println!("Features: {}", paths.features.display());

    let orchestrator = Orchestrator::new(FileSources::new(paths.clone(), config.config.clone()));
    let payload = orchestrator
        .run(&mut FileSink::new(paths.clone()))
        .with_context(|| format!("Failed to write prompt files to {}", paths.target.display()))?;

    println!(
        "{}",
        console.info(&format!(
            "{} existing test cases, {} feature documents, {} requirements",
            payload.existing_test_cases.len(),
            payload.features.len(),
            payload.requirements.len()
        ))
    );
    println!(
        "{}",
        console.info(&format!("Schema fields: {}", payload.schema.len()))
    );
    println!(
        "{}",
        console.success(&format!("Prompt data saved to: {}", paths.prompt_data().display()))
    );
    println!(
        "{}",
        console.success(&format!("Prompt saved to: {}", paths.prompt_markdown().display()))
    );
    println!(
        "Save the generator's output as {} and run `caseforge save`.",
        paths.generated_cases().display()
    );
    Ok(payload)
}
