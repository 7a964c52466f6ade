use std::path::Path;

use anyhow::{Context, Result};

use crate::config::{PathsConfig, CONFIG_FILE_NAME, DEFAULT_CONFIG_TOML};
use crate::formatting::Console;
use crate::io;

/// Write the default `.caseforge.toml` and create the artifact directories
/// under `root`.
pub fn init_config(root: &Path, force: bool, console: &Console) -> Result<()> {
    let config_path = root.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    io::write_file(&config_path, DEFAULT_CONFIG_TOML)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("{}", console.success(&format!("Created {CONFIG_FILE_NAME} configuration file")));

    let paths = PathsConfig::default();
    let knowledge_dir = paths
        .knowledge_base
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    for dir in [knowledge_dir, paths.features, paths.target] {
        io::ensure_dir(&root.join(&dir))
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    Ok(())
}
