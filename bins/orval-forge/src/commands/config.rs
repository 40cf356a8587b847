//! Config command - print the loaded configuration

use crate::OutputFormat;
use anyhow::Result;
use forge_cli::Status;
use forge_generator::LoadedConfig;
use std::path::Path;

/// Run config command
pub fn run(config: Option<&Path>, format: OutputFormat) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let loaded = LoadedConfig::load(config, &cwd)?;
    let json = serde_json::to_string_pretty(&loaded.config)?;

    if format == OutputFormat::Text {
        Status::header("Current configuration");
        Status::detail("File", &loaded.path.display().to_string());
        println!();
    }
    println!("{json}");
    Ok(())
}
