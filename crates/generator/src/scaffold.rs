//! Starter configuration for `orval-forge init`

use crate::config::{
    ForgeConfig, GenerationOptions, GeneratorEntry, GeneratorOutput, OutputOptions,
};
use forge_core::error::{Error, Result};
use forge_http::{ClientType, HttpClientConfig};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Name of the single generator entry in a scaffolded config
pub const DEFAULT_ENTRY: &str = "api";

/// Build a starter configuration with one `api` entry
pub fn scaffold_config(client_type: ClientType, input: &str, output_dir: &str) -> ForgeConfig {
    let entry = GeneratorEntry {
        input: Some(Value::String(input.to_string())),
        output: Some(GeneratorOutput {
            target: Some(format!("{}/api.ts", output_dir.trim_end_matches('/'))),
            mode: Some("single".to_string()),
            client: Some("axios".to_string()),
            ..GeneratorOutput::default()
        }),
        extra: Map::new(),
    };

    ForgeConfig {
        orval: Some(BTreeMap::from([(DEFAULT_ENTRY.to_string(), entry)])),
        http_client: Some(HttpClientConfig::recommended(client_type)),
        output: Some(OutputOptions::default()),
        generation: Some(GenerationOptions::default()),
    }
}

/// Write `config` as pretty JSON, refusing to replace an existing file unless `force`
pub fn write_config(path: &Path, config: &ForgeConfig, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::file_exists(path));
    }

    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, format!("{json}\n")).map_err(|e| {
        Error::io(format!("Failed to write {}: {e}", path.display())).with_source(e)
    })?;

    info!(path = %path.display(), "Wrote configuration");
    Ok(())
}
