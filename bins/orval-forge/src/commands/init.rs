//! Init command - write a starter configuration and the client adapters

use anyhow::Result;
use forge_cli::Status;
use forge_core::Error;
use forge_generator::{
    scaffold_config, write_adapters, write_config, GeneratorOptions, DEFAULT_CONFIG_FILE,
};
use forge_http::{available_client_types, ClientType};

/// Run init command
pub fn run(client: &str, output: &str, input: &str, force: bool) -> Result<()> {
    let client_type: ClientType = client
        .parse()
        .map_err(|_| Error::unsupported_client_type(client, &available_client_types()))?;

    if input.trim().is_empty() {
        return Err(Error::validation("Input specification is required")
            .with_suggestion("Pass --input <path|url>")
            .into());
    }

    let cwd = std::env::current_dir()?;
    let adapter_dir = GeneratorOptions::new(&cwd).adapter_root();
    for adapter in write_adapters(&adapter_dir, force)? {
        Status::success(&format!("Adapter written: {}", adapter.display()));
    }

    let config = scaffold_config(client_type, input, output);
    write_config(&cwd.join(DEFAULT_CONFIG_FILE), &config, force)?;

    Status::success(&format!("Configuration file created: {DEFAULT_CONFIG_FILE}"));
    Status::info("Edit the configuration, then run: orval-forge generate");
    Ok(())
}
