//! TypeScript adapter hooks that generated code imports for dispatch
//!
//! The sources ship inside the binary; `orval-forge init` writes them into the
//! adapter directory the orchestrator points every injected entry at.

use forge_core::error::{Error, Result};
use forge_http::ClientType;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const RICH_ADAPTER: &str = include_str!("../adapters/rich-client.ts");
const MINIMAL_ADAPTER: &str = include_str!("../adapters/minimal-client.ts");

/// Adapter source for `client_type`
pub fn adapter_source(client_type: ClientType) -> &'static str {
    match client_type {
        ClientType::Rich => RICH_ADAPTER,
        ClientType::Minimal => MINIMAL_ADAPTER,
    }
}

/// Write every adapter into `dir`, keeping files already there unless `force`
///
/// Returns the paths actually written.
pub fn write_adapters(dir: &Path, force: bool) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|e| {
        Error::io(format!("Failed to create {}: {e}", dir.display())).with_source(e)
    })?;

    let mut written = Vec::new();
    for &client_type in ClientType::all() {
        let path = dir.join(client_type.adapter_file());
        if path.exists() && !force {
            debug!(path = %path.display(), "Keeping existing adapter");
            continue;
        }
        std::fs::write(&path, adapter_source(client_type)).map_err(|e| {
            Error::io(format!("Failed to write {}: {e}", path.display())).with_source(e)
        })?;
        info!(path = %path.display(), client = %client_type, "Wrote adapter");
        written.push(path);
    }
    Ok(written)
}
