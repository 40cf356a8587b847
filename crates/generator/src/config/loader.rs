//! Configuration file loading

use super::schema::ForgeConfig;
use forge_core::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File written by `orval-forge init`
pub const DEFAULT_CONFIG_FILE: &str = "orval-forge.config.json";

/// Files looked up, in order, when no path is given
pub const CONFIG_CANDIDATES: [&str; 2] = [DEFAULT_CONFIG_FILE, "orval-forge.config.toml"];

/// Configuration together with the file it came from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ForgeConfig,
    pub path: PathBuf,
}

impl LoadedConfig {
    /// Load from `path`, or from the first candidate found in `cwd`
    pub fn load(path: Option<&Path>, cwd: &Path) -> Result<Self> {
        let path = match path {
            Some(p) if p.is_absolute() => p.to_path_buf(),
            Some(p) => cwd.join(p),
            None => find_config_file(cwd)
                .ok_or_else(|| Error::config_not_found(cwd.join(DEFAULT_CONFIG_FILE)))?,
        };

        if !path.is_file() {
            return Err(Error::config_not_found(&path));
        }

        let config = load_config_file(&path)?;
        debug!(path = %path.display(), entries = ?config.entry_names(), "Loaded configuration");
        Ok(Self { config, path })
    }
}

/// Find configuration file in standard locations
pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
    CONFIG_CANDIDATES
        .iter()
        .map(|candidate| dir.join(candidate))
        .find(|path| path.is_file())
}

/// Load and parse a JSON or TOML configuration file
pub fn load_config_file(path: &Path) -> Result<ForgeConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::io(format!("Failed to read config file {}: {e}", path.display())).with_source(e)
    })?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|e| {
            Error::config_parse(format!("Failed to parse config file {}: {e}", path.display()))
        }),
        Some("json") | None => serde_json::from_str(&content).map_err(|e| {
            Error::config_parse(format!("Failed to parse config file {}: {e}", path.display()))
        }),
        Some(other) => Err(Error::config_parse(format!(
            "Unsupported config file format: .{other}"
        ))
        .with_context(path.display().to_string())
        .with_suggestion("Use orval-forge.config.json or orval-forge.config.toml")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_core::ErrorCode;
    use tempfile::TempDir;

    const JSON_CONFIG: &str = r#"{
        "orval": { "api": { "input": "./openapi.yaml", "output": { "target": "./src/api.ts" } } },
        "httpClient": { "type": "Minimal", "timeout": 3000 }
    }"#;

    const TOML_CONFIG: &str = r#"
[orval.api]
input = "./openapi.yaml"

[orval.api.output]
target = "./src/api.ts"
mode = "tags-split"

[httpClient]
type = "Rich"
baseURL = "https://api.example.com"

[httpClient.errorHandling]
retryCount = 5
"#;

    #[test]
    fn test_load_json_by_discovery() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), JSON_CONFIG).unwrap();

        let loaded = LoadedConfig::load(None, dir.path()).unwrap();

        assert_eq!(loaded.path, dir.path().join(DEFAULT_CONFIG_FILE));
        let client = loaded.config.http_client.unwrap();
        assert_eq!(client.client_type, "Minimal");
        assert_eq!(client.timeout, Some(3000));
    }

    #[test]
    fn test_load_toml() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("orval-forge.config.toml"), TOML_CONFIG).unwrap();

        let loaded = LoadedConfig::load(None, dir.path()).unwrap();

        let entry = &loaded.config.orval.as_ref().unwrap()["api"];
        assert_eq!(entry.output.as_ref().unwrap().mode.as_deref(), Some("tags-split"));
        let client = loaded.config.http_client.unwrap();
        assert_eq!(client.retry_config().retry_count, 5);
    }

    #[test]
    fn test_json_wins_over_toml() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), JSON_CONFIG).unwrap();
        std::fs::write(dir.path().join("orval-forge.config.toml"), TOML_CONFIG).unwrap();

        assert_eq!(
            find_config_file(dir.path()),
            Some(dir.path().join(DEFAULT_CONFIG_FILE))
        );
    }

    #[test]
    fn test_relative_path_resolves_against_cwd() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("conf")).unwrap();
        std::fs::write(dir.path().join("conf/forge.json"), JSON_CONFIG).unwrap();

        let loaded = LoadedConfig::load(Some(Path::new("conf/forge.json")), dir.path()).unwrap();
        assert_eq!(loaded.path, dir.path().join("conf/forge.json"));
    }

    #[test]
    fn test_missing_config() {
        let dir = TempDir::new().unwrap();

        let err = LoadedConfig::load(None, dir.path()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigNotFound);
        assert!(err.suggestion.is_some());

        let err = LoadedConfig::load(Some(Path::new("nope.json")), dir.path()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigNotFound);
    }

    #[test]
    fn test_parse_errors() {
        let dir = TempDir::new().unwrap();
        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert_eq!(load_config_file(&broken).unwrap_err().code, ErrorCode::ConfigParseError);

        let script = dir.path().join("orval-forge.config.js");
        std::fs::write(&script, "module.exports = {};").unwrap();
        assert_eq!(load_config_file(&script).unwrap_err().code, ErrorCode::ConfigParseError);
    }
}
