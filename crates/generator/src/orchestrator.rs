//! Generator orchestration
//!
//! Turns a [`ForgeConfig`] into one run of the external OpenAPI generator:
//!
//! 1. Validate the configuration
//! 2. Resolve relative paths against the working directory
//! 3. Inject the selected client's adapter hook where none is configured
//! 4. Write a temporary generator config and run the generator on it

use crate::config::{ForgeConfig, GeneratorEntry, Mutator, OutputOverride};
use forge_core::error::{Error, Result};
use forge_core::process;
use forge_http::{available_client_types, ClientType};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::env;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Export name of the adapter hook
pub const MUTATOR_NAME: &str = "customInstance";

/// Environment variable overriding the adapter directory
pub const ADAPTER_DIR_ENV: &str = "ORVAL_FORGE_ADAPTER_DIR";

/// Generator executable
const GENERATOR_BIN: &str = "orval";

/// Runtime settings of the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Directory relative paths are resolved against
    pub cwd: PathBuf,
    /// Directory holding the client adapter files
    pub adapter_dir: PathBuf,
    /// Pass generator output through to the terminal instead of capturing it
    pub stream_output: bool,
}

impl GeneratorOptions {
    /// Options for `cwd`, honoring `ORVAL_FORGE_ADAPTER_DIR`
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        let cwd = cwd.into();
        let adapter_dir = env::var_os(ADAPTER_DIR_ENV)
            .filter(|dir| !dir.is_empty())
            .map_or_else(|| cwd.join("mutators"), PathBuf::from);
        Self {
            cwd,
            adapter_dir,
            stream_output: false,
        }
    }

    /// Builder-style method to set the adapter directory
    #[must_use]
    pub fn with_adapter_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.adapter_dir = dir.into();
        self
    }

    /// Builder-style method to stream generator output
    #[must_use]
    pub fn with_stream_output(mut self, stream: bool) -> Self {
        self.stream_output = stream;
        self
    }

    /// Absolute adapter directory
    pub fn adapter_root(&self) -> PathBuf {
        absolutize(&self.cwd, &self.adapter_dir)
    }

    /// Absolute path of the adapter file for `client_type`
    pub fn adapter_path(&self, client_type: ClientType) -> PathBuf {
        self.adapter_root().join(client_type.adapter_file())
    }
}

/// What a generation run would do
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationPlan {
    pub client_type: String,
    pub entries: Vec<PlannedEntry>,
}

/// One generator entry after preparation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedEntry {
    pub name: String,
    /// Resolved input path or URL; `None` for inline input objects
    pub input: Option<String>,
    pub target: String,
    pub mutator: Mutator,
    /// Whether the hook was injected rather than user supplied
    pub injected: bool,
}

/// Outcome of a successful generation run
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub client_type: ClientType,
    pub entries: Vec<String>,
    pub duration: Duration,
    /// Captured generator output, empty when streamed
    pub output: String,
}

/// Drives the external generator for one configuration
#[derive(Debug, Clone)]
pub struct Orchestrator {
    config: ForgeConfig,
    options: GeneratorOptions,
}

impl Orchestrator {
    pub fn new(config: ForgeConfig, options: GeneratorOptions) -> Self {
        Self { config, options }
    }

    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Check the configuration and return the selected client variant
    ///
    /// When any entry relies on the injected hook, the adapter file must exist.
    pub fn validate(&self) -> Result<ClientType> {
        let entries = self
            .config
            .orval
            .as_ref()
            .ok_or_else(|| Error::validation("Orval configuration is required"))?;
        if entries.is_empty() {
            return Err(Error::validation("Orval configuration is empty or invalid"));
        }

        let client = self
            .config
            .http_client
            .as_ref()
            .ok_or_else(|| Error::validation("HTTP client configuration is required"))?;
        let client_type = client.client_type.parse::<ClientType>().map_err(|_| {
            Error::unsupported_client_type(&client.client_type, &available_client_types())
        })?;
        client.validate().map_err(|e| {
            Error::validation(format!("Invalid HTTP client configuration: {e}"))
        })?;

        for (name, entry) in entries {
            if !entry.has_input() {
                return Err(Error::validation(format!("Config \"{name}\" requires an input")));
            }
            let Some(output) = &entry.output else {
                return Err(Error::validation(format!("Config \"{name}\" requires an output")));
            };
            if output.target().is_none() {
                return Err(Error::validation(format!(
                    "Config \"{name}\" output requires a target"
                )));
            }
        }

        let needs_adapter = entries
            .values()
            .any(|entry| entry.output.as_ref().is_some_and(|o| o.mutator().is_none()));
        if needs_adapter {
            let adapter = self.options.adapter_path(client_type);
            if !adapter.is_file() {
                return Err(Error::validation(format!(
                    "HTTP client adapter not found: {}",
                    adapter.display()
                ))
                .with_suggestion(
                    "Run `orval-forge init` to write the adapters, or pass --adapter-dir",
                ));
            }
        }

        if let Some(template_path) = self
            .config
            .output
            .as_ref()
            .and_then(|o| o.template_path.as_deref())
        {
            warn!(template_path, "Custom templates are not rendered; templatePath is ignored");
        }

        Ok(client_type)
    }

    /// Generator entries with absolute paths and adapter hooks in place
    pub fn prepare(&self) -> Result<BTreeMap<String, GeneratorEntry>> {
        let client_type = self.validate()?;
        Ok(self.prepare_for(client_type))
    }

    fn prepare_for(&self, client_type: ClientType) -> BTreeMap<String, GeneratorEntry> {
        let entries = self.config.orval.clone().unwrap_or_default();
        let mutator_path = self.options.adapter_path(client_type);

        let prepared = entries
            .into_iter()
            .map(|(name, entry)| {
                let entry = self.prepare_entry(&name, entry, client_type, &mutator_path);
                (name, entry)
            })
            .collect::<BTreeMap<_, _>>();

        debug!(
            entries = ?prepared.keys().collect::<Vec<_>>(),
            cwd = %self.options.cwd.display(),
            "Prepared generator configuration"
        );
        prepared
    }

    fn prepare_entry(
        &self,
        name: &str,
        mut entry: GeneratorEntry,
        client_type: ClientType,
        mutator_path: &Path,
    ) -> GeneratorEntry {
        let cwd = &self.options.cwd;

        let resolved_input = entry
            .input_str()
            .filter(|i| !is_url(i))
            .map(|i| absolutize_str(cwd, i));
        if let Some(input) = resolved_input {
            entry.input = Some(Value::String(input));
        }

        if let Some(output) = entry.output.as_mut() {
            output.target = output.target.as_deref().map(|t| absolutize_str(cwd, t));
            output.schemas = output.schemas.as_deref().map(|s| absolutize_str(cwd, s));

            let overrides = output.overrides.get_or_insert_with(OutputOverride::default);
            overrides.mutator = match overrides.mutator.take() {
                Some(mutator) => {
                    let path = absolutize_str(cwd, mutator.path());
                    Some(mutator.with_path(path))
                }
                None => {
                    info!(entry = name, client = %client_type, "Injecting HTTP client adapter");
                    Some(Mutator::named(mutator_path.display().to_string(), MUTATOR_NAME))
                }
            };
        }

        entry
    }

    /// Describe the run without executing anything
    pub fn plan(&self) -> Result<GenerationPlan> {
        let client_type = self.validate()?;
        let prepared = self.prepare_for(client_type);
        let original = self.config.orval.as_ref();

        let entries = prepared
            .into_iter()
            .filter_map(|(name, entry)| {
                let output = entry.output.as_ref()?;
                let injected = original
                    .and_then(|o| o.get(&name))
                    .and_then(|e| e.output.as_ref())
                    .is_none_or(|o| o.mutator().is_none());
                Some(PlannedEntry {
                    input: entry.input_str().map(String::from),
                    target: output.target().unwrap_or_default().to_string(),
                    mutator: output.mutator()?.clone(),
                    injected,
                    name,
                })
            })
            .collect();

        Ok(GenerationPlan {
            client_type: client_type.to_string(),
            entries,
        })
    }

    /// Run the external generator
    #[instrument(skip(self), fields(cwd = %self.options.cwd.display()))]
    pub fn generate(&self) -> Result<GenerationReport> {
        let start = Instant::now();
        let client_type = self.validate()?;
        let prepared = self.prepare_for(client_type);

        let config_file = write_temp_config(&prepared)?;
        let config_path = config_file.path().display().to_string();
        debug!(path = %config_path, "Wrote temporary generator config");

        let (program, mut args) = locate_generator()?;
        args.extend(["--config".to_string(), config_path]);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        info!(program = %program.display(), ?args, "Running generator");
        let output = if self.options.stream_output {
            let code = process::run_command_streaming_in_dir(&program, &args, &self.options.cwd)?;
            if code != 0 {
                return Err(Error::generator_failed(code));
            }
            String::new()
        } else {
            let result = process::run_command_in_dir(&program, &args, &self.options.cwd)?;
            if !result.success {
                return Err(Error::generator_failed(result.exit_code)
                    .with_context(result.combined_output().trim().to_string()));
            }
            result.combined_output()
        };

        let report = GenerationReport {
            client_type,
            entries: prepared.into_keys().collect(),
            duration: start.elapsed(),
            output,
        };
        info!(
            entries = report.entries.len(),
            elapsed_ms = report.duration.as_millis(),
            "Generation completed"
        );
        Ok(report)
    }
}

/// Serialize prepared entries into a temporary CommonJS config file
///
/// The file is removed when the returned handle is dropped.
fn write_temp_config(
    prepared: &BTreeMap<String, GeneratorEntry>,
) -> Result<tempfile::NamedTempFile> {
    let json = serde_json::to_string_pretty(prepared)?;
    let mut file = tempfile::Builder::new()
        .prefix("orval-forge-")
        .suffix(".config.js")
        .tempfile()
        .map_err(|e| Error::io(format!("Failed to create temporary config: {e}")).with_source(e))?;
    writeln!(file, "module.exports = {json};")?;
    file.flush()?;
    Ok(file)
}

/// `orval` from `PATH`, or `npx orval` as fallback
fn locate_generator() -> Result<(PathBuf, Vec<String>)> {
    if let Some(orval) = process::which_command(GENERATOR_BIN) {
        return Ok((orval, Vec::new()));
    }
    if let Some(npx) = process::which_command("npx") {
        debug!("orval not on PATH, falling back to npx");
        return Ok((npx, vec![GENERATOR_BIN.to_string()]));
    }
    Err(Error::command_not_found(GENERATOR_BIN)
        .with_suggestion("Install it with `npm install -D orval` or make npx available"))
}

fn is_url(input: &str) -> bool {
    input.contains("://")
}

fn absolutize_str(cwd: &Path, path: &str) -> String {
    absolutize(cwd, Path::new(path)).display().to_string()
}

/// Join `path` onto `cwd` unless absolute, folding `.` and `..` lexically
fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_core::ErrorCode;
    use serde_json::json;

    fn config(value: Value) -> ForgeConfig {
        serde_json::from_value(value).unwrap()
    }

    fn petstore() -> ForgeConfig {
        config(json!({
            "orval": {
                "petstore": {
                    "input": "./specs/petstore.yaml",
                    "output": { "target": "./src/api/petstore.ts", "schemas": "src/model" }
                },
                "remote": {
                    "input": "https://petstore3.swagger.io/api/v3/openapi.json",
                    "output": {
                        "target": "/abs/remote.ts",
                        "override": { "mutator": { "path": "./my-client.ts", "name": "http" } }
                    }
                }
            },
            "httpClient": { "type": "Rich" }
        }))
    }

    /// Adapter sources shipped with this crate
    fn shipped_adapters() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("adapters")
    }

    fn orchestrator(config: ForgeConfig) -> Orchestrator {
        let options = GeneratorOptions::new("/work/project").with_adapter_dir(shipped_adapters());
        Orchestrator::new(config, options)
    }

    #[test]
    fn test_validate_missing_sections() {
        let err = orchestrator(config(json!({ "httpClient": { "type": "Rich" } })))
            .validate()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigValidationError);
        assert_eq!(err.message, "Orval configuration is required");

        let err = orchestrator(config(json!({ "orval": {}, "httpClient": { "type": "Rich" } })))
            .validate()
            .unwrap_err();
        assert_eq!(err.message, "Orval configuration is empty or invalid");

        let err = orchestrator(config(json!({
            "orval": { "api": { "input": "a.yaml", "output": { "target": "a.ts" } } }
        })))
        .validate()
        .unwrap_err();
        assert_eq!(err.message, "HTTP client configuration is required");
    }

    #[test]
    fn test_validate_unsupported_client_type() {
        let err = orchestrator(config(json!({
            "orval": { "api": { "input": "a.yaml", "output": { "target": "a.ts" } } },
            "httpClient": { "type": "Axios" }
        })))
        .validate()
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::UnsupportedClientType);
        assert_eq!(err.suggestion.as_deref(), Some("Available types: Rich, Minimal"));
    }

    #[test]
    fn test_validate_incomplete_entries() {
        let cases = [
            (json!({ "output": { "target": "a.ts" } }), "Config \"api\" requires an input"),
            (json!({ "input": "a.yaml" }), "Config \"api\" requires an output"),
            (json!({ "input": "a.yaml", "output": {} }), "Config \"api\" output requires a target"),
        ];

        for (entry, message) in cases {
            let err = orchestrator(config(json!({
                "orval": { "api": entry },
                "httpClient": { "type": "Minimal" }
            })))
            .validate()
            .unwrap_err();
            assert_eq!(err.message, message);
        }
    }

    #[test]
    fn test_validate_accepts_legacy_client_name() {
        let client_type = orchestrator(config(json!({
            "orval": { "api": { "input": "a.yaml", "output": { "target": "a.ts" } } },
            "httpClient": { "type": "MyMiniRequest" }
        })))
        .validate()
        .unwrap();
        assert_eq!(client_type, ClientType::Minimal);
    }

    #[test]
    fn test_prepare_resolves_paths_and_injects_mutator() {
        let prepared = orchestrator(petstore()).prepare().unwrap();

        let petstore = &prepared["petstore"];
        assert_eq!(petstore.input_str(), Some("/work/project/specs/petstore.yaml"));
        let output = petstore.output.as_ref().unwrap();
        assert_eq!(output.target.as_deref(), Some("/work/project/src/api/petstore.ts"));
        assert_eq!(output.schemas.as_deref(), Some("/work/project/src/model"));
        let adapter = shipped_adapters().join("rich-client.ts");
        assert_eq!(
            output.mutator(),
            Some(&Mutator::named(adapter.display().to_string(), MUTATOR_NAME))
        );
    }

    #[test]
    fn test_prepare_keeps_user_mutator_and_urls() {
        let prepared = orchestrator(petstore()).prepare().unwrap();

        let remote = &prepared["remote"];
        assert_eq!(
            remote.input_str(),
            Some("https://petstore3.swagger.io/api/v3/openapi.json")
        );
        let output = remote.output.as_ref().unwrap();
        assert_eq!(output.target.as_deref(), Some("/abs/remote.ts"));
        assert_eq!(
            output.mutator(),
            Some(&Mutator::named("/work/project/my-client.ts", "http"))
        );
    }

    #[test]
    fn test_prepare_resolves_bare_mutator_path() {
        let prepared = orchestrator(config(json!({
            "orval": {
                "api": {
                    "input": "a.yaml",
                    "output": { "target": "a.ts", "override": { "mutator": "../shared/http.ts" } }
                }
            },
            "httpClient": { "type": "Minimal" }
        })))
        .prepare()
        .unwrap();

        let mutator = prepared["api"].output.as_ref().unwrap().mutator().unwrap();
        assert_eq!(mutator, &Mutator::Path("/work/shared/http.ts".to_string()));
    }

    #[test]
    fn test_validate_requires_adapter_file() {
        let options = GeneratorOptions::new("/work/project").with_adapter_dir("/opt/forge/mutators");
        let err = Orchestrator::new(petstore(), options.clone()).plan().unwrap_err();

        assert_eq!(err.code, ErrorCode::ConfigValidationError);
        assert_eq!(
            err.message,
            "HTTP client adapter not found: /opt/forge/mutators/rich-client.ts"
        );
        assert!(err.suggestion.as_deref().unwrap().contains("orval-forge init"));

        let user_hooks_only = config(json!({
            "orval": {
                "api": {
                    "input": "a.yaml",
                    "output": { "target": "a.ts", "override": { "mutator": "./http.ts" } }
                }
            },
            "httpClient": { "type": "Rich" }
        }));
        assert_eq!(
            Orchestrator::new(user_hooks_only, options).validate().unwrap(),
            ClientType::Rich
        );
    }

    #[test]
    fn test_validate_accepts_written_adapters() {
        let dir = tempfile::TempDir::new().unwrap();
        crate::adapters::write_adapters(dir.path(), false).unwrap();
        let options = GeneratorOptions::new("/work/project").with_adapter_dir(dir.path());

        let plan = Orchestrator::new(petstore(), options).plan().unwrap();

        let adapter = dir.path().join("rich-client.ts");
        assert_eq!(plan.entries[0].mutator.path(), adapter.display().to_string());
    }

    #[test]
    fn test_prepare_does_not_touch_the_input_config() {
        let orchestrator = orchestrator(petstore());
        orchestrator.prepare().unwrap();

        let original = &orchestrator.config().orval.as_ref().unwrap()["petstore"];
        assert_eq!(original.input_str(), Some("./specs/petstore.yaml"));
        assert!(original.output.as_ref().unwrap().overrides.is_none());
    }

    #[test]
    fn test_plan_reports_injection() {
        let plan = orchestrator(petstore()).plan().unwrap();

        assert_eq!(plan.client_type, "Rich");
        assert_eq!(plan.entries.len(), 2);
        assert_eq!(plan.entries[0].name, "petstore");
        assert!(plan.entries[0].injected);
        assert_eq!(plan.entries[1].name, "remote");
        assert!(!plan.entries[1].injected);
    }

    #[test]
    fn test_minimal_adapter_path() {
        let options = GeneratorOptions::new("/work").with_adapter_dir("adapters/../mutators");
        assert_eq!(
            options.adapter_path(ClientType::Minimal),
            PathBuf::from("/work/mutators/minimal-client.ts")
        );
    }

    #[test]
    fn test_absolutize() {
        let cwd = Path::new("/work/project");
        assert_eq!(absolutize(cwd, Path::new("./a/b.ts")), PathBuf::from("/work/project/a/b.ts"));
        assert_eq!(absolutize(cwd, Path::new("../shared/x.yaml")), PathBuf::from("/work/shared/x.yaml"));
        assert_eq!(absolutize(cwd, Path::new("/etc/spec.yaml")), PathBuf::from("/etc/spec.yaml"));
    }

    #[test]
    fn test_temp_config_is_commonjs_and_removed_on_drop() {
        let prepared = orchestrator(petstore()).prepare().unwrap();
        let file = write_temp_config(&prepared).unwrap();
        let path = file.path().to_path_buf();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("module.exports = {"));
        assert!(content.contains("customInstance"));
        assert!(path.to_string_lossy().ends_with(".config.js"));

        drop(file);
        assert!(!path.exists());
    }

    #[test]
    fn test_generate_fails_validation_before_running_anything() {
        let err = orchestrator(config(json!({ "httpClient": { "type": "Rich" } })))
            .generate()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigValidationError);
    }
}
