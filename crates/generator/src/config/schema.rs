//! Configuration schema definitions
//!
//! Mirrors the external `orval-forge.config.*` shape. Generator keys this crate
//! does not interpret are kept verbatim in the `extra` maps so they reach the
//! external generator unchanged.

use forge_http::HttpClientConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgeConfig {
    /// Generator entries keyed by name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orval: Option<BTreeMap<String, GeneratorEntry>>,

    /// HTTP client the generated code routes through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_client: Option<HttpClientConfig>,

    /// Output toggles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputOptions>,

    /// Code style options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationOptions>,
}

impl ForgeConfig {
    /// Names of the generator entries
    pub fn entry_names(&self) -> Vec<&str> {
        self.orval
            .iter()
            .flat_map(BTreeMap::keys)
            .map(String::as_str)
            .collect()
    }
}

/// One generator run: an OpenAPI input and where the code goes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorEntry {
    /// Path, URL, or inline options object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<GeneratorOutput>,

    /// Other generator keys (`hooks`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GeneratorEntry {
    /// Input as a path or URL, when given in string form
    pub fn input_str(&self) -> Option<&str> {
        self.input.as_ref().and_then(Value::as_str)
    }

    /// Check whether the entry names an input
    pub fn has_input(&self) -> bool {
        match &self.input {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }
}

/// Output section of a generator entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorOutput {
    /// Generated file or directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// `single`, `split`, `tags` or `tags-split`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// Directory for generated model files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schemas: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,

    #[serde(rename = "override", default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<OutputOverride>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GeneratorOutput {
    /// Target path, ignoring blank values
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Configured adapter hook, if any
    pub fn mutator(&self) -> Option<&Mutator> {
        self.overrides.as_ref().and_then(|o| o.mutator.as_ref())
    }
}

/// `output.override` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutator: Option<Mutator>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Adapter hook the generated code imports for dispatch
///
/// Written either as a bare module path or as an object selecting the export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Mutator {
    /// Module path; the generator imports its default export
    Path(String),
    /// Module path with an explicit export
    Export(MutatorExport),
}

/// Object form of [`Mutator`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutatorExport {
    pub path: String,

    /// Named export to import
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Import the default export instead of a named one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
}

impl Mutator {
    /// Hook importing `name` from `path`
    pub fn named(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Export(MutatorExport {
            path: path.into(),
            name: Some(name.into()),
            default: None,
        })
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Path(path) => path,
            Self::Export(export) => &export.path,
        }
    }

    /// Named export, `None` when the default export is used
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Path(_) => None,
            Self::Export(export) if export.default == Some(true) => None,
            Self::Export(export) => export.name.as_deref(),
        }
    }

    /// Same hook loaded from another module path
    #[must_use]
    pub fn with_path(self, path: impl Into<String>) -> Self {
        match self {
            Self::Path(_) => Self::Path(path.into()),
            Self::Export(export) => Self::Export(MutatorExport {
                path: path.into(),
                ..export
            }),
        }
    }
}

/// Output toggles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputOptions {
    #[serde(default = "default_true")]
    pub generate_types: bool,

    #[serde(default = "default_true")]
    pub generate_client: bool,

    /// Custom template directory; not rendered by this tool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_path: Option<String>,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            generate_types: true,
            generate_client: true,
            template_path: None,
        }
    }
}

/// Code style options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(default = "default_true")]
    pub strict: bool,

    #[serde(default = "default_true")]
    pub comments: bool,

    #[serde(default)]
    pub naming: NamingOptions,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            strict: true,
            comments: true,
            naming: NamingOptions::default(),
        }
    }
}

/// Naming conventions for generated types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamingOptions {
    #[serde(default = "default_interface_prefix")]
    pub interface_prefix: String,

    #[serde(default = "default_type_suffix")]
    pub type_suffix: String,
}

impl Default for NamingOptions {
    fn default() -> Self {
        Self {
            interface_prefix: default_interface_prefix(),
            type_suffix: default_type_suffix(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_interface_prefix() -> String {
    "I".to_string()
}

fn default_type_suffix() -> String {
    "Type".to_string()
}
