//! Configuration and orchestration of the external OpenAPI generator
//!
//! A [`ForgeConfig`] names one or more generator entries and the HTTP client
//! variant generated code should use. The [`Orchestrator`] validates it,
//! resolves paths, points every entry at the client's adapter hook and runs
//! the generator. The adapter sources themselves ship in [`adapters`].
//!
//! # Example
//!
//! ```rust,no_run
//! use forge_generator::{GeneratorOptions, LoadedConfig, Orchestrator};
//!
//! let cwd = std::env::current_dir()?;
//! let loaded = LoadedConfig::load(None, &cwd)?;
//! let orchestrator = Orchestrator::new(loaded.config, GeneratorOptions::new(&cwd));
//!
//! for entry in orchestrator.plan()?.entries {
//!     println!("{} -> {}", entry.name, entry.target);
//! }
//! orchestrator.generate()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod adapters;
pub mod config;
pub mod orchestrator;
pub mod scaffold;

pub use adapters::{adapter_source, write_adapters};
pub use config::{ForgeConfig, LoadedConfig, DEFAULT_CONFIG_FILE};
pub use orchestrator::{GenerationPlan, GenerationReport, GeneratorOptions, Orchestrator};
pub use scaffold::{scaffold_config, write_config};
