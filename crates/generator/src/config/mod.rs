//! Configuration loading and schema definitions

mod loader;
mod schema;

pub use loader::{find_config_file, load_config_file, LoadedConfig, CONFIG_CANDIDATES, DEFAULT_CONFIG_FILE};
pub use schema::*;
