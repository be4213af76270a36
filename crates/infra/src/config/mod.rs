//! Configuration loading
//!
//! Builds the application [`Config`](pslang_domain::Config) from an optional
//! JSON/TOML file overlaid with `PSLANG_*` environment variables.

pub mod loader;

pub use loader::{apply_env_overrides, load, load_from_env, load_from_file, probe_config_paths};
