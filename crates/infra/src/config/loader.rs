//! Configuration loader
//!
//! ## Loading Strategy
//! 1. `PSLANG_CONFIG` names a config file explicitly; otherwise standard
//!    locations are probed (see [`probe_config_paths`])
//! 2. Without a file, every section starts from its defaults
//! 3. `PSLANG_*` environment variables are applied last and always win
//!
//! ## Environment Variables
//! - `PSLANG_HOST`, `PSLANG_PORT`, `PSLANG_PUBLIC_URL`
//! - `PSLANG_DB_PATH`, `PSLANG_DB_POOL_SIZE`, `PSLANG_DB_ENCRYPTION_KEY`
//! - `PSLANG_IDENTITY_URL`, `PSLANG_IDENTITY_SECRET_KEY`
//! - `PSLANG_EMAIL_API_URL`, `PSLANG_EMAIL_API_KEY`, `PSLANG_EMAIL_FROM`,
//!   `PSLANG_FEEDBACK_NOTIFY_ADDRESS`
//! - `PSLANG_ANALYTICS_CAPTURE_URL`, `PSLANG_ANALYTICS_API_KEY`
//! - `PSLANG_OAUTH_STATE_SECRET`, `PSLANG_OAUTH_STATE_TTL`
//! - `PSLANG_{ANTHROPIC,OPENAI}_{CLIENT_ID,CLIENT_SECRET,AUTHORIZE_URL,TOKEN_URL,API_BASE_URL,SCOPES}`
//!   (`SCOPES` is comma separated)
//!
//! ## File Locations
//! `config.{json,toml}` and `pslang.{json,toml}` in the working directory,
//! its parent, and next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use pslang_domain::{ChatProvider, Config, PsLangError, Result};

/// Load configuration: file (if any), then environment overrides.
///
/// # Errors
/// Returns `PsLangError::Config` if the file cannot be read or parsed, or an
/// environment variable has an invalid value.
pub fn load() -> Result<Config> {
    let explicit = std::env::var("PSLANG_CONFIG").ok().map(PathBuf::from);
    let mut config = match explicit.or_else(probe_config_paths) {
        Some(path) => load_from_file(Some(path))?,
        None => {
            tracing::debug!("no config file found, starting from defaults");
            Config::default()
        }
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

/// Load configuration from defaults plus environment variables only.
///
/// # Errors
/// Returns `PsLangError::Config` for malformed values.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    tracing::info!("Configuration loaded from environment variables");
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Format is picked by
/// extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `PsLangError::Config` if the file is missing or invalid.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(PsLangError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            PsLangError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| PsLangError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Apply `PSLANG_*` overrides read through `lookup`.
///
/// Empty values are ignored so an unset-but-exported variable does not blank
/// a file setting.
///
/// # Errors
/// Returns `PsLangError::Config` when a numeric variable does not parse.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("PSLANG_HOST") {
        config.server.host = v;
    }
    if let Some(v) = get("PSLANG_PORT") {
        config.server.port = parse_number("PSLANG_PORT", &v)?;
    }
    if let Some(v) = get("PSLANG_PUBLIC_URL") {
        config.server.public_url = v.trim_end_matches('/').to_string();
    }

    if let Some(v) = get("PSLANG_DB_PATH") {
        config.database.path = v;
    }
    if let Some(v) = get("PSLANG_DB_POOL_SIZE") {
        config.database.pool_size = parse_number("PSLANG_DB_POOL_SIZE", &v)?;
    }
    if let Some(v) = get("PSLANG_DB_ENCRYPTION_KEY") {
        config.database.encryption_key = Some(v);
    }

    if let Some(v) = get("PSLANG_IDENTITY_URL") {
        config.identity.base_url = v;
    }
    if let Some(v) = get("PSLANG_IDENTITY_SECRET_KEY") {
        config.identity.secret_key = Some(v);
    }

    if let Some(v) = get("PSLANG_EMAIL_API_URL") {
        config.email.api_url = v;
    }
    if let Some(v) = get("PSLANG_EMAIL_API_KEY") {
        config.email.api_key = Some(v);
    }
    if let Some(v) = get("PSLANG_EMAIL_FROM") {
        config.email.from = v;
    }
    if let Some(v) = get("PSLANG_FEEDBACK_NOTIFY_ADDRESS") {
        config.email.notify_address = Some(v);
    }

    if let Some(v) = get("PSLANG_ANALYTICS_CAPTURE_URL") {
        config.analytics.capture_url = Some(v);
    }
    if let Some(v) = get("PSLANG_ANALYTICS_API_KEY") {
        config.analytics.api_key = Some(v);
    }

    if let Some(v) = get("PSLANG_OAUTH_STATE_SECRET") {
        config.oauth.state_secret = v;
    }
    if let Some(v) = get("PSLANG_OAUTH_STATE_TTL") {
        config.oauth.state_ttl_seconds = parse_number("PSLANG_OAUTH_STATE_TTL", &v)?;
    }

    for provider in ChatProvider::ALL {
        let prefix = format!("PSLANG_{}", provider.as_str().to_ascii_uppercase());
        let section = config.connectors.provider_mut(provider);
        if let Some(v) = get(&format!("{prefix}_CLIENT_ID")) {
            section.client_id = Some(v);
        }
        if let Some(v) = get(&format!("{prefix}_CLIENT_SECRET")) {
            section.client_secret = Some(v);
        }
        if let Some(v) = get(&format!("{prefix}_AUTHORIZE_URL")) {
            section.authorize_url = v;
        }
        if let Some(v) = get(&format!("{prefix}_TOKEN_URL")) {
            section.token_url = v;
        }
        if let Some(v) = get(&format!("{prefix}_API_BASE_URL")) {
            section.api_base_url = v;
        }
        if let Some(v) = get(&format!("{prefix}_SCOPES")) {
            section.scopes = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    Ok(())
}

/// Parse configuration from string content, format by file extension.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| PsLangError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| PsLangError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(PsLangError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe the standard locations for a config file.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 4] = ["config.json", "config.toml", "pslang.json", "pslang.toml"];

    let mut dirs = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.clone());
        dirs.push(cwd.join(".."));
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir);
    }

    dirs.iter().flat_map(|dir| NAMES.iter().map(move |name| dir.join(name))).find(|p| p.exists())
}

fn parse_number<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| PsLangError::Config(format!("Invalid value for {key}: {e}")))
}
