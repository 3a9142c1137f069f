//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `ROAMLY_DB_PATH`: Credential store file path
//! - `ROAMLY_DB_POOL_SIZE`: Connection pool size
//! - `ROAMLY_DB_ENCRYPTION_KEY`: SQLCipher key (optional in files)
//! - `ROAMLY_CANVA_CLIENT_ID`: OAuth client id
//! - `ROAMLY_CANVA_CLIENT_SECRET`: OAuth client secret (optional)
//! - `ROAMLY_CANVA_REDIRECT_URI`: Registered redirect URI
//! - `ROAMLY_CANVA_SCOPES`: Space-separated scopes (optional)
//! - `ROAMLY_CANVA_BRAND_TEMPLATE_ID`: Template to autofill (optional)
//! - `ROAMLY_CANVA_AUTHORIZATION_ENDPOINT`: Override consent URL (optional)
//! - `ROAMLY_CANVA_API_BASE_URL`: Override REST base URL (optional)

use std::path::{Path, PathBuf};

use roamly_domain::{CanvaConfig, Config, DatabaseConfig, ExportError, Result};

/// Load configuration with automatic fallback strategy.
///
/// Reads a `.env` file when present, then tries environment variables, then
/// falls back to a config file.
///
/// # Errors
/// Returns [`ExportError::ConfigurationMissing`] when neither source yields
/// a complete configuration.
pub fn load() -> Result<Config> {
    let _ = dotenvy::dotenv();

    match load_from_env() {
        Ok(config) => {
            tracing::info!("configuration loaded from environment variables");
            Ok(config)
        }
        Err(err) => {
            tracing::debug!(error = %err, "environment incomplete, trying config file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables.
///
/// # Errors
/// Returns [`ExportError::ConfigurationMissing`] when a required variable is
/// absent or unparseable.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var("ROAMLY_DB_PATH")?;
    let pool_size = env_var("ROAMLY_DB_POOL_SIZE").and_then(|raw| {
        raw.parse::<u32>()
            .map_err(|err| ExportError::ConfigurationMissing(format!("invalid pool size: {err}")))
    })?;
    let encryption_key = std::env::var("ROAMLY_DB_ENCRYPTION_KEY").ok();

    let client_id = env_var("ROAMLY_CANVA_CLIENT_ID")?;
    let redirect_uri = env_var("ROAMLY_CANVA_REDIRECT_URI")?;

    let mut canva = CanvaConfig::new(client_id, redirect_uri);
    canva.client_secret = std::env::var("ROAMLY_CANVA_CLIENT_SECRET").ok();
    canva.brand_template_id = std::env::var("ROAMLY_CANVA_BRAND_TEMPLATE_ID").ok();
    if let Ok(raw) = std::env::var("ROAMLY_CANVA_SCOPES") {
        canva.scopes = raw.split_whitespace().map(ToString::to_string).collect();
    }
    if let Ok(endpoint) = std::env::var("ROAMLY_CANVA_AUTHORIZATION_ENDPOINT") {
        canva.authorization_endpoint = endpoint;
    }
    if let Ok(base_url) = std::env::var("ROAMLY_CANVA_API_BASE_URL") {
        canva.api_base_url = base_url;
    }

    Ok(Config { database: DatabaseConfig { path: db_path, pool_size, encryption_key }, canva })
}

/// Load configuration from a file.
///
/// If `path` is `None`, probes the standard locations. Format is detected by
/// extension (`.json` or `.toml`).
///
/// # Errors
/// Returns [`ExportError::ConfigurationMissing`] when the file is missing,
/// unreadable, or invalid.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ExportError::ConfigurationMissing(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ExportError::ConfigurationMissing(
                "no config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "loading configuration from file");

    let contents = std::fs::read_to_string(&config_path).map_err(|err| {
        ExportError::ConfigurationMissing(format!("failed to read config file: {err}"))
    })?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents).map_err(|err| {
            ExportError::ConfigurationMissing(format!("invalid TOML format: {err}"))
        }),
        "json" => serde_json::from_str(contents).map_err(|err| {
            ExportError::ConfigurationMissing(format!("invalid JSON format: {err}"))
        }),
        other => {
            Err(ExportError::ConfigurationMissing(format!("unsupported config format: {other}")))
        }
    }
}

/// Probe the standard locations for a config file.
///
/// Checks the working directory and up to two parents for
/// `config.{json,toml}` and `roamly.{json,toml}`, then the same relative to
/// the executable.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        for base in [&cwd, &cwd.join(".."), &cwd.join("../..")] {
            candidates.extend([
                base.join("config.json"),
                base.join("config.toml"),
                base.join("roamly.json"),
                base.join("roamly.toml"),
            ]);
        }
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend([
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("roamly.json"),
                exe_dir.join("roamly.toml"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        ExportError::ConfigurationMissing(format!("missing required environment variable: {key}"))
    })
}
