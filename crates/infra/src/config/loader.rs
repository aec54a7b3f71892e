//! Configuration loader.
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports TOML and JSON formats
//!
//! ## Environment Variables
//! - `LEDGERSYNC_ORGANIZATION_ID`: Remote organization identifier (required)
//! - `LEDGERSYNC_DATACENTER`: Regional datacenter (`us`, `eu`, `in`, `au`, `jp`, `ca`)
//! - `LEDGERSYNC_AS_DRAFT_DEFAULT`: Whether manual syncs default to drafts (true/false)
//! - `LEDGERSYNC_ITEM_CACHE_TTL`: Remote item cache TTL in seconds
//! - `LEDGERSYNC_RETRY_MODE`: `max_retries`, `indefinite`, or `manual`
//! - `LEDGERSYNC_RETRY_MAX_COUNT`: Retry budget under `max_retries`
//! - `LEDGERSYNC_RETRY_BACKOFF_MINUTES`: Base backoff in minutes

use std::path::{Path, PathBuf};

use ledgersync_domain::{
    AppConfig, Datacenter, LedgerSyncError, Result, RetryMode, RetryPolicy, SyncConfig,
};

/// Load configuration with automatic fallback strategy.
///
/// First attempts to load from environment variables. If the required
/// variables are missing, falls back to loading from a config file.
pub fn load() -> Result<AppConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "environment configuration incomplete, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables.
///
/// `LEDGERSYNC_ORGANIZATION_ID` is required; everything else falls back
/// to defaults.
pub fn load_from_env() -> Result<AppConfig> {
    let organization_id = env_var("LEDGERSYNC_ORGANIZATION_ID")?;

    let datacenter = match std::env::var("LEDGERSYNC_DATACENTER") {
        Ok(raw) => parse_datacenter(&raw)?,
        Err(_) => Datacenter::default(),
    };

    let mut sync = SyncConfig {
        as_draft_default: env_bool("LEDGERSYNC_AS_DRAFT_DEFAULT", false),
        ..SyncConfig::default()
    };
    if let Ok(raw) = std::env::var("LEDGERSYNC_ITEM_CACHE_TTL") {
        sync.item_cache_ttl_secs = raw
            .parse()
            .map_err(|e| LedgerSyncError::Config(format!("Invalid item cache TTL: {e}")))?;
    }

    let mut retry = RetryPolicy::default();
    if let Ok(raw) = std::env::var("LEDGERSYNC_RETRY_MODE") {
        retry.mode = match raw.to_ascii_lowercase().as_str() {
            "max_retries" => RetryMode::MaxRetries,
            "indefinite" => RetryMode::Indefinite,
            "manual" => RetryMode::Manual,
            other => {
                return Err(LedgerSyncError::Config(format!("Invalid retry mode: {other}")));
            }
        };
    }
    if let Ok(raw) = std::env::var("LEDGERSYNC_RETRY_MAX_COUNT") {
        retry.max_count = raw
            .parse()
            .map_err(|e| LedgerSyncError::Config(format!("Invalid retry max count: {e}")))?;
    }
    if let Ok(raw) = std::env::var("LEDGERSYNC_RETRY_BACKOFF_MINUTES") {
        retry.backoff_minutes = raw
            .parse()
            .map_err(|e| LedgerSyncError::Config(format!("Invalid retry backoff: {e}")))?;
    }

    Ok(AppConfig { datacenter, organization_id, sync, retry })
}

/// Load configuration from a file.
///
/// If `path` is `None`, probes the standard locations. Format is
/// detected by file extension (`.toml` or `.json`).
pub fn load_from_file(path: Option<PathBuf>) -> Result<AppConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(LedgerSyncError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            LedgerSyncError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| LedgerSyncError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<AppConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| LedgerSyncError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| LedgerSyncError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(LedgerSyncError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a configuration file.
///
/// Searches the working directory, up to two parent directories, and
/// the executable's directory, for `config.{toml,json}` and
/// `ledgersync.{toml,json}`. Returns the first file found.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        for base in [&cwd, &cwd.join(".."), &cwd.join("../..")] {
            candidates.extend([
                base.join("config.toml"),
                base.join("config.json"),
                base.join("ledgersync.toml"),
                base.join("ledgersync.json"),
            ]);
        }
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend([
                exe_dir.join("config.toml"),
                exe_dir.join("ledgersync.toml"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn parse_datacenter(raw: &str) -> Result<Datacenter> {
    match raw.to_ascii_lowercase().as_str() {
        "us" => Ok(Datacenter::Us),
        "eu" => Ok(Datacenter::Eu),
        "in" => Ok(Datacenter::In),
        "au" => Ok(Datacenter::Au),
        "jp" => Ok(Datacenter::Jp),
        "ca" => Ok(Datacenter::Ca),
        other => Err(LedgerSyncError::Config(format!("Unknown datacenter: {other}"))),
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        LedgerSyncError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive).
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
