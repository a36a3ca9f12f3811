//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory (or
//! an explicit path), then applies `LEDGER_BIND`, `PORT`, `LEDGER_LOG_LEVEL`
//! and `LEDGER_DATABASE_PATH` overrides. With no file at all, built-in
//! defaults are used.

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::AppError;

/// Which [`LedgerStore`](crate::ledger::LedgerStore) backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(AppError::Config(format!(
                "unknown store backend '{other}' (expected 'sqlite' or 'memory')"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// SQLite file (already expanded, no `~`). Unused by the memory backend.
    pub database_path: PathBuf,
}

/// Session cookie transport settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Client-side lifetime of an issued session cookie.
    pub max_age: Duration,
}

/// Fully-resolved service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
    pub log_level: String,
    pub store: StoreConfig,
    pub session: SessionConfig,
}

/// Overrides applied on top of the file. Tests pass these directly instead
/// of mutating the process environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind: Option<String>,
    pub port: Option<String>,
    pub log_level: Option<String>,
    pub database_path: Option<String>,
}

impl Overrides {
    pub fn from_env() -> Self {
        Self {
            bind: env::var("LEDGER_BIND").ok(),
            port: env::var("PORT").ok(),
            log_level: env::var("LEDGER_LOG_LEVEL").ok(),
            database_path: env::var("LEDGER_DATABASE_PATH").ok(),
        }
    }
}

// ── Raw TOML shape ────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    server: RawServer,
    #[serde(default)]
    store: RawStore,
    #[serde(default)]
    session: RawSession,
}

#[derive(Deserialize)]
struct RawServer {
    #[serde(default = "default_bind")]
    bind: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

#[derive(Deserialize)]
struct RawStore {
    #[serde(default = "default_backend")]
    backend: String,
    #[serde(default = "default_database_path")]
    database_path: String,
}

#[derive(Deserialize)]
struct RawSession {
    #[serde(default = "default_cookie_name")]
    cookie_name: String,
    #[serde(default = "default_max_age_days")]
    max_age_days: u64,
}

impl Default for RawServer {
    fn default() -> Self {
        Self { bind: default_bind(), log_level: default_log_level() }
    }
}

impl Default for RawStore {
    fn default() -> Self {
        Self { backend: default_backend(), database_path: default_database_path() }
    }
}

impl Default for RawSession {
    fn default() -> Self {
        Self { cookie_name: default_cookie_name(), max_age_days: default_max_age_days() }
    }
}

fn default_bind() -> String { "127.0.0.1:3333".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_backend() -> String { "sqlite".to_string() }
fn default_database_path() -> String { "./db/app.db".to_string() }
fn default_cookie_name() -> String { "sessionId".to_string() }
fn default_max_age_days() -> u64 { 7 }

const SECS_PER_DAY: u64 = 24 * 60 * 60;

// ── Loading ───────────────────────────────────────────────────────────────────

/// Load config from `config_path`, or `config/default.toml` when present,
/// then apply env-var overrides.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let overrides = Overrides::from_env();

    if let Some(path) = config_path {
        return load_from(Path::new(path), &overrides);
    }

    let default_path = Path::new("config/default.toml");
    if default_path.exists() {
        load_from(default_path, &overrides)
    } else {
        resolve(RawConfig::default(), &overrides)
    }
}

/// Internal loader: accepts an explicit path and overrides.
pub fn load_from(path: &Path, overrides: &Overrides) -> Result<Config, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
    let raw: RawConfig = toml::from_str(&text)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;
    resolve(raw, overrides)
}

fn resolve(raw: RawConfig, overrides: &Overrides) -> Result<Config, AppError> {
    let bind_str = overrides.bind.as_deref().unwrap_or(&raw.server.bind);
    let mut bind: SocketAddr = bind_str
        .parse()
        .map_err(|e| AppError::Config(format!("invalid bind address '{bind_str}': {e}")))?;

    if let Some(port) = overrides.port.as_deref() {
        let port: u16 = port
            .parse()
            .map_err(|e| AppError::Config(format!("invalid PORT '{port}': {e}")))?;
        bind.set_port(port);
    }

    let cookie_name = raw.session.cookie_name;
    if cookie_name.is_empty() || !cookie_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(AppError::Config(format!("invalid session cookie name '{cookie_name}'")));
    }

    let max_age_days = raw.session.max_age_days;
    let max_age = max_age_days
        .checked_mul(SECS_PER_DAY)
        .map(Duration::from_secs)
        .ok_or_else(|| {
            AppError::Config(format!("session max_age_days {max_age_days} is too large"))
        })?;

    let database_path = overrides
        .database_path
        .as_deref()
        .unwrap_or(&raw.store.database_path);

    Ok(Config {
        bind,
        log_level: overrides.log_level.clone().unwrap_or(raw.server.log_level),
        store: StoreConfig {
            backend: raw.store.backend.parse()?,
            database_path: expand_home(database_path),
        },
        session: SessionConfig {
            cookie_name,
            max_age,
        },
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

impl Config {
    /// In-memory store on an ephemeral port: for tests.
    pub fn test_default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 0)),
            log_level: "info".into(),
            store: StoreConfig {
                backend: StoreBackend::Memory,
                database_path: PathBuf::new(),
            },
            session: SessionConfig {
                cookie_name: default_cookie_name(),
                max_age: Duration::from_secs(default_max_age_days() * SECS_PER_DAY),
            },
        }
    }
}
