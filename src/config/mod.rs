//! Configuration management for `roster_import`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`ROSTER_*`)
//! 3. Project config (.roster/config.yaml)
//! 4. User config (~/.config/roster/config.yaml)
//! 5. DB config table
//! 6. Defaults

use crate::error::{Result, ResultExt, RosterError};
use crate::import::{DEFAULT_PARENT_NAME, ImportOptions};
use crate::storage::SqliteStorage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Workspace directory name.
pub const ROSTER_DIR: &str = ".roster";

/// Default database filename used when metadata is missing.
const DEFAULT_DB_FILENAME: &str = "roster.db";

/// Default busy timeout applied to the SQLite connection.
const DEFAULT_LOCK_TIMEOUT_MS: u64 = 30_000;

/// Workspace metadata stored in `.roster/metadata.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub database: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            database: DEFAULT_DB_FILENAME.to_string(),
        }
    }
}

impl Metadata {
    /// Load metadata.json from the workspace directory, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(roster_dir: &Path) -> Result<Self> {
        let path = roster_dir.join("metadata.json");
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)?;
        let mut metadata: Self = serde_json::from_str(&contents)?;
        if metadata.database.trim().is_empty() {
            metadata.database = DEFAULT_DB_FILENAME.to_string();
        }
        Ok(metadata)
    }

    /// Write metadata.json into the workspace directory.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, roster_dir: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(roster_dir.join("metadata.json"), contents)?;
        Ok(())
    }
}

/// Discover the active `.roster` directory.
///
/// Honors `ROSTER_DIR` when set, otherwise walks up from `start` (or CWD).
///
/// # Errors
///
/// Returns `NotInitialized` if no workspace directory is found.
pub fn discover_roster_dir(start: Option<&Path>) -> Result<PathBuf> {
    if let Ok(value) = env::var("ROSTER_DIR") {
        if !value.trim().is_empty() {
            let path = PathBuf::from(value);
            if path.is_dir() {
                return Ok(path);
            }
        }
    }

    let mut current = match start {
        Some(path) => path.to_path_buf(),
        None => env::current_dir()?,
    };

    loop {
        let candidate = current.join(ROSTER_DIR);
        if candidate.is_dir() {
            return Ok(candidate);
        }

        if !current.pop() {
            break;
        }
    }

    Err(RosterError::NotInitialized)
}

/// Open storage for a workspace, returning the storage and the database path used.
///
/// # Errors
///
/// Returns an error if config or metadata cannot be read or the database cannot be opened.
pub fn open_storage(
    roster_dir: &Path,
    db_override: Option<&PathBuf>,
    lock_timeout: Option<u64>,
) -> Result<(SqliteStorage, PathBuf)> {
    let startup_layer = load_startup_config(roster_dir)?;
    let db_path = match db_override
        .cloned()
        .or_else(|| db_override_from_layer(&startup_layer))
    {
        Some(path) => path,
        None => roster_dir.join(Metadata::load(roster_dir)?.database),
    };
    let lock_timeout = lock_timeout
        .or_else(|| lock_timeout_from_layer(&startup_layer))
        .unwrap_or(DEFAULT_LOCK_TIMEOUT_MS);

    if !db_path.exists() {
        return Err(RosterError::DatabaseNotFound { path: db_path });
    }

    tracing::debug!(path = %db_path.display(), lock_timeout, "Opening database");
    let storage = SqliteStorage::open_with_timeout(&db_path, Some(lock_timeout))?;
    Ok((storage, db_path))
}

/// A configuration layer split into startup-only and runtime (DB) keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub startup: HashMap<String, String>,
    pub runtime: HashMap<String, String>,
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.startup {
            self.startup.insert(key.clone(), value.clone());
        }
        for (key, value) in &other.runtime {
            self.runtime.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(layer_from_yaml_value(&value))
    }

    /// Build a layer from `ROSTER_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layer = Self::default();
        for (key, value) in vars {
            // ROSTER_DIR selects the workspace; it is not a config key.
            if key == "ROSTER_DIR" {
                continue;
            }
            if let Some(stripped) = key.strip_prefix("ROSTER_") {
                insert_key_value(&mut layer, &normalize_key(stripped), value);
            }
        }
        layer
    }

    /// Build a layer from DB config table values.
    ///
    /// # Errors
    ///
    /// Returns an error if config table lookup fails.
    pub fn from_db(storage: &SqliteStorage) -> Result<Self> {
        let mut layer = Self::default();
        for (key, value) in storage.get_all_config()? {
            if is_startup_key(&key) {
                continue;
            }
            layer.runtime.insert(normalize_key(&key), value);
        }
        Ok(layer)
    }
}

/// CLI overrides for config loading (optional).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub db: Option<PathBuf>,
    pub actor: Option<String>,
    pub lock_timeout: Option<u64>,
    pub default_parent: Option<String>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        if let Some(path) = &self.db {
            insert_key_value(&mut layer, "db", path.to_string_lossy().to_string());
        }
        if let Some(actor) = &self.actor {
            insert_key_value(&mut layer, "actor", actor.clone());
        }
        if let Some(lock_timeout) = self.lock_timeout {
            insert_key_value(&mut layer, "lock-timeout", lock_timeout.to_string());
        }
        if let Some(parent) = &self.default_parent {
            insert_key_value(&mut layer, "default-parent", parent.clone());
        }

        layer
    }
}

/// Load project config (.roster/config.yaml).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(roster_dir: &Path) -> Result<ConfigLayer> {
    ConfigLayer::from_yaml(&roster_dir.join("config.yaml"))
}

/// Load user config (~/.config/roster/config.yaml).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<ConfigLayer> {
    let Ok(home) = env::var("HOME") else {
        return Ok(ConfigLayer::default());
    };
    let path = Path::new(&home)
        .join(".config")
        .join("roster")
        .join("config.yaml");
    ConfigLayer::from_yaml(&path)
}

/// Load startup-only configuration layers (YAML + env, no DB).
///
/// # Errors
///
/// Returns an error if any config file cannot be read or parsed.
pub fn load_startup_config(roster_dir: &Path) -> Result<ConfigLayer> {
    let user = load_user_config()?;
    let project = load_project_config(roster_dir)?;
    let env_layer = ConfigLayer::from_env();

    Ok(ConfigLayer::merge_layers(&[user, project, env_layer]))
}

/// Default config layer (lowest precedence).
#[must_use]
pub fn default_config_layer() -> ConfigLayer {
    let defaults = ImportOptions::default();
    let mut layer = ConfigLayer::default();
    for (key, value) in [
        ("default-parent", defaults.default_parent),
        ("max-code-attempts", defaults.max_code_attempts.to_string()),
        ("project-code-prefix", defaults.project_code_prefix),
        ("cost-center-code-prefix", defaults.cost_center_code_prefix),
    ] {
        layer.runtime.insert(key.to_string(), value);
    }
    layer
}

/// Load configuration with full precedence order.
///
/// # Errors
///
/// Returns an error if any config file cannot be read or parsed, or DB access fails.
pub fn load_config(
    roster_dir: &Path,
    storage: Option<&SqliteStorage>,
    cli: &CliOverrides,
) -> Result<ConfigLayer> {
    let defaults = default_config_layer();
    let db_layer = match storage {
        Some(storage) => ConfigLayer::from_db(storage)?,
        None => ConfigLayer::default(),
    };
    let user = load_user_config()?;
    let project = load_project_config(roster_dir)?;
    let env_layer = ConfigLayer::from_env();
    let cli_layer = cli.as_layer();

    Ok(ConfigLayer::merge_layers(&[
        defaults, db_layer, user, project, env_layer, cli_layer,
    ]))
}

/// Build import options from a merged config layer.
///
/// # Errors
///
/// Returns a config error if `max-code-attempts` is not a positive integer.
pub fn import_options_from_layer(layer: &ConfigLayer) -> Result<ImportOptions> {
    let defaults = ImportOptions::default();

    let max_code_attempts = match get_value(layer, &["max-code-attempts"]) {
        Some(raw) => match raw.trim().parse::<u32>() {
            Ok(value) if value > 0 => value,
            _ => {
                return Err(RosterError::Config(format!(
                    "max-code-attempts must be a positive integer, got '{raw}'"
                )));
            }
        },
        None => defaults.max_code_attempts,
    };

    let text = |keys: &[&str], fallback: String| {
        get_value(layer, keys)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map_or(fallback, str::to_string)
    };

    Ok(ImportOptions {
        actor: resolve_actor(layer),
        default_parent: text(&["default-parent"], DEFAULT_PARENT_NAME.to_string()),
        max_code_attempts,
        project_code_prefix: text(&["project-code-prefix"], defaults.project_code_prefix),
        cost_center_code_prefix: text(
            &["cost-center-code-prefix"],
            defaults.cost_center_code_prefix,
        ),
        dry_run: false,
    })
}

/// Resolve actor from a merged config layer.
#[must_use]
pub fn actor_from_layer(layer: &ConfigLayer) -> Option<String> {
    get_startup_value(layer, &["actor"])
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Resolve actor with fallback to USER and a safe default.
#[must_use]
pub fn resolve_actor(layer: &ConfigLayer) -> String {
    actor_from_layer(layer)
        .or_else(|| env::var("USER").ok().map(|value| value.trim().to_string()))
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Determine if a key is startup-only.
///
/// Startup-only keys can only be set in YAML config files, the
/// environment or CLI flags, not in the database.
#[must_use]
pub fn is_startup_key(key: &str) -> bool {
    matches!(
        normalize_key(key).as_str(),
        "db" | "database" | "actor" | "lock-timeout" | "json"
    )
}

fn insert_key_value(layer: &mut ConfigLayer, key: &str, value: String) {
    let key = normalize_key(key);
    if is_startup_key(&key) {
        layer.startup.insert(key, value);
    } else {
        layer.runtime.insert(key, value);
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('_', "-")
}

fn get_startup_value<'a>(layer: &'a ConfigLayer, keys: &[&str]) -> Option<&'a String> {
    keys.iter().find_map(|key| layer.startup.get(&normalize_key(key)))
}

fn get_value<'a>(layer: &'a ConfigLayer, keys: &[&str]) -> Option<&'a String> {
    keys.iter().find_map(|key| layer.runtime.get(&normalize_key(key)))
}

fn db_override_from_layer(layer: &ConfigLayer) -> Option<PathBuf> {
    get_startup_value(layer, &["db", "database"])
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn lock_timeout_from_layer(layer: &ConfigLayer) -> Option<u64> {
    get_startup_value(layer, &["lock-timeout"]).and_then(|value| value.trim().parse::<u64>().ok())
}

fn layer_from_yaml_value(value: &serde_yaml::Value) -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    let mut flat = HashMap::new();
    flatten_yaml(value, "", &mut flat);

    for (key, value) in flat {
        insert_key_value(&mut layer, &key, value);
    }

    layer
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        serde_yaml::Value::Sequence(values) => {
            let joined = values
                .iter()
                .filter_map(yaml_scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.insert(prefix.to_string(), joined);
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}
