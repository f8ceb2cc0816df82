//! YAML-backed configuration store.
//!
//! Public settings live in `config.yml`. The values listed in [`SECRET_KEYS`]
//! are written to `secrets.yaml` instead and masked whenever the
//! configuration is shown. Both files are merged on load.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Map, Value};

use super::paths::AppPaths;
use super::settings::Settings;
use super::validation::validate_config;
use crate::core::errors::ApiError;

const REDACTED: &str = "****";

/// `[section, key]` pairs stored in `secrets.yaml`.
pub const SECRET_KEYS: [[&str; 2]; 2] = [["llm", "api_key"], ["server", "session_token"]];

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    /// `PENMARK_CONFIG_PATH`, else the data-dir copy, else the project copy.
    pub fn config_path(&self) -> PathBuf {
        if let Some(path) = config_path_override() {
            return path;
        }
        let user_config = self.paths.user_data_dir.join("config.yml");
        if user_config.exists() {
            user_config
        } else {
            self.paths.project_root.join("config.yml")
        }
    }

    /// Saves always go to the data dir unless `PENMARK_CONFIG_PATH` is set.
    pub fn config_write_path(&self) -> PathBuf {
        config_path_override().unwrap_or_else(|| self.paths.user_data_dir.join("config.yml"))
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.paths.secrets_path.clone()
    }

    pub fn load_config(&self) -> Result<Value, ApiError> {
        let mut config = read_yaml(&self.config_path());
        overlay(&mut config, read_yaml(&self.secrets_path()));
        Ok(config)
    }

    /// Typed view of the merged configuration, with defaults filled in and
    /// environment overrides applied.
    pub fn settings(&self) -> Result<Settings, ApiError> {
        let config = self.load_config()?;
        Ok(Settings::from_value(&config).with_env_overrides())
    }

    /// Validate and save `update`, either merged over the current
    /// configuration or replacing it.
    ///
    /// A secret sent back as the `****` placeholder keeps its stored value.
    pub fn update_config(&self, update: Value, merge: bool) -> Result<(), ApiError> {
        let current = self.load_config()?;
        let mut next = if merge {
            let mut merged = current.clone();
            overlay(&mut merged, update);
            merged
        } else {
            update
        };
        keep_masked_secrets(&mut next, &current);

        validate_config(&next)?;

        let secrets = take_secrets(&mut next);
        write_yaml(&self.config_write_path(), &next)?;
        write_yaml(&self.secrets_path(), &secrets)?;
        tracing::info!("Configuration updated (merge: {})", merge);
        Ok(())
    }

    pub fn redact_sensitive_values(&self, config: &Value) -> Value {
        let mut shown = config.clone();
        for path in SECRET_KEYS {
            if let Some(value) = field_mut(&mut shown, path) {
                if !value.is_null() {
                    *value = json!(REDACTED);
                }
            }
        }
        shown
    }
}

fn config_path_override() -> Option<PathBuf> {
    env::var_os("PENMARK_CONFIG_PATH")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn read_yaml(path: &Path) -> Value {
    if !path.exists() {
        return json!({});
    }

    let parsed = fs::read_to_string(path)
        .map_err(|err| err.to_string())
        .and_then(|contents| {
            serde_yaml::from_str::<Value>(&contents).map_err(|err| err.to_string())
        });
    match parsed {
        Ok(value @ Value::Object(_)) => value,
        Ok(_) => json!({}),
        Err(err) => {
            tracing::warn!("Ignoring config {}: {}", path.display(), err);
            json!({})
        }
    }
}

fn write_yaml(path: &Path, value: &Value) -> Result<(), ApiError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(ApiError::internal)?;
    }
    let yaml = serde_yaml::to_string(value).map_err(ApiError::internal)?;
    fs::write(path, yaml).map_err(ApiError::internal)
}

/// Recursively apply `patch` onto `target`. Objects merge key by key; any
/// other value replaces what was there.
fn overlay(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target_map), Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                match target_map.get_mut(&key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        overlay(existing, value)
                    }
                    _ => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

fn field<'a>(config: &'a Value, [section, key]: [&str; 2]) -> Option<&'a Value> {
    config.get(section)?.get(key)
}

fn field_mut<'a>(config: &'a mut Value, [section, key]: [&str; 2]) -> Option<&'a mut Value> {
    config.get_mut(section)?.get_mut(key)
}

fn keep_masked_secrets(config: &mut Value, current: &Value) {
    for path in SECRET_KEYS {
        let masked = field(config, path).and_then(Value::as_str) == Some(REDACTED);
        if !masked {
            continue;
        }
        match field(current, path).cloned() {
            Some(stored) => {
                if let Some(slot) = field_mut(config, path) {
                    *slot = stored;
                }
            }
            None => {
                remove_field(config, path);
            }
        }
    }
}

fn remove_field(config: &mut Value, [section, key]: [&str; 2]) -> Option<Value> {
    let map = config.get_mut(section)?.as_object_mut()?;
    let removed = map.remove(key);
    if map.is_empty() {
        if let Some(root) = config.as_object_mut() {
            root.remove(section);
        }
    }
    removed
}

/// Move secret values out of `config`, returning them as their own document.
fn take_secrets(config: &mut Value) -> Value {
    let mut secrets = Value::Object(Map::new());
    for path in SECRET_KEYS {
        if let Some(value) = remove_field(config, path) {
            if !value.is_null() {
                secrets[path[0]][path[1]] = value;
            }
        }
    }
    secrets
}
