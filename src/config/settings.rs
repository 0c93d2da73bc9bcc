use anyhow::Result;
use directories::ProjectDirs;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::AppConfig;

const APP_NAME: &str = "FileSift";
const CONFIG_FILE: &str = "config.json";
/// Overrides the config directory, e.g. for portable installs and tests.
pub const CONFIG_DIR_ENV: &str = "FILESIFT_CONFIG_DIR";

/// Returns the platform-specific configuration directory for the application.
pub fn get_config_directory() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return Some(PathBuf::from(dir));
    }
    ProjectDirs::from("com", "filesift", APP_NAME)
        .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
}

/// Returns the full path to the configuration file.
pub fn get_config_file_path() -> Option<PathBuf> {
    get_config_directory().map(|dir| dir.join(CONFIG_FILE))
}

fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(p) => Ok(p.to_path_buf()),
        None => get_config_file_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory")),
    }
}

/// Loads the configuration from `path` (or the default location).
///
/// A missing file is created with defaults. A file that does not parse is
/// migrated field by field, and if even that fails the defaults are used.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config_path = resolve_path(path)?;

    if !config_path.exists() {
        tracing::info!(
            "Config file not found, creating default config at {:?}",
            config_path
        );
        let default_config = AppConfig::default();
        save_config(&default_config, Some(config_path.as_path()))?;
        return Ok(default_config);
    }

    let config_content = fs::read_to_string(&config_path)?;

    match serde_json::from_str::<AppConfig>(&config_content) {
        Ok(config) => {
            tracing::info!("Loaded config from {:?}", config_path);
            Ok(config)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse config file at {:?}: {}. Trying migration.",
                config_path,
                e
            );
            migrate_legacy_config(&config_content).or_else(|e| {
                tracing::warn!("Config migration failed ({}), using defaults", e);
                Ok(AppConfig::default())
            })
        }
    }
}

/// Fills in fields that older config files lack (or hold `null` for).
fn migrate_legacy_config(config_content: &str) -> Result<AppConfig> {
    let mut value: Value = serde_json::from_str(config_content)?;
    let obj = value
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("Config is not a JSON object"))?;

    let defaults = serde_json::to_value(AppConfig::default())?;
    let Value::Object(defaults) = defaults else {
        anyhow::bail!("Default config did not serialize to an object");
    };

    let ensure_field = |obj: &mut serde_json::Map<String, Value>, key: &str, default_val: &Value| {
        if !obj.contains_key(key) || obj.get(key) == Some(&Value::Null) {
            obj.insert(key.to_string(), default_val.clone());
        }
    };

    for (key, default_val) in &defaults {
        // `null` is a valid value for the optional paths.
        if matches!(key.as_str(), "last_spreadsheet" | "export_directory") && obj.contains_key(key) {
            continue;
        }
        ensure_field(obj, key, default_val);
    }

    let migrated_config: AppConfig = serde_json::from_value(Value::Object(obj.clone()))?;
    tracing::info!("Successfully migrated legacy config");
    Ok(migrated_config)
}

/// Saves the configuration to `path` (or the default location) as pretty JSON.
pub fn save_config(config: &AppConfig, path: Option<&Path>) -> Result<()> {
    let config_path = resolve_path(path)?;

    if let Some(config_dir) = config_path.parent() {
        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            tracing::info!("Created config directory: {:?}", config_dir);
        }
    }

    let config_json = serde_json::to_string_pretty(config)?;
    fs::write(&config_path, config_json)?;
    tracing::info!("Saved config to {:?}", config_path);

    Ok(())
}

// Platform-specific configuration paths for reference:
// macOS:   ~/Library/Application Support/com.filesift.FileSift/
// Linux:   ~/.config/filesift/
// Windows: %APPDATA%/filesift/FileSift/config/
