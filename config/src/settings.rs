//! `[env]` table of `$XDG_CONFIG_HOME/<app>/config.toml`.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::ConfigError;

#[derive(Debug, Default, serde::Deserialize)]
struct SettingsFile {
    #[serde(default)]
    env: HashMap<String, String>,
}

/// `$XDG_CONFIG_HOME` wins over the platform default so tests (and
/// containers) can redirect the lookup.
fn settings_path(app_name: &str) -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .filter(|p| p.is_absolute())
        .or_else(dirs::config_dir)?;
    Some(base.join(app_name).join("config.toml"))
}

/// Key-value pairs from the `[env]` table. Missing file, missing table, or
/// an unresolvable config dir all yield an empty map.
pub fn env_table(app_name: &str) -> Result<HashMap<String, String>, ConfigError> {
    let Some(path) = settings_path(app_name) else {
        return Ok(HashMap::new());
    };
    if !path.is_file() {
        return Ok(HashMap::new());
    }
    let content = std::fs::read_to_string(&path).map_err(ConfigError::SettingsRead)?;
    let parsed: SettingsFile = toml::from_str(&content)?;
    Ok(parsed.env)
}
