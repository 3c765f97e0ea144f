//! Applies file-based configuration to the process environment so the rest
//! of the workspace only ever reads env vars (`OPENAI_API_KEY`,
//! `LABTREE_MODEL`, `LABTREE_MAX_DEPTH`, ...).
//!
//! Two sources, merged with priority **existing env > `.env` > XDG**:
//! a project `.env` in the working directory, and the `[env]` table of
//! `$XDG_CONFIG_HOME/<app>/config.toml`.

mod env_file;
mod settings;

use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config.toml: {0}")]
    SettingsRead(std::io::Error),
    #[error("parse config.toml: {0}")]
    SettingsParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    EnvFileRead(std::io::Error),
}

/// Loads both sources and exports every key that is not already present in
/// the process environment. Set env vars are never overwritten, so a key
/// exported by the shell always wins.
///
/// * `app_name`: the XDG directory name, i.e. `~/.config/<app_name>/config.toml`.
/// * `env_dir`: where to look for `.env`; defaults to the current directory.
pub fn load_and_apply(app_name: &str, env_dir: Option<&Path>) -> Result<(), ConfigError> {
    let settings = settings::env_table(app_name)?;
    let mut merged = settings;
    // .env shadows the XDG table.
    for (key, value) in env_file::read(env_dir).map_err(ConfigError::EnvFileRead)? {
        merged.insert(key, value);
    }
    for (key, value) in merged {
        if std::env::var_os(&key).is_none() {
            std::env::set_var(&key, value);
        }
    }
    Ok(())
}

/// Serializes tests that mutate the process environment; the test harness
/// runs modules in parallel threads and `set_var` is process-global.
#[cfg(test)]
pub(crate) fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(|e| e.into_inner())
}
