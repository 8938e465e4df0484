//! Configuration loading for Trellis: XDG `config.toml` plus project `.env`,
//! applied to the process environment with priority
//! **existing env > .env > XDG**, and a typed [`ExplorerSettings`] view over
//! the `TRELLIS_*` keys.

mod env_file;
mod settings;
mod xdg;

use std::path::Path;
use thiserror::Error;

pub use settings::ExplorerSettings;

/// Application name used for the XDG path (`~/.config/trellis/config.toml`)
/// by [`load_and_apply_default`].
pub const APP_NAME: &str = "trellis";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    EnvFileRead(std::io::Error),
}

/// Loads config from XDG `config.toml` and optional project `.env`, then
/// sets environment variables only for keys that are **not** already set
/// (existing env has highest priority).
///
/// When a key is missing from the process environment, the value comes from:
/// 1. the project `.env` (current directory, or `override_dir` if given);
/// 2. the `[env]` table of `$XDG_CONFIG_HOME/<app_name>/config.toml`.
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<(), LoadError> {
    let xdg_map = xdg::load_env_map(app_name)?;
    let env_map = env_file::load_env_map(override_dir).map_err(LoadError::EnvFileRead)?;

    let mut keys: std::collections::HashSet<String> = xdg_map.keys().cloned().collect();
    keys.extend(env_map.keys().cloned());

    for key in keys {
        if std::env::var(&key).is_ok() {
            continue; // existing env wins
        }
        if let Some(value) = env_map.get(&key).or_else(|| xdg_map.get(&key)) {
            std::env::set_var(&key, value);
        }
    }

    Ok(())
}

/// [`load_and_apply`] for the default app name and current directory.
pub fn load_and_apply_default() -> Result<(), LoadError> {
    load_and_apply(APP_NAME, None)
}

// Tests across modules mutate XDG_CONFIG_HOME; serialize them.
#[cfg(test)]
pub(crate) static TEST_ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
