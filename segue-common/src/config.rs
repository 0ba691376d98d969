//! Configuration file discovery and TOML loading
//!
//! Config file resolution priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. Per-user config directory (`<config dir>/segue/config.toml`)
//! 4. None: callers fall back to built-in defaults
//!
//! A missing per-user default file is not an error; an unreadable explicit
//! file or a malformed one is.

use crate::Result;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Application directory name under the platform config dir
pub const APP_DIR_NAME: &str = "segue";

/// Config file name inside the application directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Resolve which config file to read, if any
///
/// An explicitly requested path (CLI or env var) is returned even if it does
/// not exist, so the caller can report it; the per-user default is only
/// returned when present on disk.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Per-user config directory
    default_config_path().filter(|p| p.exists())
}

/// Platform default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Parse a TOML document into `T`
pub fn parse_toml<T: DeserializeOwned>(content: &str) -> Result<T> {
    Ok(toml::from_str(content)?)
}

/// Load and parse a TOML config file
pub fn load_toml_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!("Reading config file {}", path.display());
    let content = std::fs::read_to_string(path)
        .inspect_err(|e| warn!("Cannot read config file {}: {}", path.display(), e))?;
    let parsed = parse_toml(&content)?;
    info!("Loaded configuration from {}", path.display());
    Ok(parsed)
}

/// Resolve and load a config file, or `T::default()` when none is configured
///
/// An explicitly requested file that does not exist is reported as an error.
pub fn load_or_default<T: DeserializeOwned + Default>(
    cli_arg: Option<&Path>,
    env_var_name: &str,
) -> Result<T> {
    match resolve_config_path(cli_arg, env_var_name) {
        Some(path) => load_toml_file(&path),
        None => {
            info!("No config file found, using built-in defaults");
            Ok(T::default())
        }
    }
}
