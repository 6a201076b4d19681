use std::path::PathBuf;
use tracing::{debug, warn};

use crate::types::MonitorError;

use super::Config;

const SETTINGS_FILE_NAME: &str = "settings.json";

impl Config {
    /// Get the root directory of the application
    pub fn app_root_dir() -> Result<PathBuf, MonitorError> {
        let config_path = get_config_path()?;
        match config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => Ok(parent.to_path_buf()),
            Some(_) => std::env::current_dir().map_err(|err| {
                MonitorError::Config(format!("Failed to determine app root: {err}"))
            }),
            None => Err(MonitorError::Config(
                "Unable to determine app root directory".to_string(),
            )),
        }
    }

    /// Where persisted settings live. Defaults to settings.json next to
    /// config.json.
    pub fn settings_file(&self) -> Result<PathBuf, MonitorError> {
        match &self.settings_path {
            Some(path) if path.is_absolute() => Ok(path.clone()),
            Some(path) => Ok(Self::app_root_dir()?.join(path)),
            None => Ok(Self::app_root_dir()?.join(SETTINGS_FILE_NAME)),
        }
    }
}

/// Get the path to the config.json file
/// Looks for config.json in the app directory (parent of backend folder)
pub(super) fn get_config_path() -> Result<PathBuf, MonitorError> {
    // Executable is at: app_root/backend/entry
    // Config should be at: app_root/config.json
    if let Ok(exe_path) = std::env::current_exe() {
        debug!(path = %exe_path.display(), "Executable path detected");

        if let Some(app_root) = exe_path.parent().and_then(|backend| backend.parent()) {
            let config_path = app_root.join("config.json");
            debug!(path = %config_path.display(), "Looking for config");
            return Ok(config_path);
        }
    }

    // Fallback: look in current directory
    warn!("Using fallback: looking for config.json in current directory");
    Ok(PathBuf::from("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_settings_path_is_used_as_is() {
        let config = Config {
            settings_path: Some(PathBuf::from("/var/lib/widget/settings.json")),
            ..Config::default()
        };
        assert_eq!(
            config.settings_file().unwrap(),
            PathBuf::from("/var/lib/widget/settings.json")
        );
    }

    #[test]
    fn default_settings_file_sits_next_to_config() {
        let config = Config::default();
        let settings = config.settings_file().unwrap();
        let root = Config::app_root_dir().unwrap();
        assert_eq!(settings, root.join(SETTINGS_FILE_NAME));
    }
}
