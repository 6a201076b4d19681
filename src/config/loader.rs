use std::path::Path;

use tokio::fs;
use tracing::{info, warn};

use crate::types::MonitorError;

use super::types::{ENV_SETTINGS_PATH, ENV_TARGET};
use super::{paths, Config};

impl Config {
    /// Load configuration from config.json in the app directory.
    /// A missing file gives the defaults.
    pub async fn try_load() -> Result<Self, MonitorError> {
        let config_path = paths::get_config_path()?;
        Self::try_load_from(&config_path).await
    }

    pub async fn try_load_from(config_path: &Path) -> Result<Self, MonitorError> {
        if !config_path.exists() {
            warn!(path = %config_path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(config_path)
            .await
            .map_err(|err| MonitorError::Config(format!("Failed to read config file: {err}")))?;

        let config: Config = serde_json::from_str(&contents)
            .map_err(|err| MonitorError::Config(format!("Failed to parse config.json: {err}")))?;

        config.schedule.validate()?;
        if config.fetch_timeout_secs == 0 {
            return Err(MonitorError::Config(
                "fetch_timeout_secs must be at least 1".to_string(),
            ));
        }

        Ok(config)
    }

    /// Falls back to defaults if loading failed, then applies environment
    /// overrides. Call once logging is up so the warning is visible.
    pub fn or_default(loaded: Result<Self, MonitorError>) -> Self {
        let config = match loaded {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, "Failed to load config.json, using defaults");
                Self::default()
            }
        };
        let config = config.with_overrides(|key| std::env::var(key).ok());
        info!(
            schedule = %config.schedule,
            fetch_timeout_secs = config.fetch_timeout_secs,
            device = %config.device.model,
            "Loaded configuration"
        );
        config
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(target) = lookup(ENV_TARGET).filter(|value| !value.trim().is_empty()) {
            self.initial_target = Some(target.trim().to_string());
        }
        if let Some(path) = lookup(ENV_SETTINGS_PATH).filter(|value| !value.trim().is_empty()) {
            self.settings_path = Some(path.trim().into());
        }
        self
    }
}
