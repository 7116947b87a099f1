use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;

pub const DEFAULT_CONFIG_PATH: &str = "config/pocketbook.toml";
const ENV_PREFIX: &str = "POCKETBOOK";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    /// JSON file holding the token and language between runs.
    pub state_path: String,
    pub log_level: String,
    pub toast_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            state_path: "config/pocketbook_state.json".to_string(),
            log_level: "info".to_string(),
            toast_delay_ms: 5_000,
        }
    }
}

impl AppConfig {
    pub fn toast_delay(&self) -> Duration {
        Duration::from_millis(self.toast_delay_ms)
    }
}

/// Values given on the command line; they win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config: Option<String>,
    pub base_url: Option<String>,
    pub state_path: Option<String>,
    pub log_level: Option<String>,
}

pub fn load(overrides: ConfigOverrides) -> Result<AppConfig> {
    let config_path = overrides.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = overrides.base_url {
        settings.base_url = base_url;
    }
    if let Some(state_path) = overrides.state_path {
        settings.state_path = state_path;
    }
    if let Some(log_level) = overrides.log_level {
        settings.log_level = log_level;
    }

    Ok(settings)
}
