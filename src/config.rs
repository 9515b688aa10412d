//! Widget configuration and persistence.
//!
//! The hosted voice widget is parameterized by an API key, an application
//! URL, and a language code. A custom configuration entered by the user is
//! persisted as TOML under the platform config directory and wins over the
//! environment-derived defaults until cleared.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};

/// Default language code when none is configured.
pub const DEFAULT_LANGUAGE_CODE: &str = "en-US";

/// Environment variable for the default API key.
pub const ENV_API_KEY: &str = "NLX_API_KEY";
/// Environment variable for the default application URL.
pub const ENV_APP_URL: &str = "NLX_APP_URL";
/// Environment variable for the default language code.
pub const ENV_LANGUAGE_CODE: &str = "NLX_LANGUAGE_CODE";

/// Connection parameters for the hosted voice widget.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// API key sent as a request header.
    api_key: String,
    /// Application URL of the hosted conversational app.
    app_url: String,
    /// BCP 47 language code, e.g. `en-US`.
    language_code: String,
}

impl VoiceConfig {
    /// Creates a configuration from explicit values.
    pub fn new(
        api_key: impl Into<String>,
        app_url: impl Into<String>,
        language_code: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            app_url: app_url.into(),
            language_code: language_code.into(),
        }
    }

    /// Builds the default configuration from the environment.
    ///
    /// Missing variables fall back to empty strings (the demo then runs with
    /// a logging widget) and [`DEFAULT_LANGUAGE_CODE`].
    #[instrument]
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(ENV_API_KEY).unwrap_or_default(),
            app_url: std::env::var(ENV_APP_URL).unwrap_or_default(),
            language_code: std::env::var(ENV_LANGUAGE_CODE)
                .unwrap_or_else(|_| DEFAULT_LANGUAGE_CODE.to_string()),
        }
    }

    /// Whether all fields are filled in.
    ///
    /// A persisted custom configuration missing any field is treated as
    /// corrupt and cleared.
    pub fn is_complete(&self) -> bool {
        !self.api_key.is_empty() && !self.app_url.is_empty() && !self.language_code.is_empty()
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self::new("", "", DEFAULT_LANGUAGE_CODE)
    }
}

/// Where the active configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ConfigSource {
    /// Environment-derived defaults.
    Default,
    /// User-saved custom configuration.
    Custom,
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where the error occurred.
    pub line: u32,
    /// Source file where the error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Persists a custom [`VoiceConfig`] to a TOML file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Creates a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the platform default location
    /// (`<config dir>/voiceplay/config.toml`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the platform config directory cannot be
    /// determined.
    pub fn default_location() -> Result<Self, ConfigError> {
        let dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::new("No platform config directory available"))?;
        Ok(Self::new(dir.join("voiceplay").join("config.toml")))
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Saves a custom configuration, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when serialization or the filesystem write
    /// fails.
    #[instrument(skip(self, config), fields(path = %self.path.display()))]
    pub fn save_custom(&self, config: &VoiceConfig) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::new(format!("Failed to create config dir: {e}")))?;
        }
        let content = toml::to_string_pretty(config)
            .map_err(|e| ConfigError::new(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&self.path, content)
            .map_err(|e| ConfigError::new(format!("Failed to write config file: {e}")))?;
        info!("Saved custom configuration");
        Ok(())
    }

    /// Loads the custom configuration, if a valid one is persisted.
    ///
    /// A corrupt or incomplete file is cleared and ignored, falling back to
    /// defaults instead of failing.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load_custom(&self) -> Option<VoiceConfig> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(error = %e, "Failed to read custom configuration");
                return None;
            }
        };

        match toml::from_str::<VoiceConfig>(&content) {
            Ok(config) if config.is_complete() => {
                debug!("Loaded custom configuration");
                Some(config)
            }
            Ok(_) => {
                warn!("Incomplete custom configuration found, clearing");
                self.clear_custom();
                None
            }
            Err(e) => {
                warn!(error = %e, "Corrupt custom configuration found, clearing");
                self.clear_custom();
                None
            }
        }
    }

    /// Removes the persisted custom configuration, best effort.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn clear_custom(&self) {
        if let Err(e) = std::fs::remove_file(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(error = %e, "Failed to clear custom configuration");
        }
    }

    /// The active configuration: custom if present, defaults otherwise.
    pub fn current(&self) -> VoiceConfig {
        self.load_custom().unwrap_or_else(VoiceConfig::from_env)
    }

    /// Which source [`ConfigStore::current`] would draw from.
    pub fn source(&self) -> ConfigSource {
        if self.load_custom().is_some() {
            ConfigSource::Custom
        } else {
            ConfigSource::Default
        }
    }
}
