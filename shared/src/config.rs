//! Runtime configuration handed to the core by the shell.
//!
//! The shell passes a JSON document on [`crate::Event::AppStarted`]. Every
//! field is optional; anything missing falls back to the values the app has
//! always shipped with.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capabilities::GeolocationOptions;
use crate::{
    DEFAULT_ATTENDANCE_LIMIT, DEFAULT_DISTANCE, DESCRIPTION_MAX_CHARS, HOLD_REPEAT_INTERVAL_MS,
    INITIAL_PAGE_SIZE, PAGE_INCREMENT, SESSION_KEY, TITLE_MAX_CHARS,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("session key cannot be empty")]
    EmptySessionKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub initial_page_size: u32,
    pub page_increment: u32,
    pub default_distance: u32,
    pub hold_repeat_interval_ms: u64,
    pub geolocation: GeolocationOptions,
    pub default_attendance_limit: u32,
    pub title_max_chars: usize,
    pub description_max_chars: usize,
    pub session_key: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            initial_page_size: INITIAL_PAGE_SIZE,
            page_increment: PAGE_INCREMENT,
            default_distance: DEFAULT_DISTANCE,
            hold_repeat_interval_ms: HOLD_REPEAT_INTERVAL_MS,
            geolocation: GeolocationOptions::default(),
            default_attendance_limit: DEFAULT_ATTENDANCE_LIMIT,
            title_max_chars: TITLE_MAX_CHARS,
            description_max_chars: DESCRIPTION_MAX_CHARS,
            session_key: SESSION_KEY.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses `json` when present, falling back to defaults on any problem.
    #[must_use]
    pub fn from_json_or_default(json: Option<&str>) -> Self {
        match json.map(Self::from_json) {
            Some(Ok(config)) => config,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "invalid app config, using defaults");
                Self::default()
            }
            None => Self::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_page_size == 0 {
            return Err(ConfigError::Zero {
                field: "initial_page_size",
            });
        }
        if self.page_increment == 0 {
            return Err(ConfigError::Zero {
                field: "page_increment",
            });
        }
        if self.hold_repeat_interval_ms == 0 {
            return Err(ConfigError::Zero {
                field: "hold_repeat_interval_ms",
            });
        }
        if self.session_key.trim().is_empty() {
            return Err(ConfigError::EmptySessionKey);
        }
        Ok(())
    }
}
