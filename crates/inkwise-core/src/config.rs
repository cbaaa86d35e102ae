//! Editor and assistant configuration.

use crate::scene::SnapshotFormat;
use crate::shapes::SerializableColor;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the generative backend API key.
pub const ENV_API_KEY: &str = "INKWISE_GEMINI_API_KEY";
/// Environment variable overriding the model name.
pub const ENV_MODEL: &str = "INKWISE_GEMINI_MODEL";
/// Environment variable overriding the API base URL.
pub const ENV_ENDPOINT: &str = "INKWISE_GEMINI_ENDPOINT";
/// Environment variable overriding the request timeout, in seconds.
pub const ENV_TIMEOUT_SECS: &str = "INKWISE_ASSIST_TIMEOUT_SECS";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Settings that shape the editing surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Canvas background; the eraser paints with this color.
    pub background_color: SerializableColor,
    /// Pen color used at start-up and whenever a usable foreground is needed.
    pub default_pen_color: SerializableColor,
    /// Pen width used at start-up.
    pub default_pen_width: f64,
    /// Smallest accepted pen width.
    pub min_pen_width: f64,
    /// Largest accepted pen width.
    pub max_pen_width: f64,
    /// Distance each successive paste is shifted by, on both axes.
    pub paste_step: f64,
    /// Maximum number of history checkpoints kept.
    pub history_capacity: usize,
    /// Canvas width in pixels.
    pub canvas_width: u32,
    /// Canvas height in pixels.
    pub canvas_height: u32,
    /// Raster format used for document thumbnails and assistant snapshots.
    pub snapshot_format: SnapshotFormat,
}

impl EditorConfig {
    /// Accepted pen widths.
    pub fn pen_width_range(&self) -> RangeInclusive<f64> {
        self.min_pen_width..=self.max_pen_width
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            // #e5e7eb
            background_color: SerializableColor::new(229, 231, 235, 255),
            default_pen_color: SerializableColor::black(),
            default_pen_width: 1.0,
            min_pen_width: 1.0,
            max_pen_width: 30.0,
            paste_step: 10.0,
            history_capacity: 50,
            canvas_width: 1280,
            canvas_height: 800,
            snapshot_format: SnapshotFormat::Png,
        }
    }
}

/// Settings for the generative assistant backend.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl AssistConfig {
    pub const DEFAULT_MODEL: &'static str = "gemini-1.5-flash";
    pub const DEFAULT_ENDPOINT: &'static str = "https://generativelanguage.googleapis.com/v1beta";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

    /// Create a config with default model, endpoint and timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: Self::DEFAULT_MODEL.to_string(),
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Read the config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(ENV_API_KEY)
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::Missing(ENV_API_KEY))?;

        let mut config = Self::new(api_key);
        if let Some(model) = lookup(ENV_MODEL) {
            config.model = model;
        }
        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            config.endpoint = endpoint.trim_end_matches('/').to_string();
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs = raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                name: ENV_TIMEOUT_SECS,
                value: raw.clone(),
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_editor_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.background_color.to_hex(), "#e5e7eb");
        assert!(config.pen_width_range().contains(&30.0));
        assert!(!config.pen_width_range().contains(&31.0));
    }

    #[test]
    fn test_editor_config_partial_json() {
        let config: EditorConfig = serde_json::from_str(r#"{"paste_step": 25.0}"#).unwrap();
        assert!((config.paste_step - 25.0).abs() < f64::EPSILON);
        assert_eq!(config.history_capacity, 50);
    }

    #[test]
    fn test_assist_config_requires_key() {
        let result = AssistConfig::from_lookup(lookup(&[]));
        assert!(matches!(result, Err(ConfigError::Missing(ENV_API_KEY))));
    }

    #[test]
    fn test_assist_config_overrides() {
        let config = AssistConfig::from_lookup(lookup(&[
            (ENV_API_KEY, "secret"),
            (ENV_MODEL, "gemini-pro-vision"),
            (ENV_ENDPOINT, "http://localhost:8080/"),
            (ENV_TIMEOUT_SECS, "5"),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.model, "gemini-pro-vision");
        assert_eq!(config.endpoint, "http://localhost:8080");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_assist_config_bad_timeout() {
        let result = AssistConfig::from_lookup(lookup(&[
            (ENV_API_KEY, "secret"),
            (ENV_TIMEOUT_SECS, "soon"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }
}
