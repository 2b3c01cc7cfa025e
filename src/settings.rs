//! Client settings
//!
//! Persisted as a JSON file next to the client. Missing fields fall back to
//! defaults so older files keep loading.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{MATCH_DURATION_MS, MAX_FRAME_DT};
use crate::error::SettingsError;

/// Environment variable naming the settings file
pub const SETTINGS_ENV: &str = "VELOCITY_SETTINGS";

/// Client settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Network ===
    /// Gateway base URL used for matchmaking
    pub gateway_url: String,
    /// Name shown to other players
    pub display_name: String,
    /// Outbound input rate (Hz)
    pub input_send_hz: f64,
    /// Ping interval (ms)
    pub ping_interval_ms: u64,

    // === Offline play ===
    /// Match length (ms)
    pub match_duration_ms: i64,
    /// Add a bot opponent when nobody else is around
    pub bot_fill: bool,
    /// Seed for offline match and bot ids
    pub offline_seed: u64,

    // === Simulation ===
    /// Frame deltas above this are clamped (seconds)
    pub max_frame_dt: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gateway_url: "http://localhost:8080".to_string(),
            display_name: "Pilot".to_string(),
            input_send_hz: 60.0,
            ping_interval_ms: 2000,

            match_duration_ms: MATCH_DURATION_MS,
            bot_fill: true,
            offline_seed: 0x5eed,

            max_frame_dt: MAX_FRAME_DT,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from `path`
    ///
    /// A missing file yields defaults; an unreadable or malformed one is an
    /// error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => {
                let settings = Self::from_json(&json)?;
                log::info!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(SettingsError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Reject values the client cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.input_send_hz.is_finite() && self.input_send_hz > 0.0) {
            return Err(SettingsError::Invalid {
                field: "input_send_hz",
                reason: format!("must be positive, got {}", self.input_send_hz),
            });
        }
        if self.ping_interval_ms == 0 {
            return Err(SettingsError::Invalid {
                field: "ping_interval_ms",
                reason: "must be positive".to_string(),
            });
        }
        if self.match_duration_ms < 0 {
            return Err(SettingsError::Invalid {
                field: "match_duration_ms",
                reason: format!("must not be negative, got {}", self.match_duration_ms),
            });
        }
        if !(self.max_frame_dt.is_finite() && self.max_frame_dt > 0.0) {
            return Err(SettingsError::Invalid {
                field: "max_frame_dt",
                reason: format!("must be positive, got {}", self.max_frame_dt),
            });
        }
        Ok(())
    }
}
