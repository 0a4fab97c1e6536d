//! Configuration management for meter calibration and cadence
//!
//! This module provides runtime configuration loading from JSON files, so
//! calibration constants and band bounds for a particular microphone can be
//! adjusted without recompilation. Every field has a default, so a partial
//! file only overrides what it names.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use crate::audio::DEFAULT_RING_CAPACITY;
use crate::error::ClassificationError;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub meter: MeterConfig,
    pub bands: BandConfig,
    pub sampling: SamplingConfig,
    pub audio: AudioConfig,
}

/// Loudness conversion parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    /// Gain applied to the linear amplitude before taking the logarithm
    pub reference_gain: f32,
    /// Offset added to the log value; anchors the reading to a specific microphone gain
    pub calibration_offset: f32,
    /// Raw power strictly below this (dBFS) is treated as silence
    pub silence_floor_db: f32,
    /// Loudness that maps to a full progress indicator
    pub progress_ceiling: f32,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            reference_gain: 20.0,
            calibration_offset: 62.0,
            silence_floor_db: -80.0,
            progress_ceiling: 105.0,
        }
    }
}

/// Inclusive lower bound of each severity band, in dB
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandConfig {
    pub quiet: f32,
    pub normal: f32,
    pub loud: f32,
    pub too_loud: f32,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            quiet: 0.0,
            normal: 40.0,
            loud: 80.0,
            too_loud: 100.0,
        }
    }
}

/// Sampling loop cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Timer period in milliseconds
    pub interval_ms: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { interval_ms: 800 }
    }
}

impl SamplingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Audio input configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Capacity of the ring buffer carrying per-block power from the audio thread
    pub ring_capacity: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            ring_capacity: DEFAULT_RING_CAPACITY,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration, or the defaults if the file is missing,
    /// unreadable or not valid JSON. Failures are logged, not returned.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::info!(
                    "[Config] No config file at {:?}, using defaults",
                    path.as_ref()
                );
                Self::default()
            }
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default location
    pub fn load() -> Self {
        Self::load_from_file("assets/meter_config.json")
    }

    /// Check that the calibration constants and band bounds are usable.
    pub fn validate(&self) -> Result<(), ClassificationError> {
        let invalid = |reason: &str| {
            Err(ClassificationError::InvalidConfig {
                reason: reason.to_string(),
            })
        };

        if self.meter.reference_gain.is_nan() || self.meter.reference_gain <= 0.0 {
            return invalid("reference_gain must be positive");
        }
        if self.meter.progress_ceiling.is_nan() || self.meter.progress_ceiling <= 0.0 {
            return invalid("progress_ceiling must be positive");
        }
        if !self.meter.calibration_offset.is_finite() || !self.meter.silence_floor_db.is_finite()
        {
            return invalid("calibration_offset and silence_floor_db must be finite");
        }
        if self.sampling.interval_ms == 0 {
            return invalid("interval_ms must be greater than 0");
        }
        if self.audio.ring_capacity == 0 {
            return invalid("ring_capacity must be greater than 0");
        }

        let b = &self.bands;
        let ascending = b.quiet.is_finite()
            && b.quiet < b.normal
            && b.normal < b.loud
            && b.loud < b.too_loud
            && b.too_loud.is_finite();
        if !ascending {
            return invalid("band bounds must be finite and strictly ascending");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.meter.reference_gain, 20.0);
        assert_eq!(config.meter.calibration_offset, 62.0);
        assert_eq!(config.meter.silence_floor_db, -80.0);
        assert_eq!(config.meter.progress_ceiling, 105.0);
        assert_eq!(config.bands.normal, 40.0);
        assert_eq!(config.sampling.interval(), Duration::from_millis(800));
        assert_eq!(config.audio.ring_capacity, DEFAULT_RING_CAPACITY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{ "meter": { "calibration_offset": 70.0 } }"#).unwrap();
        assert_eq!(parsed.meter.calibration_offset, 70.0);
        assert_eq!(parsed.meter.reference_gain, 20.0);
        assert_eq!(parsed.bands, BandConfig::default());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_file("/definitely/not/here/meter_config.json");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_bad_json_falls_back_to_defaults() {
        let path = std::env::temp_dir().join(format!("simple-db-bad-{}.json", std::process::id()));
        fs::write(&path, "{ not json").unwrap();
        let config = AppConfig::load_from_file(&path);
        let _ = fs::remove_file(&path);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_validate_rejects_unordered_bands() {
        let mut config = AppConfig::default();
        config.bands.loud = 30.0;
        assert!(matches!(
            config.validate(),
            Err(ClassificationError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_meter_values() {
        let mut config = AppConfig::default();
        config.meter.reference_gain = 0.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.meter.progress_ceiling = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.sampling.interval_ms = 0;
        assert!(config.validate().is_err());
    }
}
