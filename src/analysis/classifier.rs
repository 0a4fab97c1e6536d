// Classifier - calibrated loudness reading and severity band for one sample
//
// This module implements the pure per-tick transformation of the meter:
//
// 1. Floor check: power strictly below the silence floor is absolute silence
// 2. Conversion: dBFS power -> calibrated loudness (see `loudness`)
// 3. Classification: loudness -> SeverityBand via the band table
// 4. Progress: loudness rescaled to [0, 1] for the radial indicator
//
// The classifier holds only immutable configuration, so it can be cloned into
// any number of loops or called concurrently.

use serde::{Deserialize, Serialize};

use crate::analysis::band::{BandTable, SeverityBand};
use crate::analysis::loudness::{normalized_progress, power_to_loudness};
use crate::config::{AppConfig, BandConfig, MeterConfig};
use crate::error::ClassificationError;

/// DisplayState is the output of one tick, handed to a display sink
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayState {
    /// Calibrated loudness in dB
    pub loudness: f32,
    /// Severity category of `loudness`
    pub band: SeverityBand,
    /// Progress indicator fraction, always within [0, 1]
    pub progress: f32,
}

impl DisplayState {
    /// Absolute silence: zero loudness, quiet, empty indicator.
    pub fn silence() -> Self {
        Self {
            loudness: 0.0,
            band: SeverityBand::Quiet,
            progress: 0.0,
        }
    }

    /// Numeric label text, e.g. `68.0 dB`.
    pub fn value_text(&self) -> String {
        format!("{:.1} dB", self.loudness)
    }
}

/// LoudnessClassifier converts raw power samples into [`DisplayState`]s
///
/// Uses the calibration constants from [`MeterConfig`] and the band bounds
/// from [`BandConfig`]. Construction does not validate; use
/// [`LoudnessClassifier::from_config`] to reject unusable configurations.
#[derive(Debug, Clone, PartialEq)]
pub struct LoudnessClassifier {
    meter: MeterConfig,
    bands: BandTable,
}

impl LoudnessClassifier {
    pub fn new(meter: MeterConfig, bands: &BandConfig) -> Self {
        Self {
            meter,
            bands: BandTable::new(bands),
        }
    }

    /// Build a classifier from a validated application config.
    pub fn from_config(config: &AppConfig) -> Result<Self, ClassificationError> {
        config.validate()?;
        Ok(Self::new(config.meter.clone(), &config.bands))
    }

    pub fn bands(&self) -> &BandTable {
        &self.bands
    }

    /// Classify one raw power sample
    ///
    /// # Arguments
    /// * `raw_power_db` - Average input power for this tick, in dBFS
    ///
    /// # Returns
    /// * `Ok(DisplayState)` - Loudness, band and progress for the display
    /// * `Err(ClassificationError::OutOfRange)` - Loudness below every band;
    ///   only reachable with misconfigured calibration constants
    pub fn classify(&self, raw_power_db: f32) -> Result<DisplayState, ClassificationError> {
        // Strict comparison: the floor value itself goes through the formula.
        if raw_power_db < self.meter.silence_floor_db {
            return Ok(DisplayState::silence());
        }

        let loudness = power_to_loudness(raw_power_db, &self.meter);
        let band = self
            .bands
            .band_for(loudness)
            .ok_or(ClassificationError::OutOfRange { loudness })?;
        let progress = normalized_progress(loudness, self.meter.progress_ceiling);

        Ok(DisplayState {
            loudness,
            band,
            progress,
        })
    }
}

impl Default for LoudnessClassifier {
    fn default() -> Self {
        Self::new(MeterConfig::default(), &BandConfig::default())
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
