// Severity bands - four contiguous loudness categories
//
// Each band covers [lower, next lower); the last band is open-ended. Values
// below the first lower bound (or NaN) are left unclassified.

use serde::{Deserialize, Serialize};

use crate::config::BandConfig;

/// SeverityBand represents the loudness category of one reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityBand {
    Quiet,
    Normal,
    Loud,
    TooLoud,
}

impl SeverityBand {
    /// All bands, quietest first.
    pub const ALL: [SeverityBand; 4] = [
        SeverityBand::Quiet,
        SeverityBand::Normal,
        SeverityBand::Loud,
        SeverityBand::TooLoud,
    ];

    /// Short lowercase description shown after "Sounds:".
    pub fn label(self) -> &'static str {
        match self {
            SeverityBand::Quiet => "quiet",
            SeverityBand::Normal => "normal",
            SeverityBand::Loud => "loud",
            SeverityBand::TooLoud => "too loud",
        }
    }

    /// Caption text, e.g. `Sounds: too loud`.
    pub fn caption(self) -> String {
        format!("Sounds: {}", self.label())
    }
}

impl std::fmt::Display for SeverityBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Lookup table from loudness to [`SeverityBand`]
#[derive(Debug, Clone, PartialEq)]
pub struct BandTable {
    /// Inclusive lower bounds, ascending, in [`SeverityBand::ALL`] order
    lower_bounds: [f32; 4],
}

impl BandTable {
    pub fn new(config: &BandConfig) -> Self {
        Self {
            lower_bounds: [config.quiet, config.normal, config.loud, config.too_loud],
        }
    }

    /// Band containing `loudness`, or `None` when below every band or NaN.
    pub fn band_for(&self, loudness: f32) -> Option<SeverityBand> {
        SeverityBand::ALL
            .iter()
            .zip(self.lower_bounds.iter())
            .rev()
            .find(|(_, lower)| loudness >= **lower)
            .map(|(&band, _)| band)
    }

    /// `(band, lower, upper)` triples; `upper` is `None` for the open-ended band.
    pub fn ranges(&self) -> Vec<(SeverityBand, f32, Option<f32>)> {
        SeverityBand::ALL
            .iter()
            .enumerate()
            .map(|(i, &band)| (band, self.lower_bounds[i], self.lower_bounds.get(i + 1).copied()))
            .collect()
    }
}

impl Default for BandTable {
    fn default() -> Self {
        Self::new(&BandConfig::default())
    }
}
