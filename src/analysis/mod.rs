// Analysis module - loudness conversion and severity classification
//
// Pipeline for one tick: raw power (dBFS) → loudness (dB) → SeverityBand
// plus normalized progress. Everything here is pure; the sampling loop in
// `meter` owns the timing and side effects.

pub mod band;
pub mod classifier;
pub mod loudness;

pub use band::{BandTable, SeverityBand};
pub use classifier::{DisplayState, LoudnessClassifier};
pub use loudness::{mean_square_to_dbfs, normalized_progress, power_to_loudness, MIN_POWER_DBFS};
