// Simple dB - microphone loudness meter core
// Fixed-cadence sampling, calibrated dB conversion and severity classification

// Module declarations
pub mod analysis;
pub mod audio;
pub mod config;
pub mod display;
pub mod error;
pub mod meter;
pub mod sampler;
pub mod telemetry;

// Re-exports for convenience
pub use analysis::{DisplayState, LoudnessClassifier, SeverityBand};
pub use config::AppConfig;
pub use display::{DisplaySink, Palette};
pub use error::{ClassificationError, ErrorCode, SamplerError};
pub use meter::{SamplingLoop, SessionReport, ShutdownToken, StopReason, TickOutcome};
pub use sampler::Sampler;

/// Classify one raw power reading with the default calibration.
///
/// Shorthand for `LoudnessClassifier::default().classify(raw_power_db)`.
pub fn classify(raw_power_db: f32) -> Result<DisplayState, ClassificationError> {
    LoudnessClassifier::default().classify(raw_power_db)
}
