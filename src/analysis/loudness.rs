// Loudness conversion - dBFS power sample to calibrated dB reading
//
// The conversion is a simplified approximation of an A-weighted level: the
// logarithmic power is turned back into a linear amplitude ratio, scaled by a
// reference gain, and re-expressed in dB with a calibration offset. It does no
// frequency weighting.

use crate::config::MeterConfig;

/// Lowest power an input stream reports, in dBFS.
pub const MIN_POWER_DBFS: f32 = -160.0;

/// Convert one raw power sample (dBFS) into a calibrated loudness value.
///
/// `loudness = 20 * log10(10^(raw / 20) * reference_gain) + calibration_offset`
///
/// Does not apply the silence floor; see [`crate::analysis::LoudnessClassifier`].
pub fn power_to_loudness(raw_power_db: f32, meter: &MeterConfig) -> f32 {
    let linear = 10.0_f32.powf(raw_power_db / 20.0);
    20.0 * (linear * meter.reference_gain).log10() + meter.calibration_offset
}

/// Rescale a loudness value into the [0, 1] travel of a progress indicator.
///
/// Values above `progress_ceiling` saturate at 1.0. NaN maps to 0.0.
pub fn normalized_progress(loudness: f32, progress_ceiling: f32) -> f32 {
    let progress = loudness / progress_ceiling;
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    }
}

/// Convert a mean-square amplitude into dBFS, clamped to `[MIN_POWER_DBFS, 0]`.
pub fn mean_square_to_dbfs(mean_square: f64) -> f32 {
    if mean_square.is_nan() || mean_square <= 0.0 {
        return MIN_POWER_DBFS;
    }
    let db = 10.0 * mean_square.log10();
    (db as f32).clamp(MIN_POWER_DBFS, 0.0)
}
