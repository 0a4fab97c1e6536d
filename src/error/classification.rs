// Classification error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Classification error code constants
///
/// Error code range: 2001-2002
pub struct ClassificationErrorCodes {}

impl ClassificationErrorCodes {
    /// Loudness value fell outside every configured band
    pub const OUT_OF_RANGE: i32 = 2001;

    /// Calibration constants or band bounds are unusable
    pub const INVALID_CONFIG: i32 = 2002;
}

/// Log a classification error with structured context
pub fn log_classification_error(err: &ClassificationError, context: &str) {
    error!(
        "Classification error in {}: code={}, component=LoudnessClassifier, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Classification-related errors
///
/// `OutOfRange` is only reachable with misconfigured calibration constants;
/// callers keep the previous display state when they see it.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassificationError {
    /// Loudness is below the lowest band bound or not a number
    OutOfRange { loudness: f32 },

    /// Configuration rejected by validation
    InvalidConfig { reason: String },
}

impl ErrorCode for ClassificationError {
    fn code(&self) -> i32 {
        match self {
            ClassificationError::OutOfRange { .. } => ClassificationErrorCodes::OUT_OF_RANGE,
            ClassificationError::InvalidConfig { .. } => ClassificationErrorCodes::INVALID_CONFIG,
        }
    }

    fn message(&self) -> String {
        match self {
            ClassificationError::OutOfRange { loudness } => {
                format!("Loudness {:.2} dB is outside all severity bands", loudness)
            }
            ClassificationError::InvalidConfig { reason } => {
                format!("Invalid meter configuration: {}", reason)
            }
        }
    }
}

impl fmt::Display for ClassificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ClassificationError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ClassificationError {}
