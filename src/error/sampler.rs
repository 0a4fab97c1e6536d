// Sampler error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Sampler error code constants
///
/// Single source of truth for the numeric codes reported by [`SamplerError`].
///
/// Error code range: 1001-1008
pub struct SamplerErrorCodes {}

impl SamplerErrorCodes {
    /// Microphone access was not granted
    pub const PERMISSION_DENIED: i32 = 1001;

    /// No input device is available on this host
    pub const NO_INPUT_DEVICE: i32 = 1002;

    /// Failed to open the input stream
    pub const STREAM_OPEN_FAILED: i32 = 1003;

    /// Hardware or I/O error while sampling
    pub const HARDWARE_ERROR: i32 = 1004;

    /// No fresh power reading is available for this tick
    pub const NOT_READY: i32 = 1005;

    /// Sampler has not been started
    pub const NOT_RUNNING: i32 = 1006;

    /// Sampler was already started
    pub const ALREADY_RUNNING: i32 = 1007;

    /// Replay source has no more samples
    pub const EXHAUSTED: i32 = 1008;
}

/// Log a sampler error with structured context
///
/// Logs the numeric code, the component and the message so that log
/// scrapers can filter on `code=`.
pub fn log_sampler_error(err: &SamplerError, context: &str) {
    error!(
        "Sampler error in {}: code={}, component=Sampler, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Sampler-related errors
///
/// These cover authorization, device access and the per-tick polling of
/// the current input power.
///
/// Error code ranges: 1001-1008
#[derive(Debug, Clone, PartialEq)]
pub enum SamplerError {
    /// Microphone permission denied
    PermissionDenied,

    /// No default input device
    NoInputDevice,

    /// Failed to open audio stream
    StreamOpenFailed { reason: String },

    /// Hardware error occurred
    HardwareError { details: String },

    /// No reading available yet; the tick should be skipped
    NotReady,

    /// Sampler not started
    NotRunning,

    /// Sampler already started
    AlreadyRunning,

    /// Replay source drained
    Exhausted,
}

impl SamplerError {
    /// Whether this error means "try again next tick" rather than a failure.
    pub fn is_transient(&self) -> bool {
        matches!(self, SamplerError::NotReady)
    }

    /// Whether this error means the sampler cannot run at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            SamplerError::PermissionDenied
                | SamplerError::NoInputDevice
                | SamplerError::StreamOpenFailed { .. }
        )
    }
}

impl ErrorCode for SamplerError {
    fn code(&self) -> i32 {
        match self {
            SamplerError::PermissionDenied => SamplerErrorCodes::PERMISSION_DENIED,
            SamplerError::NoInputDevice => SamplerErrorCodes::NO_INPUT_DEVICE,
            SamplerError::StreamOpenFailed { .. } => SamplerErrorCodes::STREAM_OPEN_FAILED,
            SamplerError::HardwareError { .. } => SamplerErrorCodes::HARDWARE_ERROR,
            SamplerError::NotReady => SamplerErrorCodes::NOT_READY,
            SamplerError::NotRunning => SamplerErrorCodes::NOT_RUNNING,
            SamplerError::AlreadyRunning => SamplerErrorCodes::ALREADY_RUNNING,
            SamplerError::Exhausted => SamplerErrorCodes::EXHAUSTED,
        }
    }

    fn message(&self) -> String {
        match self {
            SamplerError::PermissionDenied => {
                "Microphone permission denied. Please allow microphone access in system settings."
                    .to_string()
            }
            SamplerError::NoInputDevice => "No default input device found".to_string(),
            SamplerError::StreamOpenFailed { reason } => {
                format!("Failed to open audio stream: {}", reason)
            }
            SamplerError::HardwareError { details } => {
                format!("Hardware error: {}", details)
            }
            SamplerError::NotReady => "No power reading available for this tick".to_string(),
            SamplerError::NotRunning => "Sampler not running. Call start() first.".to_string(),
            SamplerError::AlreadyRunning => {
                "Sampler already running. Call stop() first.".to_string()
            }
            SamplerError::Exhausted => "Sample source exhausted".to_string(),
        }
    }
}

impl fmt::Display for SamplerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SamplerError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for SamplerError {}

impl From<std::io::Error> for SamplerError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => SamplerError::PermissionDenied,
            _ => SamplerError::HardwareError {
                details: err.to_string(),
            },
        }
    }
}

impl From<hound::Error> for SamplerError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(io) => io.into(),
            other => SamplerError::StreamOpenFailed {
                reason: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampler_error_codes() {
        assert_eq!(
            SamplerError::PermissionDenied.code(),
            SamplerErrorCodes::PERMISSION_DENIED
        );
        assert_eq!(
            SamplerError::NoInputDevice.code(),
            SamplerErrorCodes::NO_INPUT_DEVICE
        );
        assert_eq!(
            SamplerError::StreamOpenFailed {
                reason: "test".to_string()
            }
            .code(),
            SamplerErrorCodes::STREAM_OPEN_FAILED
        );
        assert_eq!(
            SamplerError::HardwareError {
                details: "test".to_string()
            }
            .code(),
            SamplerErrorCodes::HARDWARE_ERROR
        );
        assert_eq!(SamplerError::NotReady.code(), SamplerErrorCodes::NOT_READY);
        assert_eq!(SamplerError::NotRunning.code(), SamplerErrorCodes::NOT_RUNNING);
        assert_eq!(
            SamplerError::AlreadyRunning.code(),
            SamplerErrorCodes::ALREADY_RUNNING
        );
        assert_eq!(SamplerError::Exhausted.code(), SamplerErrorCodes::EXHAUSTED);
    }

    #[test]
    fn test_sampler_error_messages() {
        let err = SamplerError::PermissionDenied;
        assert!(err.message().contains("permission denied"));

        let err = SamplerError::HardwareError {
            details: "test error".to_string(),
        };
        assert_eq!(err.message(), "Hardware error: test error");

        let err = SamplerError::NotRunning;
        assert!(err.message().contains("not running"));
    }

    #[test]
    fn test_sampler_error_display() {
        let err = SamplerError::NoInputDevice;
        let display = format!("{}", err);
        assert!(display.contains("SamplerError"));
        assert!(display.contains(&err.code().to_string()));
    }

    #[test]
    fn test_transient_and_unavailable() {
        assert!(SamplerError::NotReady.is_transient());
        assert!(!SamplerError::Exhausted.is_transient());
        assert!(SamplerError::PermissionDenied.is_unavailable());
        assert!(SamplerError::NoInputDevice.is_unavailable());
        assert!(!SamplerError::NotReady.is_unavailable());
    }

    #[test]
    fn test_missing_device_is_unavailable_not_denied() {
        let err = SamplerError::NoInputDevice;
        assert!(err.is_unavailable());
        assert!(!err.is_transient());
        assert_eq!(err.code(), SamplerErrorCodes::NO_INPUT_DEVICE);
        assert!(!err.message().contains("permission"));

        let err = SamplerError::StreamOpenFailed {
            reason: "device busy".to_string(),
        };
        assert!(err.is_unavailable());
        assert_ne!(err.code(), SamplerErrorCodes::PERMISSION_DENIED);
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::other("test io error");
        match SamplerError::from(io_err) {
            SamplerError::HardwareError { details } => {
                assert!(details.contains("test io error"));
            }
            other => panic!("Expected HardwareError, got {:?}", other),
        }

        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        assert_eq!(SamplerError::from(denied), SamplerError::PermissionDenied);
    }
}
