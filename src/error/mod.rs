// Error types for the loudness meter
//
// This module defines custom error types for sampler and classification
// operations, with stable numeric codes for scripted callers and exit codes.

mod classification;
mod sampler;

pub use classification::{log_classification_error, ClassificationError, ClassificationErrorCodes};
pub use sampler::{log_sampler_error, SamplerError, SamplerErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the library and CLI boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
