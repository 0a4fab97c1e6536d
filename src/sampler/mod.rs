//! Sampler abstractions for the meter loop.
//!
//! A sampler is the meter's only source of input: once authorized and
//! started it can be polled for the average input power of the last tick,
//! in dBFS. Samplers are owned exclusively by one sampling loop and used
//! from a single thread, so the trait carries no `Send` bound (the cpal
//! stream behind the microphone sampler is not `Send` on every platform).

use crate::error::SamplerError;

/// Trait implemented by every input source the meter can poll.
pub trait Sampler {
    /// Whether the platform has granted access to the source.
    fn is_authorized(&self) -> bool;

    /// Acquire the source. A failure here ends the loop before the first tick.
    fn start(&mut self) -> Result<(), SamplerError>;

    /// Average power since the previous poll, in dBFS (≤ 0).
    ///
    /// `Err(SamplerError::NotReady)` means "skip this tick".
    fn current_power(&mut self) -> Result<f32, SamplerError>;

    /// Whether the source is still delivering readings.
    fn is_active(&self) -> bool;

    /// Release the source. Must be safe to call more than once.
    fn stop(&mut self) -> Result<(), SamplerError>;
}

impl<S: Sampler + ?Sized> Sampler for Box<S> {
    fn is_authorized(&self) -> bool {
        (**self).is_authorized()
    }

    fn start(&mut self) -> Result<(), SamplerError> {
        (**self).start()
    }

    fn current_power(&mut self) -> Result<f32, SamplerError> {
        (**self).current_power()
    }

    fn is_active(&self) -> bool {
        (**self).is_active()
    }

    fn stop(&mut self) -> Result<(), SamplerError> {
        (**self).stop()
    }
}

#[cfg(not(target_os = "android"))]
mod cpal;
#[cfg(not(target_os = "android"))]
pub use self::cpal::CpalSampler;

mod scripted;
mod wav;

pub use scripted::{ScriptStep, ScriptedSampler};
pub use wav::WavSampler;
