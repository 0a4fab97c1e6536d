//! Microphone sampler for desktop platforms (Linux, macOS, Windows)
//!
//! Wraps the cpal [`InputStream`]: the audio callback reduces each block to
//! its power, and every poll averages the blocks received since the previous
//! poll into one dBFS reading.

use crate::analysis::mean_square_to_dbfs;
use crate::audio::{power_ring, InputStream, PowerConsumer};
use crate::config::AudioConfig;
use crate::error::SamplerError;

use super::Sampler;

/// Default-input-device sampler backed by cpal
pub struct CpalSampler {
    config: AudioConfig,
    stream: Option<InputStream>,
    consumer: Option<PowerConsumer>,
}

impl CpalSampler {
    pub fn new(config: AudioConfig) -> Self {
        Self {
            config,
            stream: None,
            consumer: None,
        }
    }
}

impl Sampler for CpalSampler {
    /// Desktop hosts have no separate grant step; access is refused when the
    /// stream is opened, and a missing device surfaces from `start()` as
    /// `NoInputDevice`.
    fn is_authorized(&self) -> bool {
        true
    }

    fn start(&mut self) -> Result<(), SamplerError> {
        if self.stream.is_some() {
            return Err(SamplerError::AlreadyRunning);
        }

        let (producer, consumer) = power_ring(self.config.ring_capacity.max(1));
        let stream = InputStream::open_default(producer)?;
        log::info!(
            "[CpalSampler] Started (ring capacity {}, {} Hz)",
            self.config.ring_capacity,
            stream.sample_rate()
        );

        self.stream = Some(stream);
        self.consumer = Some(consumer);
        Ok(())
    }

    fn current_power(&mut self) -> Result<f32, SamplerError> {
        let stream = self.stream.as_ref().ok_or(SamplerError::NotRunning)?;
        if stream.has_failed() {
            return Err(SamplerError::HardwareError {
                details: "input stream stopped delivering audio".to_string(),
            });
        }

        let consumer = self.consumer.as_mut().ok_or(SamplerError::NotRunning)?;
        let dropped = consumer.dropped_blocks();
        if dropped > 0 {
            log::debug!("[CpalSampler] {} blocks dropped so far (ring full)", dropped);
        }

        consumer
            .drain_mean_square()
            .map(mean_square_to_dbfs)
            .ok_or(SamplerError::NotReady)
    }

    fn is_active(&self) -> bool {
        self.stream
            .as_ref()
            .map(|stream| !stream.has_failed())
            .unwrap_or(false)
    }

    fn stop(&mut self) -> Result<(), SamplerError> {
        self.consumer = None;
        match self.stream.take() {
            Some(stream) => stream.close(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_defers_to_start() {
        // Device presence is checked when the stream opens, not here.
        let sampler = CpalSampler::new(AudioConfig::default());
        assert!(sampler.is_authorized());
        assert!(!sampler.is_active());
    }

    #[test]
    fn test_poll_before_start_is_not_running() {
        let mut sampler = CpalSampler::new(AudioConfig::default());
        assert_eq!(sampler.current_power(), Err(SamplerError::NotRunning));
        assert_eq!(sampler.stop(), Ok(()));
    }
}
