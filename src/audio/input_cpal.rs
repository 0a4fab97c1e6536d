use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::power_ring::{BlockPower, PowerProducer};
use crate::error::SamplerError;

/// Running microphone input stream feeding a [`PowerProducer`]
pub struct InputStream {
    /// Keeps the cpal stream alive; dropping it stops capture
    stream: cpal::Stream,
    /// Sample rate in Hz
    sample_rate: u32,
    /// Set by the error callback when the stream dies (device removed, access revoked)
    failed: Arc<AtomicBool>,
}

impl InputStream {
    /// Open and start the default input device.
    pub fn open_default(producer: PowerProducer) -> Result<Self, SamplerError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(SamplerError::NoInputDevice)?;

        let config = device
            .default_input_config()
            .map_err(|e| SamplerError::StreamOpenFailed {
                reason: format!("Failed to get default input config: {:?}", e),
            })?;

        let stream_config: cpal::StreamConfig = config.clone().into();
        let channels_count = (stream_config.channels as usize).max(1);
        let sample_rate = stream_config.sample_rate.0;

        let failed = Arc::new(AtomicBool::new(false));
        let failed_cb = Arc::clone(&failed);
        let err_fn = move |err| {
            log::error!("[InputStream] Input stream error: {}", err);
            failed_cb.store(true, Ordering::SeqCst);
        };

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => {
                let mut producer = producer;
                device.build_input_stream(
                    &stream_config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        // De-interleave: take first channel
                        let block = BlockPower::from_samples(
                            data.iter().step_by(channels_count).copied(),
                        );
                        producer.push(block);
                    },
                    err_fn,
                    None,
                )
            }
            cpal::SampleFormat::I16 => {
                let mut producer = producer;
                device.build_input_stream(
                    &stream_config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        let block = BlockPower::from_samples(
                            data.iter()
                                .step_by(channels_count)
                                .map(|&s| s as f32 / 32_768.0),
                        );
                        producer.push(block);
                    },
                    err_fn,
                    None,
                )
            }
            other => {
                return Err(SamplerError::StreamOpenFailed {
                    reason: format!("Unsupported input sample format: {:?}", other),
                })
            }
        }
        .map_err(map_build_error)?;

        stream.play().map_err(|e| SamplerError::HardwareError {
            details: format!("Input start failed: {}", e),
        })?;

        log::info!(
            "[InputStream] Capturing {} channel(s) at {} Hz",
            channels_count,
            sample_rate
        );

        Ok(Self {
            stream,
            sample_rate,
            failed,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    /// Pause capture and release the device.
    pub fn close(self) -> Result<(), SamplerError> {
        let result = self.stream.pause().map_err(|e| SamplerError::HardwareError {
            details: format!("Input pause failed: {}", e),
        });
        drop(self.stream);
        result
    }
}

fn map_build_error(err: cpal::BuildStreamError) -> SamplerError {
    match err {
        cpal::BuildStreamError::DeviceNotAvailable => SamplerError::NoInputDevice,
        other => SamplerError::StreamOpenFailed {
            reason: format!("{:?}", other),
        },
    }
}
