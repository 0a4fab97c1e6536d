//! WAV replay sampler.
//!
//! Replays a recording through the meter at the loop cadence: every poll
//! consumes one tick's worth of frames (`interval * sample_rate`) and
//! reports their power. The sampler goes inactive once the file is drained.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Duration;

use hound::{SampleFormat, WavReader};

use crate::analysis::mean_square_to_dbfs;
use crate::error::SamplerError;

use super::Sampler;

/// Sampler reading from a WAV stream (first channel only)
pub struct WavSampler<R: Read> {
    reader: WavReader<R>,
    frames_per_tick: usize,
    started: bool,
    exhausted: bool,
}

impl WavSampler<BufReader<File>> {
    /// Open a WAV file for replay at the given tick interval.
    pub fn open<P: AsRef<Path>>(path: P, interval: Duration) -> Result<Self, SamplerError> {
        let reader = WavReader::open(&path)?;
        log::info!(
            "[WavSampler] Opened {:?} ({} Hz, {} channel(s), {} frames)",
            path.as_ref(),
            reader.spec().sample_rate,
            reader.spec().channels,
            reader.duration()
        );
        Ok(Self::new(reader, interval))
    }
}

impl<R: Read> WavSampler<R> {
    pub fn new(reader: WavReader<R>, interval: Duration) -> Self {
        let sample_rate = reader.spec().sample_rate as u128;
        let frames_per_tick = ((sample_rate * interval.as_millis()) / 1000).max(1) as usize;
        Self {
            reader,
            frames_per_tick,
            started: false,
            exhausted: false,
        }
    }

    pub fn frames_per_tick(&self) -> usize {
        self.frames_per_tick
    }

    /// Mean square of the next tick's frames, or `None` at end of stream.
    fn read_tick(&mut self) -> Result<Option<f64>, SamplerError> {
        let spec = self.reader.spec();
        let channels = (spec.channels as usize).max(1);
        let wanted = self.frames_per_tick * channels;

        let mut sum_squares = 0.0_f64;
        let mut frames = 0_usize;

        match spec.sample_format {
            SampleFormat::Float => {
                for (i, sample) in self.reader.samples::<f32>().take(wanted).enumerate() {
                    let sample = sample?;
                    if i % channels == 0 {
                        sum_squares += (sample as f64).powi(2);
                        frames += 1;
                    }
                }
            }
            SampleFormat::Int => {
                let full_scale = (1_i64 << (spec.bits_per_sample.max(1) - 1)) as f64;
                for (i, sample) in self.reader.samples::<i32>().take(wanted).enumerate() {
                    let sample = sample?;
                    if i % channels == 0 {
                        sum_squares += (sample as f64 / full_scale).powi(2);
                        frames += 1;
                    }
                }
            }
        }

        if frames == 0 {
            Ok(None)
        } else {
            Ok(Some(sum_squares / frames as f64))
        }
    }
}

impl<R: Read> Sampler for WavSampler<R> {
    fn is_authorized(&self) -> bool {
        true
    }

    fn start(&mut self) -> Result<(), SamplerError> {
        if self.started {
            return Err(SamplerError::AlreadyRunning);
        }
        self.started = true;
        Ok(())
    }

    fn current_power(&mut self) -> Result<f32, SamplerError> {
        if !self.started {
            return Err(SamplerError::NotRunning);
        }
        if self.exhausted {
            return Err(SamplerError::Exhausted);
        }

        match self.read_tick() {
            Ok(Some(mean_square)) => Ok(mean_square_to_dbfs(mean_square)),
            Ok(None) => {
                self.exhausted = true;
                Err(SamplerError::Exhausted)
            }
            Err(err) => {
                self.exhausted = true;
                Err(err)
            }
        }
    }

    fn is_active(&self) -> bool {
        self.started && !self.exhausted
    }

    fn stop(&mut self) -> Result<(), SamplerError> {
        self.started = false;
        Ok(())
    }
}
