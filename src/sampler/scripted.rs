use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::SamplerError;

use super::Sampler;

/// One scripted poll result
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    /// Deliver this power reading (dBFS)
    Power(f32),
    /// Report no reading for this tick
    NotReady,
    /// Fail this poll with the given error
    Fail(SamplerError),
}

impl From<f32> for ScriptStep {
    fn from(power: f32) -> Self {
        ScriptStep::Power(power)
    }
}

/// Deterministic sampler for tests and CLI simulation.
///
/// Plays back a fixed list of steps without real audio I/O and goes
/// inactive once the script runs out. `stop()` calls are counted so tests
/// can check that teardown ran.
pub struct ScriptedSampler {
    steps: VecDeque<ScriptStep>,
    authorized: bool,
    start_error: Option<SamplerError>,
    running: bool,
    stop_calls: Arc<AtomicUsize>,
}

impl ScriptedSampler {
    pub fn new<I, T>(steps: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ScriptStep>,
    {
        Self {
            steps: steps.into_iter().map(Into::into).collect(),
            authorized: true,
            start_error: None,
            running: false,
            stop_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Simulate a denied microphone permission.
    pub fn denied(mut self) -> Self {
        self.authorized = false;
        self
    }

    /// Make `start()` fail with `err`.
    pub fn failing_start(mut self, err: SamplerError) -> Self {
        self.start_error = Some(err);
        self
    }

    /// Shared counter of `stop()` calls; stays valid after the sampler is moved.
    pub fn stop_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.stop_calls)
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl Sampler for ScriptedSampler {
    fn is_authorized(&self) -> bool {
        self.authorized
    }

    fn start(&mut self) -> Result<(), SamplerError> {
        if let Some(err) = self.start_error.clone() {
            return Err(err);
        }
        if self.running {
            return Err(SamplerError::AlreadyRunning);
        }
        self.running = true;
        Ok(())
    }

    fn current_power(&mut self) -> Result<f32, SamplerError> {
        if !self.running {
            return Err(SamplerError::NotRunning);
        }
        match self.steps.pop_front() {
            Some(ScriptStep::Power(power)) => Ok(power),
            Some(ScriptStep::NotReady) => Err(SamplerError::NotReady),
            Some(ScriptStep::Fail(err)) => Err(err),
            None => Err(SamplerError::Exhausted),
        }
    }

    fn is_active(&self) -> bool {
        self.running && !self.steps.is_empty()
    }

    fn stop(&mut self) -> Result<(), SamplerError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.running = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plays_back_steps_in_order() {
        let mut sampler = ScriptedSampler::new(vec![
            ScriptStep::Power(-20.0),
            ScriptStep::NotReady,
            ScriptStep::Fail(SamplerError::HardwareError {
                details: "glitch".to_string(),
            }),
        ]);
        sampler.start().unwrap();

        assert_eq!(sampler.current_power(), Ok(-20.0));
        assert!(sampler.is_active());
        assert_eq!(sampler.current_power(), Err(SamplerError::NotReady));
        assert!(matches!(
            sampler.current_power(),
            Err(SamplerError::HardwareError { .. })
        ));
        assert!(!sampler.is_active());
        assert_eq!(sampler.current_power(), Err(SamplerError::Exhausted));
    }

    #[test]
    fn test_from_f32_steps() {
        let sampler = ScriptedSampler::new([-10.0_f32, 0.0]);
        assert_eq!(sampler.remaining(), 2);
    }

    #[test]
    fn test_denied_and_failing_start() {
        let sampler = ScriptedSampler::new([-10.0_f32]).denied();
        assert!(!sampler.is_authorized());

        let mut sampler =
            ScriptedSampler::new([-10.0_f32]).failing_start(SamplerError::NoInputDevice);
        assert_eq!(sampler.start(), Err(SamplerError::NoInputDevice));
    }

    #[test]
    fn test_stop_counter() {
        let mut sampler = ScriptedSampler::new([-10.0_f32]);
        let stops = sampler.stop_counter();
        sampler.start().unwrap();
        sampler.stop().unwrap();
        sampler.stop().unwrap();
        assert_eq!(stops.load(Ordering::SeqCst), 2);
        assert_eq!(sampler.current_power(), Err(SamplerError::NotRunning));
    }
}
