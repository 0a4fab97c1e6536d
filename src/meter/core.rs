//! SamplingLoop: the meter's fixed-cadence orchestration layer.
//!
//! Each tick polls the sampler once, classifies the reading and forwards the
//! result to the display sink. The loop carries no reading state between
//! ticks; it owns the sampler exclusively and releases it on every exit path.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::analysis::{DisplayState, LoudnessClassifier};
use crate::display::DisplaySink;
use crate::error::{
    log_classification_error, log_sampler_error, ClassificationError, ErrorCode, SamplerError,
};
use crate::sampler::Sampler;
use crate::telemetry::{MeterEvent, SkipReason, TelemetryCollector};

use super::ShutdownToken;

/// Result of a single tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Reading classified and handed to the sink
    Rendered(DisplayState),
    /// No reading this tick; the display keeps its previous value
    Skipped(SamplerError),
    /// Reading could not be classified; the display keeps its previous value
    Retained(ClassificationError),
    /// Reading classified but the sink failed to show it
    DisplayFailed(DisplayState, io::ErrorKind),
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Cancelled,
    SamplerInactive,
    TickLimit,
    /// The display's reader went away (broken pipe)
    DisplayClosed,
}

/// Summary of a finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub ticks: u64,
    pub rendered: u64,
    pub skipped: u64,
    pub stop_reason: StopReason,
}

/// Fixed-cadence sampling loop over one sampler and one display sink.
pub struct SamplingLoop<S: Sampler, D: DisplaySink> {
    sampler: S,
    sink: D,
    classifier: LoudnessClassifier,
    interval: Duration,
    max_ticks: Option<u64>,
    telemetry: Option<Arc<TelemetryCollector>>,
    started: bool,
}

impl<S: Sampler, D: DisplaySink> SamplingLoop<S, D> {
    pub fn new(sampler: S, sink: D, classifier: LoudnessClassifier, interval: Duration) -> Self {
        Self {
            sampler,
            sink,
            classifier,
            interval: interval.max(Duration::from_millis(1)),
            max_ticks: None,
            telemetry: None,
            started: false,
        }
    }

    /// End the session after `max_ticks` ticks.
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<TelemetryCollector>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    pub fn sink(&self) -> &D {
        &self.sink
    }

    fn emit(&self, event: MeterEvent) {
        if let Some(telemetry) = &self.telemetry {
            telemetry.publish(event);
        }
    }

    /// Check authorization and acquire the sampler.
    ///
    /// # Errors
    /// - `SamplerError::PermissionDenied` if the sampler is not authorized
    /// - Whatever `Sampler::start` reports; the sampler is released again
    pub fn start(&mut self) -> Result<(), SamplerError> {
        if self.started {
            return Err(SamplerError::AlreadyRunning);
        }

        let result = if self.sampler.is_authorized() {
            self.sampler.start()
        } else {
            Err(SamplerError::PermissionDenied)
        };

        match result {
            Ok(()) => {
                self.started = true;
                self.emit(MeterEvent::Started {
                    interval_ms: self.interval.as_millis() as u64,
                });
                tracing::info!(
                    interval_ms = self.interval.as_millis() as u64,
                    "[SamplingLoop] Sampler started"
                );
                Ok(())
            }
            Err(err) => {
                log_sampler_error(&err, "start");
                self.emit(MeterEvent::StartFailed {
                    code: err.code(),
                    message: err.message(),
                });
                if let Err(stop_err) = self.sampler.stop() {
                    log_sampler_error(&stop_err, "start cleanup");
                }
                Err(err)
            }
        }
    }

    /// Run one tick: poll, classify, render.
    pub fn tick(&mut self) -> TickOutcome {
        let raw_power = match self.sampler.current_power() {
            Ok(raw_power) => raw_power,
            Err(err) => {
                let reason = if err.is_transient() {
                    log::debug!("[SamplingLoop] Sampler not ready, skipping tick");
                    SkipReason::NotReady
                } else if err == SamplerError::Exhausted {
                    log::info!("[SamplingLoop] Sample source exhausted");
                    SkipReason::SamplerError
                } else {
                    log_sampler_error(&err, "tick");
                    SkipReason::SamplerError
                };
                self.emit(MeterEvent::Skipped { reason });
                return TickOutcome::Skipped(err);
            }
        };

        let state = match self.classifier.classify(raw_power) {
            Ok(state) => state,
            Err(err) => {
                log_classification_error(&err, "tick");
                self.emit(MeterEvent::Skipped {
                    reason: SkipReason::ClassificationError,
                });
                return TickOutcome::Retained(err);
            }
        };

        if let Err(err) = self.sink.render(&state) {
            log::warn!("[SamplingLoop] Display sink failed: {}", err);
            self.emit(MeterEvent::Skipped {
                reason: SkipReason::DisplayError,
            });
            return TickOutcome::DisplayFailed(state, err.kind());
        }

        log::debug!(
            "[SamplingLoop] raw={:.2} dBFS -> {} ({})",
            raw_power,
            state.value_text(),
            state.band
        );
        self.emit(MeterEvent::Rendered {
            loudness: state.loudness,
            band: state.band,
        });
        TickOutcome::Rendered(state)
    }

    /// Start the sampler and tick every interval until cancelled, the sampler
    /// goes inactive, the display reports a broken pipe, or the tick limit is
    /// reached.
    ///
    /// The first tick fires one interval after start. Ticks never overlap:
    /// a late tick delays the schedule rather than bursting.
    pub async fn run(&mut self, shutdown: ShutdownToken) -> Result<SessionReport, SamplerError> {
        self.start()?;

        let mut timer = interval_at(Instant::now() + self.interval, self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut ticks = 0_u64;
        let mut rendered = 0_u64;
        let mut skipped = 0_u64;

        let stop_reason = loop {
            if self.max_ticks.is_some_and(|max| ticks >= max) {
                break StopReason::TickLimit;
            }

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break StopReason::Cancelled,
                _ = timer.tick() => {}
            }

            ticks += 1;
            match self.tick() {
                TickOutcome::Rendered(_) => rendered += 1,
                TickOutcome::DisplayFailed(_, io::ErrorKind::BrokenPipe) => {
                    skipped += 1;
                    log::info!("[SamplingLoop] Display closed, ending session");
                    break StopReason::DisplayClosed;
                }
                _ => skipped += 1,
            }

            if !self.sampler.is_active() {
                log::info!("[SamplingLoop] Sampler no longer active, ending session");
                break StopReason::SamplerInactive;
            }
        };

        self.teardown();
        self.emit(MeterEvent::Stopped { ticks });
        tracing::info!(ticks, rendered, skipped, reason = ?stop_reason, "[SamplingLoop] Session ended");

        Ok(SessionReport {
            ticks,
            rendered,
            skipped,
            stop_reason,
        })
    }

    /// Release the sampler. Unconditional and infallible from the caller's
    /// view; failures are only logged.
    pub fn teardown(&mut self) {
        if !self.started {
            return;
        }
        self.started = false;
        if let Err(err) = self.sampler.stop() {
            log_sampler_error(&err, "teardown");
        }
    }
}

impl<S: Sampler, D: DisplaySink> Drop for SamplingLoop<S, D> {
    fn drop(&mut self) {
        self.teardown();
    }
}
