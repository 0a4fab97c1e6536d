//! Meter telemetry event types exposed to the CLI session summary and any
//! subscriber of the collector's broadcast stream.

use serde::{Deserialize, Serialize};

use crate::analysis::SeverityBand;

/// Why a tick produced no rendering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotReady,
    SamplerError,
    ClassificationError,
    DisplayError,
}

/// Events emitted by the sampling loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MeterEvent {
    Started {
        interval_ms: u64,
    },
    Rendered {
        loudness: f32,
        band: SeverityBand,
    },
    Skipped {
        reason: SkipReason,
    },
    StartFailed {
        code: i32,
        message: String,
    },
    Stopped {
        ticks: u64,
    },
}
