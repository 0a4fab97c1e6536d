//! Meter module housing the sampling loop.
//!
//! `core` drives a [`crate::sampler::Sampler`] through the classifier into a
//! [`crate::display::DisplaySink`] on a fixed timer; `shutdown` provides the
//! cancellation token that ends a session.

pub mod core;
mod shutdown;

pub use self::core::{SamplingLoop, SessionReport, StopReason, TickOutcome};
pub use shutdown::ShutdownToken;
