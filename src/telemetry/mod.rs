//! Session telemetry collector.
//!
//! The collector fans meter events out over a broadcast channel and keeps a
//! bounded window of recent events plus running counters, so the CLI can
//! print a summary when a session ends. Nothing here is persisted.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::broadcast;

use crate::analysis::SeverityBand;

pub mod events;

pub use events::{MeterEvent, SkipReason};

/// Snapshot of collector state for CLI reporting.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySnapshot {
    pub recent: Vec<MeterEvent>,
    pub total_events: u64,
    pub rendered_ticks: u64,
    pub skipped_ticks: u64,
    /// Rendered ticks per band
    pub band_counts: BTreeMap<SeverityBand, u64>,
    /// Loudest rendered reading of the session
    pub peak_loudness: Option<f32>,
}

#[derive(Debug, Default)]
struct Tally {
    band_counts: BTreeMap<SeverityBand, u64>,
    peak_loudness: Option<f32>,
}

/// Broadcast-based collector retaining a bounded history of meter events.
pub struct TelemetryCollector {
    tx: broadcast::Sender<MeterEvent>,
    history: Mutex<VecDeque<MeterEvent>>,
    history_capacity: usize,
    tally: Mutex<Tally>,
    total_events: AtomicU64,
    rendered: AtomicU64,
    skipped: AtomicU64,
}

impl TelemetryCollector {
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Self {
            tx,
            history: Mutex::new(VecDeque::with_capacity(history_capacity)),
            history_capacity,
            tally: Mutex::new(Tally::default()),
            total_events: AtomicU64::new(0),
            rendered: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, event: MeterEvent) {
        self.total_events.fetch_add(1, Ordering::Relaxed);

        match &event {
            MeterEvent::Rendered { loudness, band } => {
                self.rendered.fetch_add(1, Ordering::Relaxed);
                if let Ok(mut tally) = self.tally.lock() {
                    *tally.band_counts.entry(*band).or_insert(0) += 1;
                    let peak = tally.peak_loudness.map_or(*loudness, |p| p.max(*loudness));
                    tally.peak_loudness = Some(peak);
                }
            }
            MeterEvent::Skipped { .. } => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }

        if self.history_capacity > 0 {
            if let Ok(mut history) = self.history.lock() {
                if history.len() == self.history_capacity {
                    history.pop_front();
                }
                history.push_back(event.clone());
            }
        }

        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MeterEvent> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let recent = self
            .history
            .lock()
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default();
        let (band_counts, peak_loudness) = self
            .tally
            .lock()
            .map(|tally| (tally.band_counts.clone(), tally.peak_loudness))
            .unwrap_or_default();

        TelemetrySnapshot {
            recent,
            total_events: self.total_events.load(Ordering::Relaxed),
            rendered_ticks: self.rendered.load(Ordering::Relaxed),
            skipped_ticks: self.skipped.load(Ordering::Relaxed),
            band_counts,
            peak_loudness,
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new(64, 32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_peak() {
        let collector = TelemetryCollector::default();
        collector.publish(MeterEvent::Started { interval_ms: 800 });
        collector.publish(MeterEvent::Rendered {
            loudness: 68.0,
            band: SeverityBand::Normal,
        });
        collector.publish(MeterEvent::Rendered {
            loudness: 88.0,
            band: SeverityBand::Loud,
        });
        collector.publish(MeterEvent::Rendered {
            loudness: 70.0,
            band: SeverityBand::Normal,
        });
        collector.publish(MeterEvent::Skipped {
            reason: SkipReason::NotReady,
        });

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.total_events, 5);
        assert_eq!(snapshot.rendered_ticks, 3);
        assert_eq!(snapshot.skipped_ticks, 1);
        assert_eq!(snapshot.band_counts.get(&SeverityBand::Normal), Some(&2));
        assert_eq!(snapshot.band_counts.get(&SeverityBand::Loud), Some(&1));
        assert_eq!(snapshot.band_counts.get(&SeverityBand::Quiet), None);
        assert_eq!(snapshot.peak_loudness, Some(88.0));
    }

    #[test]
    fn test_history_is_bounded() {
        let collector = TelemetryCollector::new(8, 2);
        for ticks in 0..5 {
            collector.publish(MeterEvent::Stopped { ticks });
        }
        let snapshot = collector.snapshot();
        assert_eq!(snapshot.total_events, 5);
        assert_eq!(
            snapshot.recent,
            vec![
                MeterEvent::Stopped { ticks: 3 },
                MeterEvent::Stopped { ticks: 4 }
            ]
        );
    }

    #[test]
    fn test_subscribers_receive_events() {
        let collector = TelemetryCollector::default();
        let mut rx = collector.subscribe();
        collector.publish(MeterEvent::Started { interval_ms: 100 });
        assert_eq!(
            rx.try_recv().unwrap(),
            MeterEvent::Started { interval_ms: 100 }
        );
    }
}
