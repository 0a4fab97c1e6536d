//! End-to-end sampling loop scenarios over real sample sources.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use simple_db::analysis::SeverityBand;
use simple_db::display::{ChannelSink, RecordingSink};
use simple_db::sampler::{ScriptStep, ScriptedSampler, WavSampler};
use simple_db::telemetry::TelemetryCollector;
use simple_db::{DisplayState, LoudnessClassifier, SamplingLoop, ShutdownToken, StopReason};

const TICK: Duration = Duration::from_millis(5);

/// Mono 16-bit WAV made of constant-amplitude square-wave segments.
fn segmented_wav(sample_rate: u32, segments: &[(f32, usize)]) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::new(Cursor::new(&mut bytes), spec).unwrap();
        for &(amplitude, frames) in segments {
            for n in 0..frames {
                let sign = if n % 2 == 0 { 1.0 } else { -1.0 };
                let sample = (sign * amplitude * i16::MAX as f32) as i16;
                writer.write_sample(sample).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    bytes
}

#[tokio::test]
async fn wav_replay_renders_each_tick_until_exhausted() {
    // 8 kHz at 5 ms -> 40 frames per tick. Square waves have RMS == amplitude.
    let wav = segmented_wav(8_000, &[(0.0, 40), (0.1, 40), (1.0, 40)]);
    let reader = WavReader::new(Cursor::new(wav)).unwrap();
    let sampler = WavSampler::new(reader, TICK);
    assert_eq!(sampler.frames_per_tick(), 40);

    let mut meter = SamplingLoop::new(
        sampler,
        RecordingSink::new(),
        LoudnessClassifier::default(),
        TICK,
    );
    let report = meter.run(ShutdownToken::new()).await.unwrap();

    assert_eq!(report.stop_reason, StopReason::SamplerInactive);
    assert_eq!(report.rendered, 3);
    assert_eq!(report.skipped, 1);

    let states = &meter.sink().states;
    // Digital silence sits at the -160 dBFS clamp, below the floor.
    assert_eq!(states[0], DisplayState::silence());
    // 0.1 RMS -> -20 dBFS -> ~68 dB
    assert_eq!(states[1].band, SeverityBand::Normal);
    assert!((states[1].loudness - 68.02).abs() < 0.1);
    // Full scale -> ~88 dB
    assert_eq!(states[2].band, SeverityBand::Loud);
}

#[tokio::test]
async fn channel_sink_delivers_latest_state_to_subscribers() {
    let sink = ChannelSink::new();
    let mut rx = sink.subscribe();

    let mut meter = SamplingLoop::new(
        ScriptedSampler::new(vec![
            ScriptStep::Power(-40.0),
            ScriptStep::NotReady,
            ScriptStep::Power(0.0),
        ]),
        sink,
        LoudnessClassifier::default(),
        TICK,
    );
    let report = meter.run(ShutdownToken::new()).await.unwrap();
    assert_eq!(report.rendered, 2);

    assert_eq!(rx.recv().await.unwrap().band, SeverityBand::Normal);
    assert_eq!(rx.recv().await.unwrap().band, SeverityBand::Loud);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn cancellation_mid_session_stops_and_reports() {
    let telemetry = Arc::new(TelemetryCollector::default());
    let mut meter = SamplingLoop::new(
        ScriptedSampler::new(std::iter::repeat(-30.0_f32).take(10_000)),
        RecordingSink::new(),
        LoudnessClassifier::default(),
        TICK,
    )
    .with_telemetry(Arc::clone(&telemetry));

    let shutdown = ShutdownToken::new();
    let canceller = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(40)).await;
        canceller.cancel();
    });

    let report = meter.run(shutdown).await.unwrap();

    assert_eq!(report.stop_reason, StopReason::Cancelled);
    assert!(report.ticks >= 1);
    assert!(report.ticks < 10_000);
    assert_eq!(meter.sink().states.len() as u64, report.rendered);
    assert!(!meter.is_started());

    let snapshot = telemetry.snapshot();
    assert_eq!(snapshot.rendered_ticks, report.rendered);
    assert_eq!(
        snapshot.band_counts.get(&SeverityBand::Normal).copied(),
        Some(report.rendered)
    );
}
