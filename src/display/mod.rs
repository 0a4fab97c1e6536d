//! Display sinks for meter readings.
//!
//! A sink receives one [`DisplayState`] per rendered tick. Band colors come
//! from an injected [`Palette`] rather than global constants, so a sink can
//! be re-themed or tested without touching the classifier.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::analysis::{DisplayState, SeverityBand};

/// Trait implemented by everything that can show a meter reading.
pub trait DisplaySink {
    fn render(&mut self, state: &DisplayState) -> io::Result<()>;
}

impl<D: DisplaySink + ?Sized> DisplaySink for Box<D> {
    fn render(&mut self, state: &DisplayState) -> io::Result<()> {
        (**self).render(state)
    }
}

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// ANSI 24-bit foreground escape sequence.
    pub fn ansi_fg(&self) -> String {
        format!("\x1b[38;2;{};{};{}m", self.r, self.g, self.b)
    }
}

/// Pure mapping from severity band to display color
///
/// The default palette keeps Quiet on the same green as Normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub quiet: Rgb,
    pub normal: Rgb,
    pub loud: Rgb,
    pub too_loud: Rgb,
}

impl Palette {
    pub const NORMAL_GREEN: Rgb = Rgb::new(40, 187, 69);
    pub const LOUD_AMBER: Rgb = Rgb::new(187, 154, 44);
    pub const TOO_LOUD_RED: Rgb = Rgb::new(187, 15, 2);

    pub fn color(&self, band: SeverityBand) -> Rgb {
        match band {
            SeverityBand::Quiet => self.quiet,
            SeverityBand::Normal => self.normal,
            SeverityBand::Loud => self.loud,
            SeverityBand::TooLoud => self.too_loud,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            quiet: Self::NORMAL_GREEN,
            normal: Self::NORMAL_GREEN,
            loud: Self::LOUD_AMBER,
            too_loud: Self::TOO_LOUD_RED,
        }
    }
}

const ANSI_RESET: &str = "\x1b[0m";

/// Human-readable one-line-per-tick sink
pub struct TerminalSink<W: Write> {
    out: W,
    palette: Palette,
    bar_width: usize,
    color: bool,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W, palette: Palette) -> Self {
        Self {
            out,
            palette,
            bar_width: 30,
            color: true,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn with_bar_width(mut self, bar_width: usize) -> Self {
        self.bar_width = bar_width.max(1);
        self
    }

    /// Format one reading, e.g. `  68.0 dB  Sounds: normal    [###...]  65%`.
    pub fn format_line(&self, state: &DisplayState) -> String {
        let filled = ((state.progress * self.bar_width as f32).round() as usize).min(self.bar_width);
        let bar = format!(
            "{}{}",
            "█".repeat(filled),
            "·".repeat(self.bar_width - filled)
        );
        let label = format!("{:<8}", state.band.label());
        let (label, bar) = if self.color {
            let fg = self.palette.color(state.band).ansi_fg();
            (
                format!("{fg}{label}{ANSI_RESET}"),
                format!("{fg}{bar}{ANSI_RESET}"),
            )
        } else {
            (label, bar)
        };

        format!(
            "{:>8}  Sounds: {}  [{}] {:>3.0}%",
            state.value_text(),
            label,
            bar,
            state.progress * 100.0
        )
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DisplaySink for TerminalSink<W> {
    fn render(&mut self, state: &DisplayState) -> io::Result<()> {
        let line = self.format_line(state);
        writeln!(self.out, "{line}")?;
        self.out.flush()
    }
}

/// JSON-lines sink: one `DisplayState` object per tick
pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DisplaySink for JsonSink<W> {
    fn render(&mut self, state: &DisplayState) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, state)?;
        writeln!(self.out)?;
        self.out.flush()
    }
}

/// Broadcast sink for embedding UIs; every subscriber gets every reading
///
/// Buffer size: 16 readings (20 s at the default 800 ms cadence). Lagging
/// subscribers lose the oldest readings.
pub struct ChannelSink {
    tx: broadcast::Sender<DisplayState>,
}

impl ChannelSink {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DisplayState> {
        self.tx.subscribe()
    }
}

impl Default for ChannelSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySink for ChannelSink {
    fn render(&mut self, state: &DisplayState) -> io::Result<()> {
        // No subscribers is not an error; the reading is simply superseded.
        let _ = self.tx.send(*state);
        Ok(())
    }
}

/// Sink that keeps every rendered state, for tests and embedding
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub states: Vec<DisplayState>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplaySink for RecordingSink {
    fn render(&mut self, state: &DisplayState) -> io::Result<()> {
        self.states.push(*state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(loudness: f32, band: SeverityBand, progress: f32) -> DisplayState {
        DisplayState {
            loudness,
            band,
            progress,
        }
    }

    #[test]
    fn test_default_palette_matches_band_colors() {
        let palette = Palette::default();
        assert_eq!(palette.color(SeverityBand::Quiet), Palette::NORMAL_GREEN);
        assert_eq!(palette.color(SeverityBand::Normal), Palette::NORMAL_GREEN);
        assert_eq!(palette.color(SeverityBand::Loud), Rgb::new(187, 154, 44));
        assert_eq!(palette.color(SeverityBand::TooLoud), Rgb::new(187, 15, 2));
    }

    #[test]
    fn test_ansi_escape() {
        assert_eq!(Rgb::new(1, 2, 3).ansi_fg(), "\x1b[38;2;1;2;3m");
    }

    #[test]
    fn test_terminal_line_without_color() {
        let sink = TerminalSink::new(Vec::new(), Palette::default())
            .with_color(false)
            .with_bar_width(10);
        let line = sink.format_line(&state(68.02, SeverityBand::Normal, 0.648));
        assert!(line.contains("68.0 dB"), "{line}");
        assert!(line.contains("Sounds: normal"), "{line}");
        assert!(line.contains(&format!("[{}{}]", "█".repeat(6), "·".repeat(4))), "{line}");
        assert!(line.ends_with(" 65%"), "{line}");
        assert!(!line.contains('\x1b'));
    }

    #[test]
    fn test_terminal_line_colors_band() {
        let sink = TerminalSink::new(Vec::new(), Palette::default());
        let line = sink.format_line(&state(120.0, SeverityBand::TooLoud, 1.0));
        assert!(line.contains(&Palette::TOO_LOUD_RED.ansi_fg()));
        assert!(line.contains("too loud"));
    }

    #[test]
    fn test_terminal_render_writes_line() {
        let mut sink = TerminalSink::new(Vec::new(), Palette::default()).with_color(false);
        sink.render(&DisplayState::silence()).unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert!(out.starts_with("  0.0 dB  Sounds: quiet"), "{out}");
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn test_json_sink_lines() {
        let mut sink = JsonSink::new(Vec::new());
        sink.render(&state(88.0, SeverityBand::Loud, 0.838)).unwrap();
        sink.render(&DisplayState::silence()).unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["band"], "loud");
        let second: DisplayState = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second, DisplayState::silence());
    }

    #[test]
    fn test_channel_sink_broadcasts() {
        let mut sink = ChannelSink::new();
        // Without subscribers render still succeeds
        sink.render(&DisplayState::silence()).unwrap();

        let mut rx = sink.subscribe();
        let reading = state(50.0, SeverityBand::Normal, 0.476);
        sink.render(&reading).unwrap();
        assert_eq!(rx.try_recv().unwrap(), reading);
    }

    #[test]
    fn test_boxed_sink_delegates() {
        let mut sink: Box<dyn DisplaySink> = Box::new(RecordingSink::new());
        assert!(sink.render(&DisplayState::silence()).is_ok());
    }
}
