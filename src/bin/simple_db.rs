use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use simple_db::analysis::DisplayState;
use simple_db::config::AppConfig;
use simple_db::display::{DisplaySink, JsonSink, Palette, TerminalSink};
use simple_db::error::ErrorCode;
use simple_db::meter::{SamplingLoop, ShutdownToken};
use simple_db::sampler::{Sampler, ScriptStep, ScriptedSampler, WavSampler};
use simple_db::telemetry::TelemetryCollector;
use simple_db::LoudnessClassifier;

/// Exit code when the microphone cannot be used at all.
const EXIT_SAMPLER_UNAVAILABLE: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "simple_db",
    about = "Approximate dB(A) meter: samples input power and classifies loudness"
)]
struct Cli {
    /// JSON configuration file (defaults to assets/meter_config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Print a session summary to stderr when the meter stops
    #[arg(long, global = true)]
    summary: bool,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Meter the default microphone until Ctrl-C
    Listen(SessionArgs),
    /// Meter a WAV recording at the sampling cadence
    Replay {
        /// Path to the WAV file
        #[arg(long)]
        wav: PathBuf,
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Meter a scripted list of dBFS readings ("skip" or "nan" = no reading that tick)
    Simulate {
        #[arg(long, value_delimiter = ',', num_args = 1.., allow_hyphen_values = true, required = true)]
        power: Vec<String>,
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Classify a single dBFS reading and print it as JSON
    Classify {
        #[arg(long, allow_hyphen_values = true)]
        power: f32,
    },
    /// Print the severity band table
    Bands,
}

#[derive(Args, Debug, Clone)]
struct SessionArgs {
    /// Sampling interval in milliseconds (overrides config)
    #[arg(long)]
    interval_ms: Option<u64>,
    /// Stop after this many ticks
    #[arg(long)]
    ticks: Option<u64>,
    /// Output format for readings
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
    /// Disable ANSI colors in table output
    #[arg(long)]
    no_color: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    // Readings go to stdout; keep diagnostics on stderr.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::load(),
    };
    let classifier =
        LoudnessClassifier::from_config(&config).context("validating meter configuration")?;

    match cli.command {
        Commands::Listen(session) => run_listen(&config, classifier, &session, cli.summary),
        Commands::Replay { wav, session } => {
            let interval = session_interval(&config, &session);
            let sampler = WavSampler::open(&wav, interval)
                .with_context(|| format!("opening {}", wav.display()))?;
            run_session(sampler, classifier, interval, &session, cli.summary)
        }
        Commands::Simulate { power, session } => {
            let steps = parse_script(&power)?;
            let interval = session_interval(&config, &session);
            run_session(
                ScriptedSampler::new(steps),
                classifier,
                interval,
                &session,
                cli.summary,
            )
        }
        Commands::Classify { power } => run_classify(&classifier, power),
        Commands::Bands => run_bands(&classifier),
    }
}

#[cfg(not(target_os = "android"))]
fn run_listen(
    config: &AppConfig,
    classifier: LoudnessClassifier,
    session: &SessionArgs,
    summary: bool,
) -> Result<ExitCode> {
    let sampler = simple_db::sampler::CpalSampler::new(config.audio.clone());
    run_session(
        sampler,
        classifier,
        session_interval(config, session),
        session,
        summary,
    )
}

#[cfg(target_os = "android")]
fn run_listen(
    _config: &AppConfig,
    _classifier: LoudnessClassifier,
    _session: &SessionArgs,
    _summary: bool,
) -> Result<ExitCode> {
    eprintln!("Microphone metering is not available on this platform");
    Ok(ExitCode::from(EXIT_SAMPLER_UNAVAILABLE))
}

fn session_interval(config: &AppConfig, session: &SessionArgs) -> Duration {
    session
        .interval_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.sampling.interval())
}

fn parse_script(tokens: &[String]) -> Result<Vec<ScriptStep>> {
    tokens
        .iter()
        .map(|token| {
            let token = token.trim();
            if token.eq_ignore_ascii_case("skip") || token.eq_ignore_ascii_case("nan") {
                Ok(ScriptStep::NotReady)
            } else {
                token
                    .parse::<f32>()
                    .map(ScriptStep::Power)
                    .with_context(|| format!("invalid power reading {:?}", token))
            }
        })
        .collect()
}

fn make_sink(session: &SessionArgs) -> Box<dyn DisplaySink> {
    match session.format {
        OutputFormat::Table => Box::new(
            TerminalSink::new(io::stdout(), Palette::default()).with_color(!session.no_color),
        ),
        OutputFormat::Json => Box::new(JsonSink::new(io::stdout())),
    }
}

fn run_session<S: Sampler>(
    sampler: S,
    classifier: LoudnessClassifier,
    interval: Duration,
    session: &SessionArgs,
    summary: bool,
) -> Result<ExitCode> {
    if interval.is_zero() {
        bail!("sampling interval must be greater than 0 ms");
    }

    let telemetry = Arc::new(TelemetryCollector::default());
    let mut meter = SamplingLoop::new(sampler, make_sink(session), classifier, interval)
        .with_telemetry(Arc::clone(&telemetry));
    if let Some(ticks) = session.ticks {
        meter = meter.with_max_ticks(ticks);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building runtime")?;

    let result = runtime.block_on(async {
        let shutdown = ShutdownToken::new();
        let ctrl_c = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                ctrl_c.cancel();
            }
        });
        meter.run(shutdown).await
    });

    match result {
        Ok(report) => {
            if summary {
                let payload = SummaryPayload {
                    report: &report,
                    telemetry: &telemetry.snapshot(),
                };
                eprintln!("{}", serde_json::to_string_pretty(&payload)?);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) if err.is_unavailable() => {
            eprintln!("{} (code {})", err.message(), err.code());
            Ok(ExitCode::from(EXIT_SAMPLER_UNAVAILABLE))
        }
        Err(err) => Err(err).context("running meter session"),
    }
}

fn run_classify(classifier: &LoudnessClassifier, power: f32) -> Result<ExitCode> {
    let state = classifier
        .classify(power)
        .with_context(|| format!("classifying {} dBFS", power))?;
    let payload = ClassifyPayload {
        raw_power_db: power,
        value_text: state.value_text(),
        caption: state.band.caption(),
        state,
    };
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(ExitCode::SUCCESS)
}

fn run_bands(classifier: &LoudnessClassifier) -> Result<ExitCode> {
    let palette = Palette::default();
    for (band, lower, upper) in classifier.bands().ranges() {
        let range = match upper {
            Some(upper) => format!("[{lower:.1}, {upper:.1})"),
            None => format!("[{lower:.1}, ∞)"),
        };
        let color = palette.color(band);
        println!(
            "{:<8} {:<16} rgb({}, {}, {})",
            band.label(),
            range,
            color.r,
            color.g,
            color.b
        );
    }
    Ok(ExitCode::SUCCESS)
}

#[derive(Serialize)]
struct ClassifyPayload {
    raw_power_db: f32,
    #[serde(flatten)]
    state: DisplayState,
    value_text: String,
    caption: String,
}

#[derive(Serialize)]
struct SummaryPayload<'a> {
    report: &'a simple_db::SessionReport,
    telemetry: &'a simple_db::telemetry::TelemetrySnapshot,
}
