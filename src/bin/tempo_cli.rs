use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use futures::StreamExt;
use golf_tempo_trainer::analysis::{analyze_samples, AccuracyClass, SwingObservation};
use golf_tempo_trainer::audio::tones::load_wav;
use golf_tempo_trainer::catalog::{ShotType, TempoCatalog};
use golf_tempo_trainer::config::AppConfig;
use golf_tempo_trainer::engine::{
    create_backend, AudioBackend, SessionOptions, SilentBackend, TrainingController,
};
use golf_tempo_trainer::preferences::{
    JsonPreferenceStore, MemoryPreferenceStore, PreferenceStore, UserPreferences,
};
use golf_tempo_trainer::tempo::{phase_durations, TempoProfile};
use golf_tempo_trainer::testing::{swing_schedule, synthesize_swings, SynthConfig};
use golf_tempo_trainer::{http, init_logging};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "tempo_cli", about = "Golf tempo trainer command line harness")]
struct Cli {
    /// Configuration file (defaults to $GOLF_TEMPO_CONFIG or ./config.json)
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the professional tempo catalog as JSON
    Catalog {
        /// Only list professionals for this shot type
        #[arg(long)]
        shot_type: Option<String>,
    },
    /// Print phase durations for a tempo
    Tempo {
        #[arg(long)]
        bpm: f64,
        #[arg(long, default_value_t = 3.0)]
        ratio: f64,
    },
    /// Run a live training session and stream its updates as JSON lines
    Train(TrainArgs),
    /// Detect swings in a WAV recording
    Analyze {
        #[arg(long)]
        wav: PathBuf,
        /// Reference interval between peaks in seconds
        #[arg(long)]
        expected: Option<f64>,
        #[arg(long, default_value_t = 441)]
        block_size: usize,
    },
    /// Analyze a synthetic recording of evenly spaced swings
    Simulate {
        #[arg(long, default_value_t = 8)]
        swings: usize,
        #[arg(long, default_value_t = 0.5)]
        interval: f64,
        #[arg(long, default_value_t = 0.0)]
        jitter: f64,
        #[arg(long, default_value_t = 7)]
        seed: u64,
        #[arg(long)]
        expected: Option<f64>,
    },
}

#[derive(Args, Debug)]
struct TrainArgs {
    #[arg(long, default_value = "long_game")]
    shot_type: String,
    /// Catalog professional; defaults to the last selection or the first entry
    #[arg(long)]
    pro: Option<String>,
    /// Ad-hoc tempo instead of a catalog professional
    #[arg(long, conflicts_with = "pro")]
    bpm: Option<u32>,
    #[arg(long, default_value_t = 3.0, requires = "bpm")]
    ratio: f64,
    /// Stop after this many seconds (runs until Ctrl-C otherwise)
    #[arg(long)]
    duration: Option<f64>,
    /// Log cues instead of opening audio devices
    #[arg(long)]
    silent: bool,
    /// Cues only, no microphone
    #[arg(long)]
    no_analyze: bool,
    /// Preferences file; in-memory defaults when omitted
    #[arg(long)]
    prefs: Option<PathBuf>,
}

fn main() -> ExitCode {
    init_logging();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::load(),
    };

    match cli.command {
        Commands::Catalog { shot_type } => run_catalog(shot_type.as_deref()),
        Commands::Tempo { bpm, ratio } => run_tempo(bpm, ratio),
        Commands::Train(args) => run_train(config, args),
        Commands::Analyze {
            wav,
            expected,
            block_size,
        } => run_analyze(&config, &wav, expected, block_size),
        Commands::Simulate {
            swings,
            interval,
            jitter,
            seed,
            expected,
        } => run_simulate(&config, swings, interval, jitter, seed, expected),
    }
}

fn run_catalog(shot_type: Option<&str>) -> Result<ExitCode> {
    let catalog = TempoCatalog::builtin();
    let json = match shot_type {
        Some(raw) => {
            let shot_type: ShotType = raw.parse()?;
            serde_json::to_string_pretty(catalog.pros(shot_type))?
        }
        None => serde_json::to_string_pretty(catalog)?,
    };
    println!("{json}");
    Ok(ExitCode::from(0))
}

fn run_tempo(bpm: f64, ratio: f64) -> Result<ExitCode> {
    let durations = phase_durations(bpm, ratio)?;
    let report = TempoReport {
        bpm,
        ratio,
        backswing_secs: durations.backswing_secs,
        downswing_secs: durations.downswing_secs,
        metronome_spacing_secs: durations.metronome_spacing().as_secs_f64(),
        swing_total_secs: durations.swing_total_secs(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(0))
}

fn run_train(config: AppConfig, args: TrainArgs) -> Result<ExitCode> {
    let preferences: Arc<dyn PreferenceStore> = match &args.prefs {
        Some(path) => Arc::new(JsonPreferenceStore::new(path)),
        None => Arc::new(MemoryPreferenceStore::new(UserPreferences::default())),
    };
    let profile = resolve_profile(&args, &preferences.load())?;
    let limit = args
        .duration
        .map(Duration::try_from_secs_f64)
        .transpose()
        .context("--duration must be a non-negative number of seconds")?;
    let backend: Arc<dyn AudioBackend> = if args.silent {
        Arc::new(SilentBackend::new())
    } else {
        create_backend()
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("building session runtime")?;
    let controller = Arc::new(TrainingController::new(
        backend,
        config,
        preferences,
        runtime.handle().clone(),
    ));
    http::spawn_if_enabled(Arc::clone(&controller));

    let mut updates = Box::pin(controller.update_stream());
    controller.start_training(
        &profile,
        SessionOptions {
            analyze_swings: !args.no_analyze,
        },
    )?;

    runtime.block_on(async {
        let deadline = async {
            match limit {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => break,
                _ = tokio::signal::ctrl_c() => break,
                update = updates.next() => match update {
                    Some(update) => match serde_json::to_string(&update) {
                        Ok(line) => println!("{line}"),
                        Err(err) => log::warn!("[tempo_cli] Unprintable update: {}", err),
                    },
                    None => break,
                },
            }
        }
    });

    let summary = controller
        .stop_training()
        .ok_or_else(|| anyhow!("session ended before it could be summarized"))?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    runtime.shutdown_timeout(Duration::from_secs(1));
    Ok(ExitCode::from(0))
}

fn resolve_profile(args: &TrainArgs, preferences: &UserPreferences) -> Result<TempoProfile> {
    let shot_type: ShotType = args.shot_type.parse()?;
    if let Some(bpm) = args.bpm {
        return Ok(TempoProfile::custom(shot_type, "Custom", bpm, args.ratio)?);
    }

    let catalog = TempoCatalog::builtin();
    let remembered = preferences
        .last_pro
        .as_deref()
        .filter(|_| preferences.last_shot_type.as_deref() == Some(shot_type.key()));
    let pro = match (&args.pro, remembered) {
        (Some(pro), _) => pro.clone(),
        (None, Some(pro)) => pro.to_string(),
        (None, None) => catalog
            .pros(shot_type)
            .first()
            .map(|entry| entry.name.clone())
            .ok_or_else(|| anyhow!("no professionals listed for {}", shot_type.display_name()))?,
    };
    Ok(catalog.profile(shot_type, &pro)?)
}

fn run_analyze(
    config: &AppConfig,
    wav: &Path,
    expected: Option<f64>,
    block_size: usize,
) -> Result<ExitCode> {
    // Decoded to mono at the analyzer rate
    let sample_rate = config.analyzer.sample_rate;
    let clip = load_wav(wav, sample_rate).with_context(|| format!("reading {}", wav.display()))?;
    let samples = clip.samples();
    let expected = resolve_expected(config, expected)?;
    let observations = analyze_samples(
        samples,
        sample_rate,
        block_size,
        &config.analyzer,
        expected,
    );
    emit_report(
        &wav.display().to_string(),
        sample_rate,
        samples.len() as f64 / sample_rate as f64,
        expected,
        &observations,
    )?;
    Ok(ExitCode::from(0))
}

fn run_simulate(
    config: &AppConfig,
    swings: usize,
    interval: f64,
    jitter: f64,
    seed: u64,
    expected: Option<f64>,
) -> Result<ExitCode> {
    if !(interval.is_finite() && interval > 0.0) {
        bail!("interval must be a positive number of seconds");
    }
    let expected = resolve_expected(config, expected)?;
    let bursts = swing_schedule(swings, 0.5, interval, jitter, seed);
    let total = bursts.last().copied().unwrap_or(0.0) + 1.0;
    let synth = SynthConfig {
        sample_rate: config.analyzer.sample_rate,
        seed,
        ..SynthConfig::default()
    };
    let recording = synthesize_swings(&bursts, total, &synth);
    let observations = analyze_samples(
        &recording.samples,
        recording.sample_rate,
        441,
        &config.analyzer,
        expected,
    );
    emit_report(
        "synthetic",
        recording.sample_rate,
        recording.duration_secs(),
        expected,
        &observations,
    )?;
    Ok(ExitCode::from(0))
}

fn resolve_expected(config: &AppConfig, expected: Option<f64>) -> Result<f64> {
    let value = expected
        .or(config.analyzer.expected_interval_secs)
        .unwrap_or(0.5);
    if !(value.is_finite() && value > 0.0) {
        bail!("expected interval must be a positive number of seconds");
    }
    Ok(value)
}

fn emit_report(
    source: &str,
    sample_rate: u32,
    duration_secs: f64,
    expected_interval_secs: f64,
    observations: &[SwingObservation],
) -> Result<()> {
    let count = |class: AccuracyClass| {
        observations
            .iter()
            .filter(|observation| observation.accuracy == class)
            .count()
    };
    let report = AnalysisReport {
        source,
        sample_rate,
        duration_secs,
        expected_interval_secs,
        perfect: count(AccuracyClass::Perfect),
        good: count(AccuracyClass::Good),
        needs_work: count(AccuracyClass::NeedsWork),
        observations,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[derive(Serialize)]
struct TempoReport {
    bpm: f64,
    ratio: f64,
    backswing_secs: f64,
    downswing_secs: f64,
    metronome_spacing_secs: f64,
    swing_total_secs: f64,
}

#[derive(Serialize)]
struct AnalysisReport<'a> {
    source: &'a str,
    sample_rate: u32,
    duration_secs: f64,
    expected_interval_secs: f64,
    perfect: usize,
    good: usize,
    needs_work: usize,
    observations: &'a [SwingObservation],
}
