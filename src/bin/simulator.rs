use clap::{Args, Parser, Subcommand, ValueEnum};
use futures::StreamExt;
use rehabcore::config::{HeartRateModulation, PipelineConfig};
use rehabcore::log::create_logger;
use rehabcore::simulator::demo::{demo_recording, DemoProfile};
use rehabcore::{PeakBasedBpmEstimator, ProducerState, StreamError, StreamPipeline};
use slog::{info, warn};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "rehab-simulator")]
#[command(author, version, about = "ECG and knee-IMU sensor stream simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stream synthesized samples into a CSV window file until Ctrl-C
    Run(RunArgs),
    /// Write a canned ECG recording and print its estimated heart rate
    Demo(DemoArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Transport file shared with consumers
    #[arg(short, long, default_value = "data/sensor_data_stream.csv")]
    output: PathBuf,

    /// JSON configuration; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Window capacity (samples kept in the file)
    #[arg(short = 'k', long)]
    capacity: Option<usize>,

    /// Seconds between samples
    #[arg(short = 'p', long)]
    sample_period: Option<f64>,

    /// Base heart rate of the synthesized ECG
    #[arg(short, long)]
    bpm: Option<f64>,

    /// Let the heart rate drift by +-10 bpm
    #[arg(long)]
    modulate: bool,

    /// RNG seed for reproducible streams
    #[arg(short, long)]
    seed: Option<u64>,

    /// Log a window report this often (milliseconds)
    #[arg(long, default_value = "1000")]
    report_every_ms: u64,
}

#[derive(Args, Debug)]
struct DemoArgs {
    #[arg(short, long, value_enum, default_value = "normal")]
    profile: Profile,

    #[arg(short, long, default_value = "data/ecg_example.csv")]
    output: PathBuf,

    #[arg(short, long, default_value = "42")]
    seed: u64,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Profile {
    Normal,
    Stress,
}

impl From<Profile> for DemoProfile {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::Normal => DemoProfile::Normal,
            Profile::Stress => DemoProfile::Stress,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), StreamError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args).await,
        Command::Demo(args) => demo(args),
    }
}

fn run_config(args: &RunArgs) -> Result<PipelineConfig, StreamError> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    config.stream_file = Some(args.output.clone());
    if let Some(capacity) = args.capacity {
        config.window_capacity = capacity;
    }
    if let Some(period) = args.sample_period {
        config.sample_period_secs = period;
    }
    if let Some(bpm) = args.bpm {
        config.synthesizer.base_bpm = bpm;
    }
    if args.modulate {
        config.synthesizer.heart_rate_modulation = Some(HeartRateModulation {
            amplitude_bpm: 10.0,
            angular_freq: 0.1,
        });
    }
    if args.seed.is_some() {
        config.synthesizer.seed = args.seed;
    }
    config.validate()?;
    Ok(config)
}

async fn run(args: RunArgs) -> Result<(), StreamError> {
    let logger = create_logger("simulator");
    let config = run_config(&args)?;

    info!(logger, "Starting simulator";
        "rate_hz" => 1.0 / config.sample_period_secs,
        "capacity" => config.window_capacity,
        "output" => %args.output.display());

    let pipeline = StreamPipeline::start(config, &logger)?;

    let report_logger = logger.clone();
    let mut reports = Box::pin(pipeline.reports(Duration::from_millis(args.report_every_ms.max(1))));
    let reporter = tokio::spawn(async move {
        while let Some(report) = reports.next().await {
            let stats = report.stats.as_ref();
            info!(report_logger, "Window";
                "samples" => report.window_len(),
                "ecg" => report.assessment.ecg_message(),
                "imu" => report.assessment.imu_message(),
                "ecg_max" => stats.map_or(0.0, |s| s.ecg_max),
                "angle" => stats.map_or(0.0, |s| s.angle_max));
        }
    });

    let mut state = pipeline.state_changes();
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!(logger, "Interrupted, stopping"),
        _ = state.wait_for(|s| *s == ProducerState::Stopped) => warn!(logger, "Producer stopped on its own"),
    }

    reporter.abort();
    let report = pipeline.stop().await?;
    info!(logger, "Simulator stopped"; "samples" => report.samples_produced);
    Ok(())
}

fn demo(args: DemoArgs) -> Result<(), StreamError> {
    let logger = create_logger("simulator");
    let profile = DemoProfile::from(args.profile);

    let recording = demo_recording(profile, args.seed);
    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    recording.write_csv_path(&args.output)?;

    let estimate = PeakBasedBpmEstimator::default().estimate(&recording)?;
    info!(logger, "Demo recording written";
        "profile" => ?profile,
        "output" => %args.output.display(),
        "peaks" => estimate.peaks.len(),
        "bpm" => format!("{:.1}", estimate.bpm));
    println!("{:.1}", estimate.bpm);
    Ok(())
}
