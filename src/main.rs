mod config;
mod context;
mod predict;
mod sampler;
mod tracker;

use chrono::{DateTime, Duration, Utc};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::context::{Context, StationOverrides};
use crate::predict::{find_events, group_passes, OrbitalPass, PredictError, SatelliteId};
use crate::sampler::{
    export_pass, format_decimal, format_timestamp, print_samples, sample_pass, SamplerError,
};
use crate::tracker::{LiveTracker, Reading, TrackedSatellite, TrackerError};

#[derive(Parser)]
#[command(name = "sat-pass")]
#[command(about = "Satellite visibility from a fixed ground station")]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List rise, culmination and set events
    Events {
        #[command(flatten)]
        target: Target,
        #[command(flatten)]
        window: Window,
    },
    /// Sample every pass in the window and write one CSV file per pass
    Export {
        #[command(flatten)]
        target: Target,
        #[command(flatten)]
        window: Window,
        /// Directory for the CSV files (default: output.dir from the config)
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Add a range column in kilometres
        #[arg(long)]
        range: bool,
        /// Print the samples instead of writing files
        #[arg(long)]
        stdout: bool,
    },
    /// Print the current position until interrupted
    Track {
        #[command(flatten)]
        target: Target,
        /// Polling period
        #[arg(long, default_value = "1s")]
        period: String,
    },
}

#[derive(Args)]
struct Target {
    /// NORAD catalog number, or international designator with piece letter (2017-073A)
    id: SatelliteId,
    /// Ground station latitude in degrees
    #[arg(allow_negative_numbers = true)]
    lat: Option<f64>,
    /// Ground station longitude in degrees
    #[arg(allow_negative_numbers = true)]
    lon: Option<f64>,
    /// Ground station altitude in metres
    #[arg(long)]
    altitude_m: Option<f64>,
    /// IANA time zone of the ground station, e.g. Australia/Melbourne
    #[arg(long)]
    tz: Option<String>,
    /// Download the element set even if it is cached
    #[arg(long)]
    reload: bool,
}

#[derive(Args)]
struct Window {
    /// Start of the window, RFC 3339 (default: now)
    #[arg(long)]
    start: Option<String>,
    /// Length of the window
    #[arg(long, default_value = "2d")]
    duration: String,
    /// Altitude a pass must cross, in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    min_elevation: f64,
}

#[derive(Debug, Error)]
enum AppError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Predict(#[from] PredictError),
    #[error("{0}")]
    Sampler(#[from] SamplerError),
    #[error("{0}")]
    Tracker(#[from] TrackerError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Events { target, window } => events(config, &target, &window),
        Commands::Export {
            target,
            window,
            output_dir,
            range,
            stdout,
        } => export(config, &target, &window, output_dir, range, stdout),
        Commands::Track { target, period } => track(config, &target, &period),
    }
}

fn events(config: Config, target: &Target, window: &Window) -> Result<(), AppError> {
    let ctx = prepare(config, target)?;
    let satellite = ctx.load_satellite(&target.id, target.reload, Utc::now())?;
    let (start, end) = window.resolve(Utc::now())?;

    let events = find_events(&ctx.observe(&satellite), start, end, window.min_elevation)?;
    log::debug!(
        "{} events, {} complete passes",
        events.len(),
        group_passes(&events).len()
    );

    print!("{} (NORAD {}", satellite.name, satellite.norad_id);
    if let Some(designator) = &satellite.international_designator {
        print!(", {}", designator);
    }
    println!(")");
    if let Some(name) = &ctx.station_name {
        println!("seen from {}", name);
    }
    for event in &events {
        println!(
            "{} {}",
            event.time.with_timezone(&ctx.timezone).format("%Y %D %H:%M:%S"),
            event.kind.describe(window.min_elevation)
        );
    }
    Ok(())
}

fn export(
    config: Config,
    target: &Target,
    window: &Window,
    output_dir: Option<PathBuf>,
    range: bool,
    stdout: bool,
) -> Result<(), AppError> {
    let ctx = prepare(config, target)?;
    let satellite = ctx.load_satellite(&target.id, target.reload, Utc::now())?;
    let (start, end) = window.resolve(Utc::now())?;

    let observation = ctx.observe(&satellite);
    let passes = group_passes(&find_events(&observation, start, end, window.min_elevation)?);
    if passes.is_empty() {
        log::info!("No complete passes of {} between {} and {}", satellite.name, start, end);
        return Ok(());
    }

    if stdout {
        let mut out = std::io::stdout().lock();
        for (i, pass) in passes.iter().enumerate() {
            let samples = sample_pass(&observation, pass.rise, pass.set)?;
            writeln!(out, "{}", pass_header(i + 1, pass, &ctx.timezone))?;
            print_samples(&mut out, &samples, &ctx.timezone)?;
        }
        return Ok(());
    }

    let dir = output_dir.unwrap_or_else(|| ctx.config.output.dir.clone());
    fs::create_dir_all(&dir)?;
    let include_range = range || ctx.config.output.include_range;

    for (i, pass) in passes.iter().enumerate() {
        let path = dir.join(format!("{}-pass-{}.csv", target.id, i + 1));
        let written = export_pass(
            &path,
            &observation,
            pass.rise,
            pass.set,
            &ctx.timezone,
            include_range,
        )?;
        log::info!(
            "Pass {} rises {} and lasts {}s",
            i + 1,
            format_timestamp(pass.rise, &ctx.timezone),
            pass.duration().num_seconds()
        );
        println!("Wrote {} samples to {}", written, path.display());
    }
    Ok(())
}

fn track(config: Config, target: &Target, period: &str) -> Result<(), AppError> {
    let ctx = prepare(config, target)?;
    let period = humantime::parse_duration(period)
        .map_err(|e| AppError::InvalidArgument(format!("period '{}': {}", period, e)))?;
    // Elements are fetched with the blocking client, before the runtime starts.
    let satellite = ctx.load_satellite(&target.id, target.reload, Utc::now())?;
    println!("Tracking {} (NORAD {}), Ctrl-C to stop", satellite.name, satellite.norad_id);

    let source = TrackedSatellite {
        satellite,
        station: ctx.station,
    };
    let timezone = ctx.timezone;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let mut tracker = LiveTracker::new();
        let mut readings = tracker.start(source, period)?;

        loop {
            tokio::select! {
                reading = readings.recv() => match reading {
                    Some(reading) => println!("{}", live_line(&reading, &timezone)),
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => {
                    log::info!("Interrupted, stopping tracker");
                    break;
                }
            }
        }

        if tracker.is_running() {
            log::debug!("Waiting for the tracker to stop");
        }
        tracker.stop().await?;
        Ok::<(), AppError>(())
    })
}

/// `# pass 2: culminates 21/08/04-00:05:09 at 45.0°`
fn pass_header(number: usize, pass: &OrbitalPass, tz: &chrono_tz::Tz) -> String {
    match pass.culminate {
        Some(culminate) => format!(
            "# pass {}: culminates {} at {:.1}°",
            number,
            format_timestamp(culminate, tz),
            pass.max_altitude_deg
        ),
        None => format!("# pass {}: max altitude {:.1}°", number, pass.max_altitude_deg),
    }
}

fn live_line(reading: &Reading, tz: &chrono_tz::Tz) -> String {
    let sample = &reading.sample;
    format!(
        "{}  alt {}  az {}  range {:.1} km  rate {:+.3} km/s",
        format_timestamp(sample.timestamp, tz),
        format_decimal(sample.altitude_deg),
        format_decimal(sample.azimuth_deg),
        sample.range_km,
        reading.range_rate_km_s
    )
}

fn prepare(config: Config, target: &Target) -> Result<Context, AppError> {
    let overrides = StationOverrides {
        latitude_deg: target.lat,
        longitude_deg: target.lon,
        altitude_m: target.altitude_m,
        timezone: target.tz.clone(),
    };
    Ok(Context::new(config, &overrides)?)
}

impl Window {
    fn resolve(&self, now: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
        let start = match &self.start {
            Some(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| AppError::InvalidArgument(format!("start '{}': {}", s, e)))?,
            None => now,
        };
        let length = humantime::parse_duration(self.duration.trim())
            .map_err(|e| e.to_string())
            .and_then(|d| Duration::from_std(d).map_err(|e| e.to_string()))
            .map_err(|e| AppError::InvalidArgument(format!("duration '{}': {}", self.duration, e)))?;
        Ok((start, start + length))
    }
}
