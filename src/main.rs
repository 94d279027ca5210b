use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use log::info;

use uwb_tracker::{ChannelFeed, ConfigError, SimulatedFeed, TrackerConfig, TrackingRuntime};

#[derive(Parser)]
#[command(name = "uwb-tracker")]
#[command(about = "2D UWB tag position tracking")]
struct Cli {
    /// JSON config overriding field size and demo cadence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seconds to run before exporting (0 = until the feed ends)
    #[arg(long, default_value_t = 10)]
    duration: u64,

    /// Position trail CSV target
    #[arg(long, default_value = "uwb_tracking_data.csv")]
    export: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Track the synthetic figure-8 demo tag
    Demo,
    /// Track JSON reading rows arriving line-by-line on stdin
    Live,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut runtime = TrackingRuntime::new(config.geometry());

    match cli.command {
        Commands::Demo => {
            let feed = SimulatedFeed::with_interval(
                runtime.geometry().clone(),
                Duration::from_millis(config.demo_interval_ms),
            );
            runtime.set_source(Box::new(feed));
        }
        Commands::Live => {
            let (feed, tx) = ChannelFeed::new("stdin");
            spawn_stdin_reader(tx);
            runtime.set_source(Box::new(feed));
        }
    }

    let deadline = (cli.duration > 0).then(|| Instant::now() + Duration::from_secs(cli.duration));
    while deadline.map_or(true, |d| Instant::now() < d) {
        runtime.process();
        if !runtime.connection().is_active() {
            info!("feed ended, stopping early");
            break;
        }
        thread::sleep(Duration::from_millis(20));
    }

    println!(
        "Processed {} readings, {} successful solves",
        runtime.readings_ingested(),
        runtime.solve_count()
    );
    println!("Final status:\n{}", runtime.snapshot().to_json());

    let csv = runtime.export_history_csv();
    if let Err(e) = fs::write(&cli.export, csv) {
        eprintln!("Could not write '{}': {}", cli.export.display(), e);
        return ExitCode::FAILURE;
    }
    println!(
        "Track written to {} ({} points)",
        cli.export.display(),
        runtime.position_history().len()
    );
    ExitCode::SUCCESS
}

fn load_config(path: Option<&Path>) -> Result<TrackerConfig, ConfigError> {
    match path {
        Some(path) => TrackerConfig::from_file(path),
        None => Ok(TrackerConfig::default()),
    }
}

/// Forwards stdin lines into the live feed until EOF or the feed is dropped
fn spawn_stdin_reader(tx: mpsc::Sender<String>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(_) => break,
            };
            if line.trim().is_empty() {
                continue;
            }
            if tx.send(line).is_err() {
                break;
            }
        }
    });
}
