use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pult::capture::{FrameSource, OpenOutcome};
use pult::config::{ExportBackendKind, PipelineConfig};
use pult::console::{self, record::interrupt_flag, RecordOptions};
use pult::core::{EventLog, Pipeline, QualityMode};
use serde_json::json;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Operator console with video capture and export", long_about = None)]
struct Cli {
    /// JSON configuration file (defaults to <config dir>/pult/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write logs here instead of the default destination
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Override the export backend
    #[arg(long, global = true, value_enum)]
    backend: Option<ExportBackendKind>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive console (default)
    Run,
    /// Capture for a fixed time without a UI, then export
    Record {
        #[arg(short, long, default_value_t = 10)]
        seconds: u64,
        /// Record in low quality
        #[arg(long)]
        low: bool,
        /// Also save the last frame as PNG
        #[arg(long)]
        snapshot: bool,
    },
    /// Send a command packet, one command per argument or line
    Send {
        /// Commands such as "forward 2000" "right 90" "stop"; `-` reads stdin
        commands: Vec<String>,
    },
    /// Try to open the capture device and report the outcome
    Probe,
    /// Print the effective configuration
    Config,
}

fn init_logging(verbose: bool, file: Option<PathBuf>) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::from_default_env().add_directive(level.into());
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .with_env_filter(filter);

    match file {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run);

    // The console owns the terminal, so its logs go to a file
    let log_file = match (&command, cli.log_file) {
        (_, Some(path)) => Some(path),
        (Commands::Run, None) => Some(PathBuf::from("debug.log")),
        _ => None,
    };
    init_logging(cli.verbose, log_file)?;

    let mut config = PipelineConfig::discover(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(backend) = cli.backend {
        config.export.backend = backend;
    }
    info!("pult v{}", env!("CARGO_PKG_VERSION"));

    match command {
        Commands::Run => {
            let events = EventLog::new(config.event_log_lines);
            let pipeline = Pipeline::start(config, events)?;
            console::run(pipeline)?;
        }
        Commands::Record { seconds, low, snapshot } => {
            let running = interrupt_flag().context("Failed to install Ctrl-C handler")?;
            let events = EventLog::new(config.event_log_lines);
            let mut pipeline = Pipeline::start(config, events)?;

            let options = RecordOptions {
                duration: Duration::from_secs(seconds),
                quality: if low { QualityMode::Low } else { QualityMode::High },
                snapshot,
            };
            let summary = console::record(&mut pipeline, options, &running)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Send { commands } => {
            let text = if commands.iter().any(|c| c == "-") {
                std::io::read_to_string(std::io::stdin()).context("Failed to read commands from stdin")?
            } else {
                commands.join("\n")
            };
            let events = EventLog::new(config.event_log_lines);
            console::dispatch_packet(&text, &events);
            for entry in events.recent(events.len()) {
                println!("{}", entry);
            }
        }
        Commands::Probe => {
            let (source, outcome) = FrameSource::open(&config.capture);
            let (available, detail) = match outcome {
                OpenOutcome::Available(device) => (true, device),
                OpenOutcome::Unavailable(reason) => (false, reason),
            };
            println!(
                "{}",
                json!({
                    "device_index": config.capture.device_index,
                    "available": available,
                    "detail": detail,
                    "simulated": source.is_simulated(),
                })
            );
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_collects_commands() {
        let cli = Cli::parse_from(["pult", "send", "forward 2000", "right 90", "stop"]);
        match cli.command {
            Some(Commands::Send { commands }) => assert_eq!(commands, ["forward 2000", "right 90", "stop"]),
            _ => panic!("expected send"),
        }
    }

    #[test]
    fn log_file_receives_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.log");
        init_logging(false, Some(path.clone())).unwrap();

        tracing::info!("camera fallback engaged");
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("camera fallback engaged"), "{}", text);
    }
}
