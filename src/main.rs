/*!
 * Homewatch CLI - Command Line Interface
 */

use clap::{Parser, Subcommand, ValueEnum};
use homewatch::{
    cli_style::{
        self, alarm_line, connection_line, format_duration, history_table, print_error,
        print_info, print_success, print_warning, section_header, sensor_table, stats_table,
    },
    config::WatchConfig,
    error::{HomewatchError, Result, EXIT_SUCCESS},
    logging, Watcher,
};
use homewatch_connect::{HttpTransport, StatusTransport};
use homewatch_core_sensors::{SensorId, SensorStatus};
use homewatch_sentinel::{EngineView, PassOutcome};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "homewatch")]
#[command(version, about = "Smart home sensor alerts: polls the status source and raises a dismissable alarm", long_about = None)]
struct Cli {
    /// Configuration file (default: per-user config dir)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Base URL of the status source
    #[arg(long, value_name = "URL", global = true)]
    url: Option<String>,

    /// Milliseconds between polls
    #[arg(long = "interval-ms", value_name = "MS", global = true)]
    interval_ms: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write JSON logs to this file instead of stderr
    #[arg(long, value_name = "FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll continuously and raise an alarm when a sensor reports ALERT
    Watch,

    /// Fetch the current sensor status once
    Status,

    /// Ask the status source to reset every sensor to OK
    Reset,

    /// Set a sensor on the status source (for testing the alarm)
    Simulate {
        #[arg(value_enum)]
        sensor: SensorArg,

        #[arg(value_enum)]
        state: StateArg,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum SensorArg {
    Smoke,
    Gas,
    Doorbell,
}

impl From<SensorArg> for SensorId {
    fn from(arg: SensorArg) -> Self {
        match arg {
            SensorArg::Smoke => SensorId::Smoke,
            SensorArg::Gas => SensorId::Gas,
            SensorArg::Doorbell => SensorId::Doorbell,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum StateArg {
    Ok,
    Alert,
}

impl From<StateArg> for SensorStatus {
    fn from(arg: StateArg) -> Self {
        match arg {
            StateArg::Ok => SensorStatus::Ok,
            StateArg::Alert => SensorStatus::Alert,
        }
    }
}

fn main() {
    let code = match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            debug!(category = %e.category(), transient = e.is_transient(), "Command failed");
            print_error(&e.to_string(), e.hint());
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init { force } = cli.command {
        return handle_init(cli.config, force);
    }

    let config = load_config(&cli)?;
    logging::init_logging(&config)?;
    debug!(?config, "Configuration loaded");

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| HomewatchError::Other(format!("Failed to start async runtime: {}", e)))?;

    let result = runtime.block_on(async {
        match cli.command {
            Commands::Watch => handle_watch(&config).await,
            Commands::Status => handle_status(&config).await,
            Commands::Reset => handle_reset(&config).await,
            Commands::Simulate { sensor, state } => {
                handle_simulate(&config, sensor.into(), state.into()).await
            }
            Commands::Init { .. } => Ok(()),
        }
    });

    // The stdin reader sits in a blocking read; don't wait for it
    runtime.shutdown_timeout(Duration::from_millis(200));
    result
}

/// Config file values, then command-line overrides
fn load_config(cli: &Cli) -> Result<WatchConfig> {
    let mut config = WatchConfig::load(cli.config.as_deref())?;

    if let Some(ref url) = cli.url {
        config.base_url = url.clone();
    }
    if let Some(interval_ms) = cli.interval_ms {
        config.poll_interval_ms = interval_ms;
    }
    if cli.verbose {
        config.verbose = true;
    }
    if let Some(ref log_file) = cli.log_file {
        config.log_file = Some(log_file.clone());
    }

    config.validate()?;
    Ok(config)
}

fn handle_init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path
        .or_else(WatchConfig::default_path)
        .ok_or_else(|| HomewatchError::Config("No config directory on this system".into()))?;

    if path.exists() && !force {
        return Err(HomewatchError::ConfigExists(path));
    }

    WatchConfig::default().to_file(&path)?;
    print_success(&format!("Wrote default configuration to {}", path.display()));
    Ok(())
}

async fn handle_status(config: &WatchConfig) -> Result<()> {
    let watcher = Watcher::from_config(config)?;

    match watcher.refresh().await {
        PassOutcome::Failed(e) => return Err(e.into()),
        outcome => debug!(?outcome, "Status fetched"),
    }

    let view = watcher.view();
    println!("{}", connection_line(&view));
    println!("{}", sensor_table(&view));
    println!("{}", alarm_line(&view));
    Ok(())
}

async fn handle_reset(config: &WatchConfig) -> Result<()> {
    config.validate()?;
    let transport = HttpTransport::new(config.transport_config())?;
    transport.send_reset().await?;
    print_success("All sensors reset to OK");
    Ok(())
}

async fn handle_simulate(
    config: &WatchConfig,
    sensor: SensorId,
    status: SensorStatus,
) -> Result<()> {
    let transport = HttpTransport::new(config.transport_config())?;
    transport.trigger(&sensor, status).await?;
    print_success(&format!("{} set to {}", sensor.display_name(), status));
    Ok(())
}

/// Keys typed on stdin, one per line
fn spawn_key_reader() -> mpsc::Receiver<char> {
    let (tx, rx) = mpsc::channel(8);

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if let Some(key) = line.trim().chars().next() {
                if tx.send(key.to_ascii_lowercase()).await.is_err() {
                    break;
                }
            }
        }
    });

    rx
}

/// Whether two views differ in anything worth redrawing
fn needs_redraw(previous: Option<&EngineView>, current: &EngineView) -> bool {
    match previous {
        None => true,
        Some(prev) => {
            prev.snapshot != current.snapshot
                || prev.connectivity != current.connectivity
                || prev.engaged != current.engaged
                || prev.source_updated != current.source_updated
        }
    }
}

fn render(view: &EngineView) {
    println!();
    println!("{}", connection_line(view));
    println!("{}", sensor_table(view));
    println!("{}", alarm_line(view));
}

async fn handle_watch(config: &WatchConfig) -> Result<()> {
    let mut watcher = Watcher::from_config(config)?;
    let mut views = watcher.subscribe();
    let mut keys = spawn_key_reader();
    let mut keys_open = true;
    let mut last_rendered: Option<EngineView> = None;

    cli_style::print_banner(watcher.endpoint());
    watcher.activate();

    loop {
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                if needs_redraw(last_rendered.as_ref(), &view) {
                    render(&view);
                    last_rendered = Some(view);
                }
            }
            key = keys.recv(), if keys_open => match key {
                Some('d') => {
                    let outcome = watcher.dismiss().await;
                    if outcome.reset_confirmed {
                        print_success("Alarm dismissed");
                    } else {
                        print_warning(&format!(
                            "Alarm dismissed locally; reset failed: {}",
                            outcome.reset_error.as_deref().unwrap_or("unknown error")
                        ));
                    }
                }
                Some('r') => match watcher.refresh().await {
                    PassOutcome::Skipped => print_info("A poll is already in progress"),
                    PassOutcome::Failed(e) => print_warning(&e.to_string()),
                    _ => {}
                },
                Some('h') => {
                    section_header("History");
                    let entries = watcher.history(20).await;
                    if entries.is_empty() {
                        print_info("No events yet");
                    } else {
                        println!("{}", history_table(&entries));
                    }
                }
                Some('s') => {
                    section_header("Statistics");
                    println!("{}", stats_table(&watcher.stats().await));
                }
                Some('q') => break,
                Some(other) => print_info(&format!("Unknown key '{}'", other)),
                None => {
                    debug!("stdin closed, keys disabled");
                    keys_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    watcher.deactivate().await;

    let stats = watcher.stats().await;
    info!("📊 {}", stats.summary());
    if let Some(duration) = stats.last_pass_duration {
        debug!("Last poll took {}", format_duration(duration.as_secs_f64()));
    }
    Ok(())
}
