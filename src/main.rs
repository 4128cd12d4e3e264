//! CLI Entry Point for ec-daq
//!
//! Provides command-line interface for:
//! - Acquiring measurements from a conductivity meter into a CSV log
//! - Inspecting supported meter models and visible serial ports
//! - Printing the effective configuration
//!
//! # Usage
//!
//! Acquire from the configured port:
//! ```bash
//! ec-daq run
//! ```
//!
//! Hardware-free dry run with the mock meter:
//! ```bash
//! ec-daq run --mock
//! ```
//!
//! See what is plugged in:
//! ```bash
//! ec-daq ports
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use ec_daq::acquisition::AcquisitionSession;
use ec_daq::adapters::{AdapterRegistry, DEFAULT_MODEL};
use ec_daq::config::Settings;
use ec_daq::sink::{log_has_rows, CsvSink};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "ec-daq")]
#[command(about = "Conductivity meter acquisition over serial", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Acquire measurements and append them to the CSV log
    Run {
        /// Config name under config/ (e.g. "lab" loads config/lab.toml)
        #[arg(long)]
        config: Option<String>,

        /// Use the mock meter instead of a serial port
        #[arg(long)]
        mock: bool,

        /// Serial port override (e.g. /dev/ttyUSB0)
        #[arg(long)]
        port: Option<String>,

        /// Meter model override (see `ec-daq adapters`)
        #[arg(long)]
        model: Option<String>,
    },

    /// List the supported meter models
    Adapters,

    /// List serial ports visible on this machine
    Ports,

    /// Print the effective configuration as JSON
    Config {
        /// Config name under config/ (e.g. "lab" loads config/lab.toml)
        #[arg(long)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            mock,
            port,
            model,
        } => run_acquisition(config, mock, port, model).await,
        Commands::Adapters => {
            list_adapters();
            Ok(())
        }
        Commands::Ports => list_ports(),
        Commands::Config { config } => show_config(config),
    }
}

/// RUST_LOG wins over the configured level, so a single run can be turned
/// verbose without touching the config file.
fn init_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run_acquisition(
    config: Option<String>,
    mock: bool,
    port: Option<String>,
    model: Option<String>,
) -> Result<()> {
    let mut settings = Settings::new(config.as_deref())?;
    if mock {
        settings.device.mock_data = true;
    }
    if let Some(port) = port {
        settings.serial.port = port;
    }
    if let Some(model) = model {
        settings.device.model = model;
    }
    settings.validate()?;

    init_tracing(&settings.log_level);

    // A log that already holds rows keeps its history; the mock backlog only
    // seeds a fresh file.
    let csv_path = PathBuf::from(&settings.storage.csv_path);
    if settings.device.mock_data && log_has_rows(&csv_path) {
        info!(path = %csv_path.display(), "Existing log found, skipping mock backlog");
        settings.device.mock_history_days = 0;
    }

    let registry = AdapterRegistry::with_builtin();
    let mut sink = CsvSink::create(&csv_path)?;

    let session = AcquisitionSession::new(&settings, &registry);
    let handle = session.spawn(move |measurement| {
        if let Err(err) = sink.append(&measurement) {
            error!(error = %err, "Failed to append measurement");
        }
    });

    let mut state_watch = handle.state_watch();
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C received, stopping acquisition");
            let state = handle.stop().await?;
            info!(?state, "Acquisition ended");
        }
        _ = state_watch.wait_for(|s| s.is_terminal()) => {
            let state = handle.wait().await?;
            info!(?state, "Acquisition ended");
        }
    }

    Ok(())
}

fn list_adapters() {
    let registry = AdapterRegistry::with_builtin();
    println!("Supported meter models:");
    for adapter in registry.iter() {
        let poll = match adapter.poll_command() {
            Some(cmd) => format!("polls with {:?}", String::from_utf8_lossy(cmd)),
            None => "push-style".to_string(),
        };
        let marker = if adapter.name() == DEFAULT_MODEL {
            " (default)"
        } else {
            ""
        };
        println!(
            "  {:<16} - {} [{}]{}",
            adapter.name(),
            adapter.description(),
            poll,
            marker
        );
    }
}

fn list_ports() -> Result<()> {
    println!("🔍 Scanning serial ports...");

    let ports = serialport::available_ports()?;
    if ports.is_empty() {
        println!("❌ No serial ports detected on this system.");
        return Ok(());
    }

    for port in ports {
        match port.port_type {
            serialport::SerialPortType::UsbPort(info) => {
                let product = info.product.unwrap_or_else(|| "unknown".to_string());
                println!(
                    "  {} - USB {:04x}:{:04x} ({})",
                    port.port_name, info.vid, info.pid, product
                );
            }
            other => {
                println!("  {} - {:?}", port.port_name, other);
            }
        }
    }
    Ok(())
}

fn show_config(config: Option<String>) -> Result<()> {
    let settings = Settings::new(config.as_deref())?;
    settings.validate()?;
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}
