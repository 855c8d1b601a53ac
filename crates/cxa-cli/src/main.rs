//! CXA Bridge CLI - serial-to-HTTP bridge for Cambridge Audio CXA amplifiers
//!
//! Opens the amplifier's serial port, keeps a cached view of its state from
//! the replies it sends, and serves that state plus power/mute/source
//! control over HTTP.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use cxa_bridge::{Amplifier, HttpServer, ReplyListener, Simulator};
use cxa_transport::{MemoryTransport, SerialTransport, TransportReceiver, TransportSender};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

use config::{FileConfig, Overrides, Settings};

/// Serial-to-HTTP bridge for Cambridge Audio CXA61/CXA81 amplifiers
#[derive(Parser)]
#[command(name = "cxa-bridge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "CXA_CONFIG")]
    config: Option<PathBuf>,

    /// Serial port the amplifier is connected to [default: /dev/ttyUSB0]
    #[arg(short, long, env = "CXA_PORT")]
    port: Option<String>,

    /// Serial baud rate [default: 9600]
    #[arg(long)]
    baud: Option<u32>,

    /// HTTP listen address [default: 0.0.0.0:8080]
    #[arg(short, long, env = "CXA_BIND")]
    bind: Option<String>,

    /// Username for HTTP Basic authentication
    #[arg(long, env = "CXA_USER")]
    user: Option<String>,

    /// Password for HTTP Basic authentication
    #[arg(long, env = "CXA_PWD", hide_env_values = true)]
    pwd: Option<String>,

    /// Enable permissive CORS
    #[arg(long)]
    cors: bool,

    /// Ignore mute and source changes while the amplifier is in standby
    #[arg(long)]
    gate_on_power: bool,

    /// Stop when the amplifier sends a read with no valid frame
    #[arg(long)]
    strict_frames: bool,

    /// Answer with a simulated amplifier instead of opening the serial port
    #[arg(long)]
    dry_run: bool,

    /// List available serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(&cli.log_level, cli.json_logs)?;

    if cli.list_ports {
        return print_ports();
    }

    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(
        file,
        Overrides {
            port: cli.port,
            baud: cli.baud,
            bind: cli.bind,
            user: cli.user,
            pwd: cli.pwd,
            cors: cli.cors,
            gate_on_power: cli.gate_on_power,
            strict_frames: cli.strict_frames,
        },
    );

    // Handle Ctrl+C
    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal"),
            Err(e) => warn!("Failed to listen for ctrl+c: {}", e),
        }
        shutdown.cancel();
    });

    if cli.dry_run {
        println!("{} Using simulated amplifier", "CXA".cyan().bold());
        let (sender, receiver, device) = MemoryTransport::pair();
        let simulator = Simulator::new(device).spawn(cancel.child_token());
        run_bridge(&settings, sender, receiver, cancel).await?;
        let _ = simulator.await;
    } else {
        println!(
            "{} Opening {} @ {} baud",
            "CXA".cyan().bold(),
            settings.port.yellow(),
            settings.serial.baud_rate
        );
        let (sender, receiver) =
            SerialTransport::connect_with_config(&settings.port, settings.serial.clone())
                .await
                .with_context(|| format!("Failed to open serial port {}", settings.port))?;
        run_bridge(&settings, sender, receiver, cancel).await?;
    }

    println!("{}", "Bridge stopped".yellow());
    Ok(())
}

fn setup_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Failed to parse log level")?;

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).compact())
            .init();
    }

    Ok(())
}

fn print_ports() -> Result<()> {
    let ports = SerialTransport::list_ports()?;
    if ports.is_empty() {
        println!("{}", "No serial ports found".yellow());
    }
    for port in ports {
        println!("  {}", port);
    }
    Ok(())
}

/// Run listener and HTTP server until cancelled or the amplifier goes away
async fn run_bridge<S, R>(
    settings: &Settings,
    sender: S,
    receiver: R,
    cancel: CancellationToken,
) -> Result<()>
where
    S: TransportSender + 'static,
    R: TransportReceiver + 'static,
{
    let amp = Amplifier::new(sender, settings.amplifier.clone());

    let mut listener = ReplyListener::new(receiver, amp.store().clone())
        .with_policy(settings.malformed_frames)
        .spawn(cancel.child_token());

    amp.query_state()
        .await
        .context("Failed to query amplifier state")?;

    let mut server = HttpServer::new(amp.clone(), settings.http.clone());
    let addr = server.start().await.context("Failed to start HTTP server")?;

    println!("{} HTTP API listening on {}", "OK".green().bold(), addr);
    println!("  GET  /status   - Current power, mute and source");
    println!("  POST /status   - Set Power, Mute and Source");
    println!("  POST /source   - Select input");
    println!("  GET  /version  - Protocol and firmware version");
    if settings.http.auth.is_some() {
        println!("  Basic authentication required (except /health)");
    }
    println!("  Press Ctrl+C to stop");

    let stopped_early = tokio::select! {
        _ = cancel.cancelled() => None,
        joined = &mut listener => Some(joined),
    };

    server.stop().await?;

    match stopped_early {
        Some(joined) => {
            cancel.cancel();
            joined
                .context("Reply listener panicked")?
                .context("Lost connection to amplifier")?;
        }
        None => {
            listener.await.context("Reply listener panicked")??;
        }
    }

    Ok(())
}
