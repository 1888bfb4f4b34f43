//! `netpulse`: live terminal dashboard for network telemetry.
//!
//! Shows CPU, memory and packet-loss series for the selected device next
//! to the most recent alerts, all kept current by `netpulse-core`'s
//! [`SyncEngine`](netpulse_core::SyncEngine). Times are shown in US
//! Eastern time.
//!
//! Logs go to a file (default `/tmp/netpulse.log`) so they never corrupt
//! the terminal.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use secrecy::SecretString;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use netpulse_config::Overrides;
use netpulse_core::SyncEngine;

use crate::app::App;

/// Live network telemetry dashboard.
#[derive(Parser, Debug)]
#[command(name = "netpulse", version, about)]
struct Cli {
    /// Monitoring backend URL (e.g., http://localhost:8000)
    #[arg(short = 'u', long, env = "NETPULSE_URL")]
    url: Option<String>,

    /// API key sent as X-API-KEY; overrides every configured source
    #[arg(short = 'k', long)]
    api_key: Option<String>,

    /// Config profile to use
    #[arg(short = 'p', long, env = "NETPULSE_PROFILE")]
    profile: Option<String>,

    /// Config file path (defaults to the platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seconds between automatic refreshes
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,

    /// HTTP request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Write a starter config for --url and exit
    #[arg(long, requires = "url")]
    init: bool,

    /// Log file path
    #[arg(long, default_value = "/tmp/netpulse.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            profile: self.profile.clone(),
            base_url: self.url.clone(),
            api_key: self.api_key.clone().map(SecretString::from),
            timeout_secs: self.timeout,
            refresh_interval_secs: self.interval,
        }
    }
}

/// File-based tracing; stdout belongs to the TUI. Hold the returned guard
/// until exit so buffered lines are flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives = ["netpulse_tui", "netpulse_core", "netpulse_api", "netpulse_config"]
            .map(|target| format!("{target}={log_level}"))
            .join(",");
        EnvFilter::new(directives)
    });

    let log_dir = cli.log_file.parent().unwrap_or(Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("netpulse.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hooks go in before the terminal is touched.
    tui::install_hooks()?;
    let _log_guard = setup_tracing(&cli);

    let path = cli.config.clone().unwrap_or_else(netpulse_config::config_path);

    if cli.init {
        let url = cli.url.as_deref().ok_or_else(|| eyre!("--init needs --url"))?;
        netpulse_config::init_config(&path, url)?;
        println!("Wrote {}", path.display());
        println!(
            "Set {} or store a key in the system keyring, then run netpulse.",
            netpulse_config::API_KEY_ENV
        );
        return Ok(());
    }

    // Priority: CLI flags > profile > [defaults]
    let cfg = netpulse_config::load_config_from(&path)?;
    let config = netpulse_config::resolve_engine_config(&cfg, &cli.overrides(), &path)?;

    info!(
        url = %config.base_url,
        interval = ?config.refresh_interval,
        "starting netpulse"
    );

    let engine = SyncEngine::connect(&config)?;
    let mut app = App::new(engine);
    app.run().await?;

    Ok(())
}
