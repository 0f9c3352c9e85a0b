//! `opsdeck`: Terminal status dashboard.
//!
//! Polls GitHub Actions, Vercel and Netlify alongside local device and
//! network facts, lays them out in three panels, and refreshes on a
//! fixed interval or on a key press. Every cycle is appended to a dated
//! snapshot file.
//!
//! Diagnostics go to a log file (default `<tmp>/opsdeck.log`) so the
//! screen stays clean.
//!
//! Entry point: CLI parsing, config loading, tracing setup, panic hooks,
//! signal handling and the main loop.

mod app;
mod command;
mod event;
mod layout;
mod render;
mod signal;
mod theme;
mod tui;

use std::ffi::OsStr;
use std::path::Path;

use clap::Parser;
use color_eyre::eyre::Result;
use opsdeck_config::{Config, ConfigError};
use opsdeck_core::DashboardConfig;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::event::EventReader;
use crate::tui::Tui;

/// Terminal status dashboard for CI builds, deployments and the local machine.
///
/// Settings come from the config file in the platform config dir and
/// `OPSDECK_*` environment variables.
#[derive(Parser, Debug)]
#[command(name = "opsdeck", version, about)]
struct Cli {}

/// Crates whose events reach the log at the configured level.
const LOG_TARGETS: &[&str] = &["opsdeck", "opsdeck_core", "opsdeck_api", "opsdeck_config"];

/// Build the filter: `RUST_LOG` wins over `log_level`. A bare level
/// applies to our crates only; anything else is used as-is.
fn log_filter(level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    if level.contains(['=', ',']) {
        return EnvFilter::new(level);
    }
    let directives: Vec<String> = LOG_TARGETS.iter().map(|t| format!("{t}={level}")).collect();
    EnvFilter::new(format!("warn,{}", directives.join(",")))
}

/// Set up file-based tracing. Nothing may log to stdout/stderr while the
/// dashboard owns the terminal. The returned guard flushes on drop.
fn setup_tracing(log_file: &Path, filter: EnvFilter) -> WorkerGuard {
    let log_dir = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(std::env::temp_dir, Path::to_path_buf);
    let log_name = log_file
        .file_name()
        .unwrap_or_else(|| OsStr::new("opsdeck.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_name);
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

fn load() -> (Config, Option<ConfigError>) {
    match opsdeck_config::load_config() {
        Ok(cfg) => (cfg, None),
        Err(e) => (Config::default(), Some(e)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _cli = Cli::parse();
    tui::install_hooks()?;

    let (file_cfg, load_error) = load();
    let _log_guard = setup_tracing(
        &file_cfg.diagnostics_log,
        log_filter(&file_cfg.log_level),
    );

    info!(version = env!("CARGO_PKG_VERSION"), "opsdeck starting");
    if let Some(e) = load_error {
        warn!(error = %e, "config unreadable, using defaults");
    }

    let dashboard = opsdeck_config::to_dashboard_config(&file_cfg).unwrap_or_else(|e| {
        warn!(error = %e, "invalid config, using defaults");
        DashboardConfig::default()
    });
    info!(
        refresh_secs = dashboard.refresh_interval.as_secs(),
        fetch_timeout_ms = u64::try_from(dashboard.fetch_timeout.as_millis()).unwrap_or(u64::MAX),
        github = dashboard.github.token.is_some(),
        vercel = dashboard.vercel.token.is_some(),
        netlify = dashboard.netlify.token.is_some(),
        snapshot_dir = %dashboard.snapshot_dir.display(),
        "configuration resolved"
    );

    let shutdown = CancellationToken::new();
    let _signals = signal::spawn_listener(shutdown.clone())?;

    let mut app = App::new(&dashboard, shutdown.clone());
    let mut tui = Tui::new()?;
    tui.enter()?;
    let mut events = EventReader::new();

    let reason = app.run(&mut tui.terminal, &mut events).await;

    events.stop();
    shutdown.cancel();
    tui.exit();

    info!(?reason, "opsdeck stopped");
    Ok(())
}
