//! # pimqtt-agent
//!
//! Daemon binary: loads settings, resolves the camera capability, and runs
//! one command session until a stop signal or a connection failure.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use pimqtt_core::constants::VERSION;
use pimqtt_core::logging::init_subscriber;
use pimqtt_settings::load_settings;
use pimqtt_session::{CommandSession, ShutdownCoordinator, camera};

/// MQTT command and telemetry daemon.
#[derive(Parser, Debug)]
#[command(name = "pimqtt-agent", version, about = "MQTT command and telemetry daemon")]
struct Cli {
    /// Settings file (defaults to `~/.pimqtt/settings.json`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter such as `debug` or `pimqtt_session=trace`. `RUST_LOG` wins.
    #[arg(long)]
    log_level: Option<String>,

    /// Validate settings, print them with secrets redacted, and exit.
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let settings = load_settings(args.config.as_deref()).context("Failed to load settings")?;
    init_subscriber(args.log_level.as_deref().unwrap_or(&settings.logging.level));

    if args.check_config {
        let rendered = serde_json::to_string_pretty(&settings.redacted())
            .context("Failed to render settings")?;
        println!("{rendered}");
        return Ok(());
    }

    tracing::info!(version = VERSION, "starting pimqtt agent");
    let camera = camera::probe(&settings.camera);
    let session = CommandSession::new(settings, camera);
    tracing::info!(
        client_id = session.client_id(),
        node_id = session.node_id(),
        "session configured"
    );

    let stop_timeout = session.stop_timeout();
    let coordinator = ShutdownCoordinator::new();
    let mut handle = tokio::spawn(session.run(coordinator.token()));

    tokio::select! {
        joined = &mut handle => {
            // The session ended without a stop request: connect failure or lost connection.
            joined
                .context("Session task panicked")?
                .context("Session ended")?;
            bail!("session ended unexpectedly");
        }
        signal = wait_for_signal() => signal?,
    }

    tracing::info!("Shutting down...");
    match coordinator.graceful_shutdown(handle, Some(stop_timeout)).await {
        Some(result) => result.context("Session failed during shutdown")?,
        None => bail!("session did not stop cleanly"),
    }
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolve on Ctrl-C, or SIGTERM on Unix.
async fn wait_for_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res.context("Failed to listen for ctrl-c")?,
            _ = terminate.recv() => tracing::info!("received SIGTERM"),
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;
    Ok(())
}
