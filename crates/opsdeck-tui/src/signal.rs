//! Termination signals → shutdown token.
//!
//! SIGINT, SIGTERM and SIGHUP all cancel the same token; every await
//! point in the main loop selects on it so the terminal is restored
//! whichever state the loop is in.

use std::io;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Install the handlers and spawn a task that cancels `shutdown` on the
/// first signal received.
///
/// Handlers are registered before this returns, so a signal arriving
/// right after startup is not lost.
#[cfg(unix)]
pub fn spawn_listener(shutdown: CancellationToken) -> io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sighup = signal(SignalKind::hangup())?;

    Ok(tokio::spawn(async move {
        let name = tokio::select! {
            () = shutdown.cancelled() => return,
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
            _ = sighup.recv() => "SIGHUP",
        };
        info!(signal = name, "received termination signal");
        shutdown.cancel();
    }))
}

#[cfg(not(unix))]
pub fn spawn_listener(shutdown: CancellationToken) -> io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        tokio::select! {
            () = shutdown.cancelled() => {}
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() {
                    info!("received ctrl-c");
                    shutdown.cancel();
                }
            }
        }
    }))
}
