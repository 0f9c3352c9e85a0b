// ── Raw packet scan ──
//
// Runs the configured capture command to completion (or its timeout)
// and returns its combined output as display lines. Every failure is a
// line too; the sub-view always has something to show.

use std::process::Stdio;

use tokio::process::Command;
use tracing::{info, warn};

use crate::config::PacketScanSettings;

/// Run the capture and collect stdout then stderr as lines.
///
/// The child is killed if the timeout elapses first.
pub async fn run_packet_scan(settings: &PacketScanSettings) -> Vec<String> {
    let Some((program, args)) = settings.command.split_first() else {
        return vec!["packet scan unavailable: no command configured".into()];
    };

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();
    let child = match child {
        Ok(child) => child,
        Err(e) => {
            warn!(program, error = %e, "packet scan failed to start");
            return vec![format!("packet scan unavailable: {program}: {e}")];
        }
    };

    let output = match tokio::time::timeout(settings.timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return vec![format!("packet scan unavailable: {e}")],
        Err(_) => {
            info!(program, "packet scan timed out");
            return vec![format!(
                "packet scan timed out after {}",
                humantime::format_duration(settings.timeout)
            )];
        }
    };

    let mut lines: Vec<String> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .chain(String::from_utf8_lossy(&output.stderr).lines())
        .map(str::to_owned)
        .collect();
    if !output.status.success() {
        lines.push(format!("{program} exited with {}", output.status));
    }
    if lines.is_empty() {
        lines.push("(no packets captured)".into());
    }
    lines
}
