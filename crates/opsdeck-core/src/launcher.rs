// ── External tool launching ──
//
// Configured helper programs are started detached from the terminal:
// null stdio, their own process group, and a background task that reaps
// the child only to log how it exited. The caller never waits.

use std::fmt;
use std::path::Path;
use std::process::Stdio;

use strum::Display;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::ToolSettings;
use crate::error::CoreError;

/// The two helper slots bound to the `a` and `b` keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Tool {
    #[strum(to_string = "tool A")]
    A,
    #[strum(to_string = "tool B")]
    B,
}

impl Tool {
    pub fn path(self, tools: &ToolSettings) -> Option<&Path> {
        match self {
            Self::A => tools.tool_a.as_deref(),
            Self::B => tools.tool_b.as_deref(),
        }
    }
}

/// A successfully started process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launched {
    pub name: String,
    pub pid: Option<u32>,
}

impl fmt::Display for Launched {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pid {
            Some(pid) => write!(f, "{} launched (pid {pid})", self.name),
            None => write!(f, "{} launched", self.name),
        }
    }
}

/// Launch a configured tool slot.
pub fn launch_tool(tool: Tool, tools: &ToolSettings) -> Result<Launched, CoreError> {
    launch_detached(&tool.to_string(), tool.path(tools))
}

/// Start `path` detached if it exists and is executable.
///
/// Must be called from within a Tokio runtime; the reaper task is
/// spawned onto it.
pub fn launch_detached(name: &str, path: Option<&Path>) -> Result<Launched, CoreError> {
    let Some(path) = path else {
        return Err(CoreError::ToolNotConfigured { name: name.into() });
    };
    check_executable(name, path)?;

    let mut cmd = Command::new(path);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd.spawn().map_err(|source| CoreError::ToolSpawn {
        name: name.into(),
        source,
    })?;
    let pid = child.id();
    info!(tool = name, path = %path.display(), ?pid, "tool launched");

    let tool = name.to_owned();
    tokio::spawn(async move {
        match child.wait().await {
            Ok(status) if status.success() => debug!(tool = %tool, %status, "tool exited"),
            Ok(status) => warn!(tool = %tool, %status, "tool exited unsuccessfully"),
            Err(e) => warn!(tool = %tool, error = %e, "failed to reap tool"),
        }
    });

    Ok(Launched {
        name: name.into(),
        pid,
    })
}

fn check_executable(name: &str, path: &Path) -> Result<(), CoreError> {
    let metadata = std::fs::metadata(path).map_err(|_| CoreError::ToolNotFound {
        name: name.into(),
        path: path.to_path_buf(),
    })?;
    if !metadata.is_file() || !is_executable(&metadata) {
        return Err(CoreError::ToolNotExecutable {
            name: name.into(),
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    true
}
