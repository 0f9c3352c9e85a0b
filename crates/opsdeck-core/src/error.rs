// ── Core error types ──
//
// Resource-level failures surfaced to the operator as a single status
// line. Source-level failures never appear here: adapters turn those into
// `Placeholder`s before they leave the source.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Snapshot errors ──────────────────────────────────────────────
    #[error("cannot create snapshot directory {path}: {source}")]
    SnapshotDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write snapshot {path}: {source}")]
    SnapshotWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── External tool errors ─────────────────────────────────────────
    #[error("{name} not configured")]
    ToolNotConfigured { name: String },

    #[error("{name} not found: {path}")]
    ToolNotFound { name: String, path: PathBuf },

    #[error("{name} is not executable: {path}")]
    ToolNotExecutable { name: String, path: PathBuf },

    #[error("failed to launch {name}: {source}")]
    ToolSpawn {
        name: String,
        source: std::io::Error,
    },
}
