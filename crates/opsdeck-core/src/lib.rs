//! Polling engine behind the opsdeck dashboard.
//!
//! Everything here is terminal-agnostic:
//!
//! - **[`sources`]**: The [`Source`] contract and its five adapters
//!   (GitHub Actions, Vercel, Netlify, local device, local network). A
//!   source never fails; problems come back as a [`Placeholder`] line.
//!
//! - **[`FetchScheduler`]**: Runs one bounded fetch per source
//!   concurrently and joins them into a [`CycleReport`]. Also serves
//!   single-source fetches for detail views.
//!
//! - **[`SnapshotLogger`]**: Appends each cycle's lines to a dated,
//!   owner-only log file.
//!
//! - **[`launcher`] / [`scan`]**: Detached helper-tool launches and the
//!   bounded packet capture behind the scan sub-view.
//!
//! Configuration arrives as one immutable [`DashboardConfig`]; this crate
//! never reads files or the environment on its own.

pub mod config;
pub mod convert;
pub mod error;
pub mod fmt;
pub mod launcher;
pub mod scan;
pub mod scheduler;
pub mod snapshot;
pub mod sources;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{
    DashboardConfig, GithubSettings, NetlifySettings, PacketScanSettings, ToolSettings,
    VercelSettings,
};
pub use error::CoreError;
pub use launcher::{Launched, Tool, launch_detached, launch_tool};
pub use scan::run_packet_scan;
pub use scheduler::{CycleReport, FetchScheduler, SourceResult};
pub use snapshot::{Snapshot, SnapshotLogger};
pub use sources::{Depth, LineLimits, Outcome, Placeholder, Source, SourceId};
