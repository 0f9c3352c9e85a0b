//! Data sources: The uniform "fetch lines" contract and its five adapters.
//!
//! A [`Source`] never fails: whatever goes wrong (missing token, network
//! error, malformed payload) comes back as an [`Outcome::Unavailable`]
//! carrying a [`Placeholder`] that renders as a single readable line.

mod device;
mod github;
mod netlify;
mod network;
mod vercel;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::time::Duration;

use futures_util::future::BoxFuture;
use strum::{Display, EnumIter};

use crate::config::DashboardConfig;

pub use device::{BatteryStatus, DeviceSource, read_battery};
pub use github::GithubSource;
pub use netlify::NetlifySource;
pub use network::{NetworkSource, listening_ports, parse_lsof_listeners, parse_ss_listeners};
pub use vercel::VercelSource;

/// Identity of each monitored entity, in panel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
pub enum SourceId {
    #[strum(to_string = "GitHub")]
    Github,
    #[strum(to_string = "Vercel")]
    Vercel,
    #[strum(to_string = "Netlify")]
    Netlify,
    #[strum(to_string = "Device")]
    Device,
    #[strum(to_string = "Network")]
    Network,
}

/// How much a fetch should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    /// A handful of lines for the dashboard panel.
    Summary,
    /// A longer listing for the detail view.
    Full,
}

/// Line budget per depth, shared by every adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineLimits {
    pub summary: usize,
    pub full: usize,
}

impl LineLimits {
    pub fn for_depth(self, depth: Depth) -> usize {
        match depth {
            Depth::Summary => self.summary,
            Depth::Full => self.full,
        }
    }
}

impl From<&DashboardConfig> for LineLimits {
    fn from(cfg: &DashboardConfig) -> Self {
        Self {
            summary: cfg.lines_per_source.max(1),
            full: cfg.detail_lines.max(cfg.lines_per_source).max(1),
        }
    }
}

/// A synthetic line shown when a source cannot supply real data.
///
/// The three variants render distinguishably: "not configured",
/// "Failed to query …" and "timed out after …".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    /// A credential or required setting is absent.
    NotConfigured { reason: String },
    /// The query ran and failed.
    Failed { what: &'static str, reason: String },
    /// The fetch exceeded its time bound.
    TimedOut { after: Duration },
    /// A local collection from an earlier, timed-out fetch still holds
    /// the collector.
    Busy { what: &'static str },
}

impl Placeholder {
    pub fn not_configured(reason: impl Into<String>) -> Self {
        Self::NotConfigured {
            reason: reason.into(),
        }
    }

    /// Translate a client error, keeping transport timeouts distinct.
    pub fn from_api_error(err: &opsdeck_api::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::TimedOut { after: timeout }
        } else {
            Self::Failed {
                what: "API",
                reason: err.summary(),
            }
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured { reason } => write!(f, "not configured: {reason}"),
            Self::Failed { what, reason } => write!(f, "Failed to query {what}: {reason}"),
            Self::TimedOut { after } => {
                write!(f, "timed out after {}", humantime::format_duration(*after))
            }
            Self::Busy { what } => write!(f, "{what} busy: previous collection still running"),
        }
    }
}

/// Result of one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Lines(Vec<String>),
    Unavailable(Placeholder),
}

impl Outcome {
    /// Lines ready for display; never empty.
    pub fn display_lines(&self) -> Vec<String> {
        match self {
            Self::Lines(lines) if lines.is_empty() => vec!["(no data)".into()],
            Self::Lines(lines) => lines.clone(),
            Self::Unavailable(placeholder) => vec![placeholder.to_string()],
        }
    }

    pub fn placeholder(&self) -> Option<&Placeholder> {
        match self {
            Self::Unavailable(p) => Some(p),
            Self::Lines(_) => None,
        }
    }
}

/// Claim a collector shared across cycles without queueing behind a
/// collection that outlived its fetch. `None` while that one still runs.
fn try_claim<T>(collector: &Mutex<T>) -> Option<MutexGuard<'_, T>> {
    match collector.try_lock() {
        Ok(guard) => Some(guard),
        Err(TryLockError::Poisoned(e)) => Some(e.into_inner()),
        Err(TryLockError::WouldBlock) => None,
    }
}

/// The uniform fetch contract every monitored entity implements.
///
/// `fetch` must resolve to an [`Outcome`] for every failure mode; it is
/// dropped (cancelled) by the scheduler if it outlives its timeout.
pub trait Source: Send + Sync {
    fn id(&self) -> SourceId;

    fn fetch(&self, depth: Depth) -> BoxFuture<'_, Outcome>;
}

/// Build the five standard sources from configuration, in panel order.
pub fn default_sources(cfg: &DashboardConfig) -> Vec<Arc<dyn Source>> {
    let limits = LineLimits::from(cfg);
    vec![
        Arc::new(GithubSource::new(&cfg.github, cfg.fetch_timeout, limits)),
        Arc::new(VercelSource::new(&cfg.vercel, cfg.fetch_timeout, limits)),
        Arc::new(NetlifySource::new(&cfg.netlify, cfg.fetch_timeout, limits)),
        Arc::new(DeviceSource::new(limits)),
        Arc::new(NetworkSource::new(limits)),
    ]
}

/// Transport settings for the remote adapters.
///
/// The HTTP timeout matches the scheduler's bound so an expiring request
/// surfaces as `TimedOut` whichever side notices first.
pub(crate) fn transport_for(timeout: Duration) -> opsdeck_api::TransportConfig {
    opsdeck_api::TransportConfig {
        timeout,
        ..opsdeck_api::TransportConfig::default()
    }
}
