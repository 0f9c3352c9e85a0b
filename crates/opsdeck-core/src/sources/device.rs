use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use sysinfo::System;
use tracing::{debug, warn};

use super::{Depth, LineLimits, Outcome, Placeholder, Source, SourceId, try_claim};
use crate::fmt::{fmt_bytes_short, fmt_uptime};

const POWER_SUPPLY_DIR: &str = "/sys/class/power_supply";

/// Local host telemetry: identity, uptime, load, memory, CPU and battery.
///
/// The `System` handle is kept across cycles so CPU usage is measured
/// between two consecutive refreshes rather than from boot.
pub struct DeviceSource {
    system: Arc<Mutex<System>>,
    power_supply_dir: PathBuf,
    limits: LineLimits,
}

impl DeviceSource {
    pub fn new(limits: LineLimits) -> Self {
        Self::with_power_supply_dir(limits, POWER_SUPPLY_DIR)
    }

    pub fn with_power_supply_dir(limits: LineLimits, dir: impl Into<PathBuf>) -> Self {
        Self {
            system: Arc::new(Mutex::new(System::new())),
            power_supply_dir: dir.into(),
            limits,
        }
    }
}

impl Source for DeviceSource {
    fn id(&self) -> SourceId {
        SourceId::Device
    }

    fn fetch(&self, depth: Depth) -> BoxFuture<'_, Outcome> {
        let system = Arc::clone(&self.system);
        let dir = self.power_supply_dir.clone();
        let limit = self.limits.for_depth(depth);
        async move {
            let joined = tokio::task::spawn_blocking(move || {
                let mut sys = try_claim(&*system)?;
                Some(collect(&mut sys, &dir, depth))
            })
            .await;
            match joined {
                Ok(Some(mut lines)) => {
                    lines.truncate(limit);
                    Outcome::Lines(lines)
                }
                Ok(None) => {
                    debug!(source = "device", "previous collection still running");
                    Outcome::Unavailable(Placeholder::Busy {
                        what: "device telemetry",
                    })
                }
                Err(e) => {
                    warn!(source = "device", error = %e, "telemetry task failed");
                    Outcome::Unavailable(Placeholder::Failed {
                        what: "device telemetry",
                        reason: e.to_string(),
                    })
                }
            }
        }
        .boxed()
    }
}

fn collect(sys: &mut System, power_supply_dir: &Path, depth: Depth) -> Vec<String> {
    sys.refresh_memory();
    sys.refresh_cpu_usage();

    let host = System::host_name().unwrap_or_else(|| "unknown".into());
    let os = System::long_os_version().unwrap_or_else(|| "unknown OS".into());
    let load = System::load_average();
    let total = sys.total_memory();
    let used = sys.used_memory();
    let pct = if total == 0 { 0 } else { used * 100 / total };

    let battery = read_battery(power_supply_dir)
        .map_or_else(|| "no battery".to_owned(), |b| b.to_string());

    let mut lines = vec![
        format!("host   {host} · {os}"),
        format!(
            "uptime {} · load {:.2} {:.2} {:.2}",
            fmt_uptime(System::uptime()),
            load.one,
            load.five,
            load.fifteen
        ),
        format!(
            "mem    {}/{} ({pct}%)",
            fmt_bytes_short(used),
            fmt_bytes_short(total)
        ),
        format!(
            "cpu    {:.0}% · {} cores",
            sys.global_cpu_usage(),
            sys.cpus().len()
        ),
        format!("power  {battery}"),
    ];

    if depth == Depth::Full {
        lines.push(format!(
            "swap   {}/{}",
            fmt_bytes_short(sys.used_swap()),
            fmt_bytes_short(sys.total_swap())
        ));
        lines.push(format!(
            "kernel {}",
            System::kernel_version().unwrap_or_else(|| "unknown".into())
        ));
    }

    lines
}

/// First battery found under a `power_supply` sysfs directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatteryStatus {
    pub name: String,
    pub capacity: Option<u8>,
    pub status: Option<String>,
}

impl std::fmt::Display for BatteryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.capacity {
            Some(pct) => write!(f, "{pct}%")?,
            None => write!(f, "?%")?,
        }
        if let Some(ref status) = self.status {
            write!(f, " · {status}")?;
        }
        Ok(())
    }
}

/// Read `BAT*/capacity` and `BAT*/status` below `dir`.
///
/// Returns `None` when the directory is missing or holds no battery.
pub fn read_battery(dir: &Path) -> Option<BatteryStatus> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with("BAT"))
        .collect();
    names.sort();
    let name = names.into_iter().next()?;

    let read = |file: &str| {
        std::fs::read_to_string(dir.join(&name).join(file))
            .ok()
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
    };

    Some(BatteryStatus {
        capacity: read("capacity").and_then(|c| c.parse().ok()),
        status: read("status"),
        name,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const LIMITS: LineLimits = LineLimits { summary: 6, full: 30 };

    fn write_battery(root: &Path, name: &str, capacity: &str, status: &str) {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("capacity"), capacity).unwrap();
        std::fs::write(dir.join("status"), status).unwrap();
    }

    #[test]
    fn battery_read_from_sysfs_layout() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("AC")).unwrap();
        write_battery(root.path(), "BAT1", "40\n", "Charging\n");
        write_battery(root.path(), "BAT0", "87\n", "Discharging\n");

        let battery = read_battery(root.path()).unwrap();
        assert_eq!(battery.name, "BAT0");
        assert_eq!(battery.capacity, Some(87));
        assert_eq!(battery.to_string(), "87% · Discharging");
    }

    #[test]
    fn no_battery_directory() {
        let root = tempfile::tempdir().unwrap();
        assert!(read_battery(root.path()).is_none());
        assert!(read_battery(&root.path().join("missing")).is_none());
    }

    #[test]
    fn unreadable_capacity_shows_unknown() {
        let root = tempfile::tempdir().unwrap();
        write_battery(root.path(), "BAT0", "n/a", "Full");
        assert_eq!(read_battery(root.path()).unwrap().to_string(), "?% · Full");
    }

    #[tokio::test]
    async fn fetch_yields_live_lines() {
        let root = tempfile::tempdir().unwrap();
        let source = DeviceSource::with_power_supply_dir(LIMITS, root.path());

        let lines = match source.fetch(Depth::Summary).await {
            Outcome::Lines(lines) => lines,
            other => panic!("expected live lines, got {other:?}"),
        };
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("host"));
        assert_eq!(lines[4], "power  no battery");
    }

    #[tokio::test]
    async fn full_depth_adds_rows() {
        let root = tempfile::tempdir().unwrap();
        let source = DeviceSource::with_power_supply_dir(LIMITS, root.path());
        let lines = source.fetch(Depth::Full).await.display_lines();
        assert!(lines.iter().any(|l| l.starts_with("kernel")));
    }

    #[tokio::test]
    async fn busy_collector_is_not_queued_behind() {
        let root = tempfile::tempdir().unwrap();
        let source = DeviceSource::with_power_supply_dir(LIMITS, root.path());

        let held = Arc::clone(&source.system);
        let _guard = held.lock().unwrap();
        assert_eq!(
            source.fetch(Depth::Summary).await,
            Outcome::Unavailable(Placeholder::Busy {
                what: "device telemetry"
            })
        );
    }
}
