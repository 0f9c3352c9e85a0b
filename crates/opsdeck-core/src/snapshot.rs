// ── Snapshot logging ──
//
// One append-only text file per UTC calendar date. Each record is a
// header line with the cycle timestamp followed by one labelled block
// per source. Files are created owner-read/write only.

use std::fmt::Write as _;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::scheduler::CycleReport;
use crate::sources::SourceId;

const FILE_PREFIX: &str = "opsdeck-";
const FILE_SUFFIX: &str = ".log";

/// An immutable record of one cycle's lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub taken_at: DateTime<Utc>,
    pub blocks: Vec<(SourceId, Vec<String>)>,
}

impl Snapshot {
    pub fn from_report(report: &CycleReport) -> Self {
        Self {
            taken_at: report.started_at,
            blocks: report
                .results
                .iter()
                .map(|(id, result)| (*id, result.outcome.display_lines()))
                .collect(),
        }
    }

    /// The record exactly as it is appended, trailing blank line included.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "==== Snapshot {} ====",
            self.taken_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        for (id, lines) in &self.blocks {
            let _ = writeln!(out, "[{id}]");
            for line in lines {
                let _ = writeln!(out, "{line}");
            }
        }
        out.push('\n');
        out
    }
}

/// Appends snapshots to dated files under one directory.
#[derive(Debug, Clone)]
pub struct SnapshotLogger {
    dir: PathBuf,
}

impl SnapshotLogger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<dir>/opsdeck-YYYY-MM-DD.log`
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{FILE_PREFIX}{}{FILE_SUFFIX}", date.format("%Y-%m-%d")))
    }

    /// Append `snapshot` to the file for its UTC date.
    ///
    /// The directory is created if absent; the record goes out in a
    /// single write so concurrent appends from this process never
    /// interleave within a record.
    pub async fn append(&self, snapshot: &Snapshot) -> Result<PathBuf, CoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| CoreError::SnapshotDir {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.path_for(snapshot.taken_at.date_naive());
        let write_err = |source| CoreError::SnapshotWrite {
            path: path.clone(),
            source,
        };

        let mut options = tokio::fs::OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&path).await.map_err(write_err)?;
        file.write_all(snapshot.render().as_bytes())
            .await
            .map_err(write_err)?;
        file.flush().await.map_err(write_err)?;

        debug!(path = %path.display(), "snapshot appended");
        Ok(path)
    }

    /// Append on a detached task. Failures are logged here; the handle
    /// carries them too, for callers that want to surface them.
    pub fn spawn_append(&self, snapshot: Snapshot) -> JoinHandle<Result<PathBuf, CoreError>> {
        let logger = self.clone();
        tokio::spawn(async move {
            let result = logger.append(&snapshot).await;
            if let Err(e) = &result {
                warn!(error = %e, "snapshot write failed");
            }
            result
        })
    }
}
