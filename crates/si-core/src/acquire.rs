//! Snapshot-file enumeration on the results directory.
//!
//! Sweep tooling drops one completion marker per host, named with the host's
//! IPv4 address and a 12-digit acquisition timestamp, e.g.
//! `hostname.192.168.1.10.201701010000.ret.complete`. The actual data files
//! share the stem with a tool suffix (`.lsof`, `.ps`). Enumeration finds the
//! markers, extracts the host address, and produces one [`WorkItem`] per
//! host for the dispatcher.
//!
//! A marker whose name does not carry a host address is reported as a
//! warning and skipped; enumeration runs unattended and must never stop to
//! ask.

use regex::Regex;
use serde::{Deserialize, Serialize};
use si_common::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Tool suffix of lsof data files.
pub const LSOF_CMD: &str = "lsof";
/// Tool suffix of ps data files.
pub const PS_CMD: &str = "ps";
/// Completion-marker suffix identifying finished acquisitions.
pub const DEFAULT_EXTENSION: &str = ".ret.complete";

static HOST_STAMP_RE: OnceLock<Regex> = OnceLock::new();

/// IPv4 dotted quad followed by a 12-digit acquisition timestamp.
fn host_stamp_re() -> &'static Regex {
    HOST_STAMP_RE.get_or_init(|| {
        Regex::new(r"(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})\.(\d{12})").expect("static regex compiles")
    })
}

/// One host's snapshot to parse: the shared path stem plus the host address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Marker path minus the completion suffix.
    pub stem: PathBuf,
    /// Host address extracted from the filename.
    pub host: String,
}

impl WorkItem {
    pub fn new(stem: impl Into<PathBuf>, host: impl Into<String>) -> Self {
        Self {
            stem: stem.into(),
            host: host.into(),
        }
    }

    /// Path of the data file one tool produced for this host.
    pub fn data_path(&self, cmd: &str) -> PathBuf {
        let mut path = self.stem.clone().into_os_string();
        path.push(format!(".{cmd}"));
        PathBuf::from(path)
    }
}

/// Everything enumeration found, plus what it had to skip.
#[derive(Debug, Clone, Default)]
pub struct Acquisitions {
    /// One item per completed host acquisition, sorted by path.
    pub items: Vec<WorkItem>,
    /// Markers skipped because their names carry no host address.
    pub warnings: Vec<String>,
}

/// Scan `dir` for completion markers ending in `extension`.
///
/// # Errors
/// `Error::AcquireDir` if the directory itself cannot be read.
pub fn enumerate_snapshots(dir: &Path, extension: &str) -> Result<Acquisitions> {
    let mut acq = Acquisitions::default();

    let entries = fs::read_dir(dir).map_err(|source| Error::AcquireDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut markers: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(Error::Io)?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.ends_with(extension) {
            markers.push(path);
        }
    }
    // Directory iteration order is platform-dependent; sort so partitioning
    // is reproducible run to run.
    markers.sort();

    for path in markers {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        match host_stamp_re().captures(name) {
            Some(caps) => {
                let host = caps[1].to_string();
                acq.items.push(WorkItem::new(strip_marker_suffix(&path), host));
            }
            None => {
                warn!(file = %path.display(), "marker filename carries no host address, skipping");
                acq.warnings
                    .push(format!("malformed snapshot filename: {}", path.display()));
            }
        }
    }

    debug!(
        items = acq.items.len(),
        skipped = acq.warnings.len(),
        "snapshot enumeration complete"
    );
    Ok(acq)
}

/// Drop the last two dot-separated segments of the file name (the
/// completion-marker suffix), keeping the directory.
fn strip_marker_suffix(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let parts: Vec<&str> = name.split('.').collect();
    let keep = parts.len().saturating_sub(2);
    path.with_file_name(parts[..keep].join("."))
}
