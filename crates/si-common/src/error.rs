//! Error types for sockinv.
//!
//! One unified error enum covers the whole pipeline. The taxonomy follows
//! the failure model of the parsers:
//! - Field-level malformation in lsof data is recovered with sentinel
//!   defaults and never surfaces here.
//! - File-level failures (unreadable snapshot, ps format violation) are
//!   fatal to the worker batch that hit them.
//! - A join-key miss is a data-integrity violation, not a recoverable
//!   condition.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for sockinv operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for sockinv.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid CLI arguments or options.
    #[error("invalid arguments: {0}")]
    Args(String),

    /// Results directory could not be scanned.
    #[error("failed to scan results directory {path}: {source}")]
    AcquireDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A snapshot data file could not be read. Fatal to the worker batch.
    #[error("failed to read snapshot file {path}: {source}")]
    SnapshotRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// ps output violated the expected field layout.
    #[error("bad ps data in {path}: {message}")]
    PsParse { path: PathBuf, message: String },

    /// A parse worker exited without producing a result.
    #[error("worker {worker} exited without producing a result")]
    WorkerFailed { worker: usize },

    /// A listening socket's process has no matching ps record.
    #[error("no ps record for host {host} pid {pid}")]
    JoinKeyMiss { host: String, pid: u32 },

    /// Output serialization failed.
    #[error("failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_key_miss_names_host_and_pid() {
        let err = Error::JoinKeyMiss {
            host: "192.168.1.10".to_string(),
            pid: 4242,
        };
        let text = err.to_string();
        assert!(text.contains("192.168.1.10"));
        assert!(text.contains("4242"));
    }

    #[test]
    fn snapshot_read_preserves_source() {
        let err = Error::SnapshotRead {
            path: PathBuf::from("/tmp/host.lsof"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(std::error::Error::source(&err).is_some());
    }
}
