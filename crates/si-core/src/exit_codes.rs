//! Exit codes for the sockinv CLI.
//!
//! Exit codes communicate run outcome without requiring output parsing.
//!
//! Exit code ranges:
//! - 0: clean run
//! - 10-19: user/data errors (recoverable by fixing input)
//! - 20-29: internal errors

use si_common::Error;

/// Exit codes for sockinv runs.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success: table produced.
    Clean = 0,

    /// Invalid arguments.
    ArgsError = 10,

    /// Results directory could not be scanned.
    AcquireError = 11,

    /// Snapshot data could not be read or parsed.
    ParseError = 12,

    /// Join-key miss: the two snapshots disagree about a process.
    JoinError = 13,

    /// Internal error (worker failure, serialization).
    InternalError = 20,

    /// I/O error.
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Map a pipeline error to its exit code.
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::Args(_) => ExitCode::ArgsError,
            Error::AcquireDir { .. } => ExitCode::AcquireError,
            Error::SnapshotRead { .. } | Error::PsParse { .. } => ExitCode::ParseError,
            Error::JoinKeyMiss { .. } => ExitCode::JoinError,
            Error::WorkerFailed { .. } | Error::Serialize(_) => ExitCode::InternalError,
            Error::Io(_) => ExitCode::IoError,
        }
    }
}
