//! Record and counter types produced by the snapshot parsers.
//!
//! These are the structured outputs of lsof and ps parsing, keyed for
//! aggregation by [`ProcKey`] and merged across workers after fan-in.

use crate::dispatch::Partial;
use serde::{Deserialize, Serialize};
use si_common::ProcKey;
use std::collections::HashMap;

/// One listening TCP socket owned by one process on one host.
///
/// Only emitted for IPv4 interfaces with a concrete port; IPv6 and
/// wildcard-port sockets are counted in [`LsofStats`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenRecord {
    /// Host address (IPv4 dotted quad, from the snapshot filename).
    pub host: String,
    /// Listening port.
    pub port: u16,
    /// Bound interface address.
    pub interface: String,
    /// Login name of the owning user ("" when the tag was missing).
    pub username: String,
    /// User ID ("-1" when the tag was missing; kept as a string because
    /// lsof reports it as text and the missing-field sentinel predates
    /// any numeric use downstream).
    pub uid: String,
    /// Command name ("" when the tag was missing).
    pub cmd: String,
    /// Process ID.
    pub pid: u32,
    /// Process group ID (-1 when the tag was missing or unparseable).
    pub pgid: i64,
}

/// Process metadata from one ps line on one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PsRecord {
    /// Host address (IPv4 dotted quad).
    pub host: String,
    /// Process ID.
    pub pid: u32,
    /// Owning user (may be a numeric string when the username is too long
    /// for the ps column).
    pub user: String,
    /// Command name (argv[0] basename as ps reports it).
    pub ps_cmd: String,
    /// First element of the full argument vector.
    pub ps_argv_zero: String,
    /// Space-joined full argument vector ("" for argument-less processes).
    pub ps_argv: String,
}

/// Skip and progress counters for one lsof parse batch.
///
/// Exposed so a run can distinguish "all sockets joined" from "sockets
/// dropped by a skip condition".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LsofStats {
    /// Snapshot files read.
    pub files: usize,
    /// Files abandoned after an unrecoverable parse failure.
    pub failed_files: usize,
    /// Descriptor lines in LISTEN state (including skipped ones).
    pub listening: usize,
    /// LISTEN lines on IPv6 interfaces, counted but never emitted.
    pub ipv6_skipped: usize,
    /// LISTEN lines with a wildcard `*` port, counted but never emitted.
    pub wildcard_skipped: usize,
    /// Descriptor lines missing expected fields, skipped.
    pub malformed_lines: usize,
    /// Descriptor lines seen before any process line, skipped.
    pub orphan_lines: usize,
}

impl LsofStats {
    /// Fold another worker's counters into this one.
    pub fn absorb(&mut self, other: &LsofStats) {
        self.files += other.files;
        self.failed_files += other.failed_files;
        self.listening += other.listening;
        self.ipv6_skipped += other.ipv6_skipped;
        self.wildcard_skipped += other.wildcard_skipped;
        self.malformed_lines += other.malformed_lines;
        self.orphan_lines += other.orphan_lines;
    }
}

/// One lsof worker's output: records, counters, and per-file warnings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LsofBatch {
    /// Listening sockets keyed by (host, pid).
    pub records: HashMap<ProcKey, Vec<ListenRecord>>,
    /// Skip and progress counters.
    pub stats: LsofStats,
    /// Per-file parse failures, recovered by dropping the file.
    pub warnings: Vec<String>,
}

impl LsofBatch {
    /// Merge worker partials into one batch.
    ///
    /// Workers hold disjoint host sets, so keys never collide; if they did,
    /// the later partial would win per key.
    pub fn merge(parts: Vec<LsofBatch>) -> LsofBatch {
        let mut merged = LsofBatch::default();
        for part in parts {
            merged.records.extend(part.records);
            merged.stats.absorb(&part.stats);
            merged.warnings.extend(part.warnings);
        }
        merged
    }
}

impl Partial for LsofBatch {
    fn record_count(&self) -> usize {
        self.records.len()
    }
}

/// One ps worker's output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PsBatch {
    /// Process metadata keyed by (host, pid).
    pub records: HashMap<ProcKey, PsRecord>,
}

impl PsBatch {
    /// Merge worker partials into one batch (disjoint keys, last write wins).
    pub fn merge(parts: Vec<PsBatch>) -> PsBatch {
        let mut merged = PsBatch::default();
        for part in parts {
            merged.records.extend(part.records);
        }
        merged
    }
}

impl Partial for PsBatch {
    fn record_count(&self) -> usize {
        self.records.len()
    }
}
