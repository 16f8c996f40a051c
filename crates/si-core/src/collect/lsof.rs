//! Parser for lsof -F0 snapshot output.
//!
//! Input is the output of `lsof +c 0 -i4 -P -n -Fn -Fp -FT -F0` captured to
//! a file per host: NULL-delimited tokens per line, each token tagged by its
//! first character. A `p`-tagged line starts a process block; the lines that
//! follow describe that process's file descriptors until the next `p` line.
//! TCP tokens break the one-character convention (`TST=LISTEN`) and are
//! split out separately.
//!
//! Snapshot data from large sweeps is routinely mangled: lines get split or
//! truncated somewhere between the remote host and the results directory.
//! The parser therefore recovers locally wherever it can. Missing process
//! tags degrade to sentinels, unrecognizable descriptor lines are counted
//! and skipped, and only an unreadable file aborts a batch. Losing a host's
//! data to one bad line is the failure mode this module defends against.

use super::types::{ListenRecord, LsofBatch};
use crate::acquire::{WorkItem, LSOF_CMD};
use si_common::{Error, ProcKey, Result};
use std::collections::HashMap;
use std::fs;
use tracing::{debug, warn};

/// Errors that abandon one lsof file (the batch continues without it).
#[derive(Debug, thiserror::Error)]
pub enum LsofParseError {
    #[error("non-numeric pid {token:?} on process line {line_num}")]
    BadPid { token: String, line_num: usize },
}

/// The "current process" state carried across descriptor lines.
///
/// Replaced wholesale on every `p` line; descriptor lines inherit it
/// unchanged. All missing-tag sentinels are decided in [`ProcContext::from_fields`]
/// and never retroactively recover (one-way degradation, not an error).
#[derive(Debug, Clone, PartialEq, Eq)]
struct ProcContext {
    pid: u32,
    pgid: i64,
    uid: String,
    cmd: String,
    username: String,
}

impl ProcContext {
    /// Build a context from a `p` line's fields, defaulting missing tags.
    ///
    /// Sentinels: pgid -1, uid "-1", cmd "", username "". The uid sentinel
    /// is a string on purpose; it is not type-unified with pgid's.
    fn from_fields(pid: u32, fields: &HashMap<char, &str>) -> Self {
        ProcContext {
            pid,
            pgid: fields
                .get(&'g')
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(-1),
            uid: fields.get(&'u').map_or_else(|| "-1".to_string(), |v| v.to_string()),
            cmd: fields.get(&'c').map_or_else(String::new, |v| v.to_string()),
            username: fields.get(&'L').map_or_else(String::new, |v| v.to_string()),
        }
    }
}

/// Split a raw line into single-character-tagged fields.
///
/// TCP tokens (first character `T`) are excluded; their `TAG=value` layout
/// would collide with the one-character tagging scheme.
fn split_fields(line: &str) -> HashMap<char, &str> {
    let mut fields = HashMap::new();
    for token in line.split('\0') {
        let mut chars = token.chars();
        match chars.next() {
            None | Some('T') => continue,
            Some(tag) => {
                fields.insert(tag, chars.as_str());
            }
        }
    }
    fields
}

/// Split a raw line's TCP tokens into 3-character-tagged sub-fields.
///
/// Layout is `TAG=value`: tag is chars 0-2, value is everything after the
/// `=`. Tokens too short to carry a value are ignored.
fn split_tcp_fields(line: &str) -> HashMap<&str, &str> {
    let mut tcp_fields = HashMap::new();
    for token in line.split('\0') {
        if !token.starts_with('T') || token.len() < 4 {
            continue;
        }
        if !token.is_char_boundary(3) || !token.is_char_boundary(4) {
            continue;
        }
        tcp_fields.insert(&token[..3], &token[4..]);
    }
    tcp_fields
}

/// Parse one host's lsof -F0 content into `batch`.
///
/// Pure except for the accumulator: reads no files, so it can be tested and
/// fuzzed on literal content. Appends listening-socket records keyed by
/// (host, pid) and updates the batch counters.
///
/// # Errors
/// `LsofParseError::BadPid` if a `p` line carries a non-numeric pid; the
/// caller drops the whole file (nothing parsed from it is kept) and keeps
/// going with the rest of its batch.
pub fn parse_lsof_content(host: &str, content: &str, batch: &mut LsofBatch) -> std::result::Result<(), LsofParseError> {
    let mut context: Option<ProcContext> = None;

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let fields = split_fields(line);

        if let Some(token) = fields.get(&'p') {
            // A `p` line starts a new process block. The tag scheme implies
            // the value exists; a non-numeric one means the file is corrupt
            // beyond line-level recovery.
            let pid = token.parse::<u32>().map_err(|_| LsofParseError::BadPid {
                token: token.to_string(),
                line_num: index + 1,
            })?;
            context = Some(ProcContext::from_fields(pid, &fields));
            continue;
        }

        // Descriptor line: only TCP sockets in LISTEN state are of interest.
        let tcp_fields = split_tcp_fields(line);
        if tcp_fields.get("TST").copied() != Some("LISTEN") {
            continue;
        }
        batch.stats.listening += 1;

        let Some(current) = context.as_ref() else {
            // Descriptor line before any process line: a truncated file
            // whose `p` line was lost. There is no pid to attribute the
            // socket to, so it can only be counted.
            batch.stats.orphan_lines += 1;
            continue;
        };

        let Some(interface) = fields.get(&'n') else {
            batch.stats.malformed_lines += 1;
            continue;
        };
        if interface.contains("::") {
            // IPv6 sockets are counted but never emitted.
            batch.stats.ipv6_skipped += 1;
            continue;
        }
        let Some((interface, port)) = interface.rsplit_once(':') else {
            batch.stats.malformed_lines += 1;
            continue;
        };
        if port == "*" {
            // Raw/wildcard socket.
            batch.stats.wildcard_skipped += 1;
            continue;
        }
        let Ok(port) = port.parse::<u16>() else {
            batch.stats.malformed_lines += 1;
            continue;
        };

        let record = ListenRecord {
            host: host.to_string(),
            port,
            interface: interface.to_string(),
            username: current.username.clone(),
            uid: current.uid.clone(),
            cmd: current.cmd.clone(),
            pid: current.pid,
            pgid: current.pgid,
        };
        batch
            .records
            .entry(ProcKey::new(host, current.pid))
            .or_default()
            .push(record);
    }
    Ok(())
}

/// Parse the lsof files of a batch of work items.
///
/// Each item's data file is read in sequence with the process context reset
/// per file. A file that cannot be read is fatal for the batch; a file that
/// fails to parse contributes nothing and is reported as a warning.
pub fn parse_lsof_batch(items: &[WorkItem]) -> Result<LsofBatch> {
    let mut batch = LsofBatch::default();
    for item in items {
        let path = item.data_path(LSOF_CMD);
        let content = fs::read_to_string(&path).map_err(|source| Error::SnapshotRead {
            path: path.clone(),
            source,
        })?;
        batch.stats.files += 1;

        let mut file_batch = LsofBatch::default();
        match parse_lsof_content(&item.host, &content, &mut file_batch) {
            Ok(()) => {
                batch.stats.absorb(&file_batch.stats);
                for (key, records) in file_batch.records {
                    batch.records.entry(key).or_default().extend(records);
                }
            }
            Err(err) => {
                warn!(file = %path.display(), error = %err, "dropping lsof file after parse failure");
                batch.stats.failed_files += 1;
                batch.warnings.push(format!("{}: {}", path.display(), err));
            }
        }
    }
    debug!(
        files = batch.stats.files,
        listening = batch.stats.listening,
        processes = batch.records.len(),
        "lsof batch parsed"
    );
    Ok(batch)
}
