//! Parser for ps snapshot output.
//!
//! Input is the output of `ps -e -o pid= -o user= -o comm= -o args=` captured
//! to a file per host: `pid user comm [args...]`, whitespace-separated. The
//! format is simple enough that anything under-width is a real violation,
//! not line mangling, so unlike the lsof parser this one fails hard. The
//! only tolerated exception is a small set of process labels that some
//! platforms render without a full field set.

use super::types::{PsBatch, PsRecord};
use crate::acquire::{WorkItem, PS_CMD};
use si_common::{Error, ProcKey, Result};
use std::fs;
use tracing::debug;

/// Process labels that legitimately break the field layout; rows carrying
/// them cannot be parsed reliably and are skipped.
const KNOWN_NONCONFORMANT: [&str; 3] = ["<defunct>", "<exiting>", "<idle>"];

/// Errors that fail a ps file (and with it the worker batch).
#[derive(Debug, thiserror::Error)]
pub enum PsParseError {
    #[error("line {line_num} has fewer than 3 fields: {line:?}")]
    ShortLine { line_num: usize, line: String },

    #[error("non-numeric pid {token:?} on line {line_num}")]
    BadPid { token: String, line_num: usize },
}

/// Parse one host's ps content into `batch`.
///
/// # Errors
/// `PsParseError` on any line that is under-width without a known
/// non-conformant label, or whose pid is non-numeric. By design ps output
/// should never trigger this, so there is no recovery path.
pub fn parse_ps_content(
    host: &str,
    content: &str,
    batch: &mut PsBatch,
) -> std::result::Result<(), PsParseError> {
    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();

        if fields.len() < 3 {
            if fields.len() == 2 && KNOWN_NONCONFORMANT.contains(&fields[1]) {
                continue;
            }
            return Err(PsParseError::ShortLine {
                line_num: index + 1,
                line: line.to_string(),
            });
        }

        let pid = fields[0].parse::<u32>().map_err(|_| PsParseError::BadPid {
            token: fields[0].to_string(),
            line_num: index + 1,
        })?;
        // User is a numeric string when the username is too long for the column.
        let user = fields[1];
        let comm = fields[2];
        if KNOWN_NONCONFORMANT.contains(&comm) {
            continue;
        }

        // Additional fields can only be arguments; everything from field 4
        // onward is the argument vector.
        let (ps_argv_zero, ps_argv) = if fields.len() == 3 {
            (comm.to_string(), String::new())
        } else {
            (fields[3].to_string(), fields[3..].join(" "))
        };

        batch.records.insert(
            ProcKey::new(host, pid),
            PsRecord {
                host: host.to_string(),
                pid,
                user: user.to_string(),
                ps_cmd: comm.to_string(),
                ps_argv_zero,
                ps_argv,
            },
        );
    }
    Ok(())
}

/// Parse the ps files of a batch of work items.
///
/// Both an unreadable file and a format violation are fatal for the batch.
pub fn parse_ps_batch(items: &[WorkItem]) -> Result<PsBatch> {
    let mut batch = PsBatch::default();
    for item in items {
        let path = item.data_path(PS_CMD);
        let content = fs::read_to_string(&path).map_err(|source| Error::SnapshotRead {
            path: path.clone(),
            source,
        })?;
        parse_ps_content(&item.host, &content, &mut batch).map_err(|err| Error::PsParse {
            path: path.clone(),
            message: err.to_string(),
        })?;
    }
    debug!(processes = batch.records.len(), "ps batch parsed");
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(host: &str, content: &str) -> PsBatch {
        let mut batch = PsBatch::default();
        parse_ps_content(host, content, &mut batch).expect("content parses");
        batch
    }

    #[test]
    fn line_with_arguments_splits_argv() {
        let batch = parse("10.0.0.1", "1000 alice sshd /usr/sbin/sshd -D\n");
        let rec = &batch.records[&ProcKey::new("10.0.0.1", 1000)];
        assert_eq!(rec.pid, 1000);
        assert_eq!(rec.user, "alice");
        assert_eq!(rec.ps_cmd, "sshd");
        assert_eq!(rec.ps_argv_zero, "/usr/sbin/sshd");
        assert_eq!(rec.ps_argv, "/usr/sbin/sshd -D");
    }

    #[test]
    fn line_without_arguments_has_empty_argv() {
        let batch = parse("10.0.0.1", "42 root kworker\n");
        let rec = &batch.records[&ProcKey::new("10.0.0.1", 42)];
        assert_eq!(rec.ps_argv_zero, "kworker");
        assert_eq!(rec.ps_argv, "");
    }

    #[test]
    fn defunct_rows_are_skipped_without_error() {
        let batch = parse("10.0.0.1", "2000 <defunct>\n2000 bob <defunct>\n3000 root init /sbin/init\n");
        assert_eq!(batch.records.len(), 1);
        assert!(batch.records.contains_key(&ProcKey::new("10.0.0.1", 3000)));
    }

    #[test]
    fn exiting_and_idle_labels_are_also_tolerated() {
        let batch = parse("10.0.0.1", "10 <exiting>\n11 <idle>\n");
        assert!(batch.records.is_empty());
    }

    #[test]
    fn short_line_without_known_label_is_fatal() {
        let mut batch = PsBatch::default();
        let err = parse_ps_content("10.0.0.1", "1234 whoops\n", &mut batch).unwrap_err();
        assert!(matches!(err, PsParseError::ShortLine { line_num: 1, .. }));
    }

    #[test]
    fn single_field_line_is_fatal() {
        let mut batch = PsBatch::default();
        let err = parse_ps_content("10.0.0.1", "1234\n", &mut batch).unwrap_err();
        assert!(matches!(err, PsParseError::ShortLine { .. }));
    }

    #[test]
    fn non_numeric_pid_is_fatal() {
        let mut batch = PsBatch::default();
        let err = parse_ps_content("10.0.0.1", "oops root bash\n", &mut batch).unwrap_err();
        assert!(matches!(err, PsParseError::BadPid { ref token, .. } if token == "oops"));
    }

    #[test]
    fn numeric_user_column_is_kept_as_text() {
        let batch = parse("10.0.0.1", "500 1000123456 nginx /usr/sbin/nginx\n");
        assert_eq!(batch.records[&ProcKey::new("10.0.0.1", 500)].user, "1000123456");
    }

    #[test]
    fn format_violation_fails_the_batch_with_context() {
        let dir = tempfile::tempdir().expect("tempdir");
        let stem = dir.path().join("hosta.10.0.0.1.201701010000");
        std::fs::write(format!("{}.ps", stem.display()), "bad\n").expect("write");
        let items = vec![WorkItem::new(stem, "10.0.0.1")];
        let err = parse_ps_batch(&items).unwrap_err();
        match err {
            Error::PsParse { path, message } => {
                assert!(path.to_string_lossy().ends_with(".ps"));
                assert!(message.contains("line 1"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
