//! Snapshot parsers for the two acquisition tools.
//!
//! - `lsof` — stateful, error-tolerant parsing of NULL-delimited -F0 output
//!   into listening-socket records
//! - `ps` — strict whitespace-split parsing of process metadata
//! - `types` — the records, counters, and batch containers both produce

pub mod lsof;
pub mod ps;
pub mod types;

pub use lsof::{parse_lsof_batch, parse_lsof_content, LsofParseError};
pub use ps::{parse_ps_batch, parse_ps_content, PsParseError};
pub use types::{ListenRecord, LsofBatch, LsofStats, PsBatch, PsRecord};
