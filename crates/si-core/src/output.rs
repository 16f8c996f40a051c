//! Deterministic JSON rendering of the joined service table.
//!
//! The in-memory table is keyed by (host, port); serialized output is a row
//! array sorted by host then port so identical sweeps produce identical
//! bytes. stdout carries only this payload; logs go to stderr.

use crate::join::ServiceRecord;
use si_common::{Result, ServiceKey};
use std::collections::HashMap;

/// Render the service table as a sorted JSON array.
pub fn render_services(
    services: &HashMap<ServiceKey, ServiceRecord>,
    pretty: bool,
) -> Result<String> {
    let mut rows: Vec<&ServiceRecord> = services.values().collect();
    rows.sort_by(|a, b| (&a.host, a.lsof_port).cmp(&(&b.host, b.lsof_port)));
    let rendered = if pretty {
        serde_json::to_string_pretty(&rows)?
    } else {
        serde_json::to_string(&rows)?
    };
    Ok(rendered)
}
