//! End-to-end inventory run: acquire, fan out, merge, join.
//!
//! Both tools' files are parsed over the same partition of work items, so a
//! worker's lsof and ps chunks cover the same hosts and the merged mappings
//! share (host, pid) keys by construction.

use crate::acquire::{enumerate_snapshots, WorkItem};
use crate::collect::types::{LsofBatch, LsofStats, PsBatch};
use crate::collect::{parse_lsof_batch, parse_ps_batch};
use crate::dispatch::{default_workers, dispatch, partition};
use crate::join::{join_socket_procdata, ServiceRecord};
use si_common::{Result, ServiceKey};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

/// Options for one inventory run.
#[derive(Debug, Clone)]
pub struct InventoryOptions {
    /// Directory holding the per-host snapshot files.
    pub results_dir: PathBuf,
    /// Completion-marker suffix identifying finished acquisitions.
    pub extension: String,
    /// Worker count override (defaults to the number of logical CPUs).
    pub workers: Option<usize>,
}

/// Result of one inventory run.
#[derive(Debug, Clone)]
pub struct InventoryReport {
    /// The joined listening-socket table, keyed by (host, port).
    pub services: HashMap<ServiceKey, ServiceRecord>,
    /// Skip and progress counters from the lsof parse.
    pub stats: LsofStats,
    /// Non-fatal problems: malformed marker names, dropped lsof files.
    pub warnings: Vec<String>,
    /// Host acquisitions discovered on the filesystem.
    pub hosts: usize,
}

/// Run the full pipeline over a results directory.
pub fn run_inventory(options: &InventoryOptions) -> Result<InventoryReport> {
    let acq = enumerate_snapshots(&options.results_dir, &options.extension)?;
    let workers = options.workers.unwrap_or_else(default_workers);
    info!(
        hosts = acq.items.len(),
        workers, "discovered host process listings"
    );

    let chunks: Vec<Vec<WorkItem>> = partition(&acq.items, workers);

    let lsof_parts = dispatch(chunks.clone(), "lsof", |items: &[WorkItem]| {
        parse_lsof_batch(items)
    })?;
    let lsof = LsofBatch::merge(lsof_parts);

    let ps_parts = dispatch(chunks, "ps", |items: &[WorkItem]| parse_ps_batch(items))?;
    let ps = PsBatch::merge(ps_parts);

    let services = join_socket_procdata(&lsof.records, &ps.records)?;
    info!(
        services = services.len(),
        listening = lsof.stats.listening,
        ipv6_skipped = lsof.stats.ipv6_skipped,
        wildcard_skipped = lsof.stats.wildcard_skipped,
        "inventory complete"
    );

    let mut warnings = acq.warnings;
    warnings.extend(lsof.warnings);
    Ok(InventoryReport {
        services,
        stats: lsof.stats,
        warnings,
        hosts: acq.items.len(),
    })
}
