//! Joining lsof and ps data into the service table.
//!
//! Every listening socket is matched with its process's ps metadata by
//! (host, pid) and re-keyed by (host, port). This is a hard join: a socket
//! whose process is absent from the ps data means the two snapshots
//! disagree about what was running, and that is surfaced as a
//! data-integrity error rather than papered over with defaults.

use crate::collect::types::{ListenRecord, PsRecord};
use serde::{Deserialize, Serialize};
use si_common::{Error, ProcKey, Result, ServiceKey};
use std::collections::HashMap;
use tracing::debug;

/// One listening service with both sources' fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// Host address (IPv4 dotted quad).
    pub host: String,
    /// Listening port as reported by lsof.
    pub lsof_port: u16,
    /// Bound interface address.
    pub interface: String,
    /// Login name from lsof ("" when the tag was missing).
    pub username: String,
    /// User ID from lsof ("-1" when the tag was missing).
    pub uid: String,
    /// Command name from lsof ("" when the tag was missing).
    pub cmd: String,
    /// Process ID.
    pub pid: u32,
    /// Process group ID (-1 when the tag was missing).
    pub pgid: i64,
    /// First element of the argument vector from ps.
    pub ps_argv_zero: String,
    /// Space-joined argument vector from ps.
    pub ps_argv: String,
    /// Owning user as ps reports it.
    pub ps_username: String,
}

impl ServiceRecord {
    fn from_parts(socket: &ListenRecord, peer: &PsRecord) -> Self {
        ServiceRecord {
            host: socket.host.clone(),
            lsof_port: socket.port,
            interface: socket.interface.clone(),
            username: socket.username.clone(),
            uid: socket.uid.clone(),
            cmd: socket.cmd.clone(),
            pid: socket.pid,
            pgid: socket.pgid,
            ps_argv_zero: peer.ps_argv_zero.clone(),
            ps_argv: peer.ps_argv.clone(),
            ps_username: peer.user.clone(),
        }
    }
}

/// Join listening-socket records with ps metadata, re-keyed by (host, port).
///
/// # Errors
/// `Error::JoinKeyMiss` for the first socket whose (host, pid) has no ps
/// record.
pub fn join_socket_procdata(
    lsof: &HashMap<ProcKey, Vec<ListenRecord>>,
    ps: &HashMap<ProcKey, PsRecord>,
) -> Result<HashMap<ServiceKey, ServiceRecord>> {
    let mut joined = HashMap::new();
    for (key, sockets) in lsof {
        let peer = ps.get(key).ok_or_else(|| Error::JoinKeyMiss {
            host: key.host.clone(),
            pid: key.pid,
        })?;
        for socket in sockets {
            joined.insert(
                ServiceKey::new(socket.host.as_str(), socket.port),
                ServiceRecord::from_parts(socket, peer),
            );
        }
    }
    debug!(services = joined.len(), "join complete");
    Ok(joined)
}
