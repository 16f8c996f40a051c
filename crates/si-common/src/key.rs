//! Aggregation keys for per-host process and service data.
//!
//! Both parsers key their output by [`ProcKey`] so the two sources can be
//! joined; the joined table is re-keyed by [`ServiceKey`]. Host addresses
//! are the IPv4 dotted quads taken from snapshot filenames, so keys are
//! unique across hosts by construction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One host's view of one process: the join key for lsof and ps data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcKey {
    /// Host address (IPv4 dotted quad).
    pub host: String,
    /// Process ID on that host.
    pub pid: u32,
}

impl ProcKey {
    pub fn new(host: impl Into<String>, pid: u32) -> Self {
        Self {
            host: host.into(),
            pid,
        }
    }
}

impl fmt::Display for ProcKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.host, self.pid)
    }
}

/// One listening endpoint: the key for the joined service table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceKey {
    /// Host address (IPv4 dotted quad).
    pub host: String,
    /// Listening TCP port.
    pub port: u16,
}

impl ServiceKey {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn proc_key_equality_and_hashing() {
        let mut map = HashMap::new();
        map.insert(ProcKey::new("10.0.0.1", 100), "a");
        map.insert(ProcKey::new("10.0.0.2", 100), "b");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&ProcKey::new("10.0.0.1", 100)), Some(&"a"));
    }

    #[test]
    fn display_formats() {
        assert_eq!(ProcKey::new("10.0.0.1", 7).to_string(), "10.0.0.1/7");
        assert_eq!(ServiceKey::new("10.0.0.1", 22).to_string(), "10.0.0.1:22");
    }
}
