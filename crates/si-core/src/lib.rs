//! Sockinv Core Library
//!
//! This library turns raw `lsof` and `ps` snapshot files collected from many
//! remote hosts into one table of listening network sockets:
//! - Snapshot enumeration on the results directory
//! - Error-tolerant parsing of lsof -F0 and ps output
//! - Static fan-out/fan-in of parse work across CPU workers
//! - Joining both sources by (host, pid) into a (host, port) table
//!
//! The binary entry point is in `main.rs`.

pub mod acquire;
pub mod collect;
pub mod dispatch;
pub mod exit_codes;
pub mod join;
pub mod logging;
pub mod output;
pub mod pipeline;
