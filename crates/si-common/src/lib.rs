//! Sockinv common types and errors.
//!
//! This crate provides foundational types shared across si-core modules:
//! - Aggregation keys for per-host process and service data
//! - The unified error type

pub mod error;
pub mod key;

pub use error::{Error, Result};
pub use key::{ProcKey, ServiceKey};
