//! Fuzz target for ps content parsing.
//!
//! Format violations are fatal by design, but fatal means an error value,
//! never a panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use si_core::collect::parse_ps_content;
use si_core::collect::types::PsBatch;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let mut batch = PsBatch::default();
        let _ = parse_ps_content("10.0.0.1", content, &mut batch);
    }
});
