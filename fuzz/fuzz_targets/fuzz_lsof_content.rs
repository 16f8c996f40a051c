//! Fuzz target for lsof -F0 content parsing.
//!
//! Snapshot files from large sweeps are routinely mangled, so the parser
//! must handle arbitrary input without panicking; it may only reject the
//! file with an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use si_core::collect::parse_lsof_content;
use si_core::collect::types::LsofBatch;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let mut batch = LsofBatch::default();
        let _ = parse_lsof_content("10.0.0.1", content, &mut batch);
    }
});
