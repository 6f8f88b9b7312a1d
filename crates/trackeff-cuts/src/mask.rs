//! Run-mask text parsing.
//!
//! Format: one or more run ids per line separated by commas. Empty lines
//! and lines whose first character is `#` are skipped. Entries that do
//! not parse as a positive integer are ignored.

use std::io::BufRead;
use trackeff_core::RunId;

use crate::error::CutError;

/// Parse every run id from a run-mask source.
pub fn parse_run_mask<R: BufRead>(reader: R) -> Result<Vec<RunId>, CutError> {
    let mut runs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        for entry in line.split(',') {
            match entry.trim().parse::<u32>() {
                Ok(0) | Err(_) => {}
                Ok(id) => runs.push(RunId(id)),
            }
        }
    }
    Ok(runs)
}
