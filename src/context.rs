//! Logical accessibility over the assumption-depth sequence of a proof,
//! and the variable scopes derived from it.
//!
//! A line `i` is accessible from a later line `j` when no assumption block
//! containing `i` has been closed in between, i.e. every depth in `(i, j]`
//! stays at or above `depths[i]`.

use crate::log::Line;
use alloc::collections::BTreeSet;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Whether line `from` may still be cited at line `to` (both 0-based
/// indices into `depths`). `from == to` holds trivially.
pub fn accessible(depths: &[usize], from: usize, to: usize) -> bool {
    if from > to || to >= depths.len() {
        return false;
    }
    let floor = depths[from];
    depths[from + 1..=to].iter().all(|d| *d >= floor)
}

/// Ordered, deduplicated names of variables bound by bare top level groups
/// on lines of `[from, at)` that are accessible from `at`. The depth at
/// index `at` may belong to a line still being built.
pub fn context_vars(lines: &[Line], depths: &[usize], at: usize, from: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for (i, line) in lines.iter().enumerate().take(at).skip(from) {
        if !accessible(depths, i, at) {
            continue;
        }
        for g in line.statement.groups() {
            if let Some(name) = g.variable_name() {
                if !out.iter().any(|o| o == name) {
                    out.push(name.to_string());
                }
            }
        }
    }
    out
}

/// Every variable, at any depth, on any line accessible from `at`; sorted
/// and deduplicated. These are the names a new line must not capture.
pub fn influencing_vars(lines: &[Line], depths: &[usize], at: usize) -> Vec<String> {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    for (i, line) in lines.iter().enumerate().take(at) {
        if accessible(depths, i, at) {
            seen.extend(line.statement.variables());
        }
    }
    seen.into_iter().collect()
}

/// Index of the opening line of the innermost block still open at `last`:
/// the start of the maximal run ending at `last` whose depths all reach
/// `depths[last]`.
pub fn block_start(depths: &[usize], last: usize) -> usize {
    let floor = depths[last];
    let mut i = last;
    while i > 0 && depths[i - 1] >= floor {
        i -= 1;
    }
    i
}
