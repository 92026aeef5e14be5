//! Identity assignment for detected objects.
//!
//! Unique objects and agents keep their bare names. Generic objects get a
//! per-frame 1-based index per base name, assigned in row-major detection
//! order, so "box" becomes "box1", "box2", ... within each frame.

use std::collections::HashMap;

/// Running per-base index, reset for every frame.
#[derive(Debug, Default)]
pub struct GenericCounter {
    counts: HashMap<String, u32>,
}

impl GenericCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next 1-based index for `base` within the current frame.
    pub fn next_index(&mut self, base: &str) -> u32 {
        let count = self.counts.entry(base.to_string()).or_insert(0);
        *count += 1;
        *count
    }
}

/// Replaces the `$i`/`$j` position markers with the cell's 1-based row and
/// column.
pub fn substitute_position(fragment: &str, row: usize, col: usize) -> String {
    fragment
        .replace("$i", &(row + 1).to_string())
        .replace("$j", &(col + 1).to_string())
}

/// Replaces whole-token occurrences of `name` in `fragment` with `indexed`.
///
/// A match must sit between `(`, `)`, whitespace or a string edge on both
/// sides. That keeps a base name from matching inside an already-suffixed
/// instance ("box" inside "box1") or inside a longer identifier ("box"
/// inside "boxer").
pub fn substitute_name(fragment: &str, name: &str, indexed: &str) -> String {
    if name.is_empty() {
        return fragment.to_string();
    }
    let bytes = fragment.as_bytes();
    let mut out = String::with_capacity(fragment.len());
    let mut i = 0;
    while i < fragment.len() {
        if fragment[i..].starts_with(name)
            && is_boundary_before(bytes, i)
            && is_boundary_after(bytes, i + name.len())
        {
            out.push_str(indexed);
            i += name.len();
        } else {
            let step = fragment[i..]
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(1);
            out.push_str(&fragment[i..i + step]);
            i += step;
        }
    }
    out
}

fn is_boundary_before(bytes: &[u8], i: usize) -> bool {
    i == 0 || matches!(bytes[i - 1], b'(' | b')' | b' ' | b'\t' | b'\n')
}

fn is_boundary_after(bytes: &[u8], i: usize) -> bool {
    i >= bytes.len() || matches!(bytes[i], b'(' | b')' | b' ' | b'\t' | b'\n')
}
