//! Key normalization.
//!
//! Callers address entries with path-style keys (`/services/web/leader`);
//! backends use a flat namespace without the leading separator. [`normalize`]
//! collapses redundant separators, resolves `.` and `..` segments, and strips
//! the leading separator so every spelling of a key addresses the same stored
//! entry.

/// Canonicalize a caller-supplied key.
///
/// Pure and total: never fails, never performs I/O. `..` segments that would
/// climb above the root are discarded.
pub fn normalize(raw: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}
