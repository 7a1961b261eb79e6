//! Keep log lines single-line when they echo catalog or user strings
//!
//! Game names and ids come from catalog files, scanned `.d64` file names or
//! the HTTP backend, and the user id comes from the state file. None of
//! them are trusted to be printable.

use std::fmt::Write;

const MAX_PREVIEW: usize = 200;

/// Escape control characters and cap the length at 200 characters
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}
