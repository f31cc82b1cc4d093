// src/diff.rs
//
// Unified-diff parsing: recover, per changed file, the set of line
// numbers that exist only in the new revision.
//
// Guarantees:
// - Never errors; unrecognized lines degrade to context lines
// - Line numbers are 1-based and refer to the NEW file
// - Removed lines never advance the new-file counter

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

use crate::diag::{log, DiagLevel, DiagSink};

/// Added line numbers per changed path, path-ordered.
pub type ChangedLines = BTreeMap<String, BTreeSet<usize>>;

/// Parse a unified diff into `{path -> added line numbers}`, keeping only
/// paths accepted by `is_match` (the language's file-suffix convention,
/// injected by the caller).
///
/// Empty or header-less input yields an empty map.
pub fn parse_diff(
    diff: &str,
    is_match: impl Fn(&str) -> bool,
    diag: &dyn DiagSink,
) -> ChangedLines {
    if diff.is_empty() {
        return ChangedLines::new();
    }

    let file_header = Regex::new(r"^\+\+\+ b/(.*)").unwrap();
    let hunk_header = Regex::new(r"^@@ -\d+(?:,\d+)? \+(\d+)(?:,\d+)? @@").unwrap();

    let mut changed = ChangedLines::new();
    let mut current_file: Option<String> = None;
    let mut new_line = 0usize;

    for line in diff.lines() {
        // `+++ b/...` also starts with '+', so the header check comes first.
        if let Some(caps) = file_header.captures(line) {
            let path = caps[1].to_string();
            changed.entry(path.clone()).or_default();
            current_file = Some(path);
            continue;
        }

        let Some(file) = current_file.as_deref() else {
            continue; // preamble before the first file header
        };

        if let Some(caps) = hunk_header.captures(line) {
            // Counter restarts at each hunk, never at file headers.
            new_line = caps[1].parse().unwrap_or(0);
            continue;
        }

        if line.starts_with('+') {
            if let Some(set) = changed.get_mut(file) {
                set.insert(new_line);
            }
            new_line += 1;
        } else if line.starts_with('-') {
            // removed from the old file only
        } else if !line.starts_with('\\') {
            // context line; '\ No newline at end of file' is neither
            // recorded nor counted
            new_line += 1;
        }
    }

    changed.retain(|path, _| is_match(path));

    log(
        diag,
        DiagLevel::Debug,
        format!("parsed diff: {} matching changed file(s)", changed.len()),
    );

    changed
}
