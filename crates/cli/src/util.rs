// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Small naming and formatting helpers shared across the engine.

use std::time::Duration;

/// Maximum length of a workspace filename component.
const MAX_NAME_LEN: usize = 255;

/// Normalize an artifact name for use in a workspace filename.
///
/// Lowercases, replaces `/`, space, and `:` with `-`, and truncates to
/// 255 characters. Idempotent, so stored filenames are stable across runs.
pub fn clean_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| match c {
            '/' | ' ' | ':' => '-',
            other => other,
        })
        .take(MAX_NAME_LEN)
        .collect()
}

/// Dashboard-friendly device id: the hostname with `.` removed.
///
/// Only for frontend element ids — the hostname itself stays authoritative
/// everywhere else (status table keys, workspace filenames).
pub fn device_id(hostname: &str) -> String {
    hostname.replace('.', "")
}

/// Coarse human-readable age label for status displays.
pub fn time_ago(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs();
    if seconds == 0 {
        "Now".to_owned()
    } else if seconds < 60 {
        format!("{seconds} seconds")
    } else if seconds < 120 {
        "1 minute".to_owned()
    } else if seconds < 3600 {
        format!("{} minutes", seconds / 60)
    } else if seconds < 7200 {
        "1 hour".to_owned()
    } else if seconds < 86400 {
        format!("{} hours", seconds / 3600)
    } else if seconds < 86400 * 2 {
        "1 day".to_owned()
    } else {
        format!("{} days", seconds / 86400)
    }
}

#[cfg(test)]
#[path = "util_tests.rs"]
mod tests;
