// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tenant metric file format.
//!
//! A metric file holds one line, either `p99_latency_ms: <float>` or a
//! bare float. The producer is the tenant-side latency exporter; the
//! daemon only consumes (plus the test-only writer in `source`).

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

#[allow(clippy::expect_used)] // static pattern, cannot fail
fn latency_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"p99_latency_ms:\s*([0-9.]+)").expect("static pattern"))
}

/// Parse metric file content into a latency value.
pub fn parse_metric_content(content: &str) -> Option<f64> {
    let content = content.trim();

    if let Some(captures) = latency_line_regex().captures(content) {
        if let Ok(latency) = captures.get(1)?.as_str().parse() {
            return Some(latency);
        }
    }

    content.parse().ok()
}

/// Read and parse one tenant metric file. `None` covers both a missing
/// file and unparsable content.
pub fn read_metric(path: &Path) -> Option<f64> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "metric file unreadable");
            return None;
        }
    };

    let parsed = parse_metric_content(&content);
    if parsed.is_none() {
        debug!(path = %path.display(), "invalid metric file format");
    }
    parsed
}

#[cfg(test)]
#[path = "sample_file_tests.rs"]
mod tests;
