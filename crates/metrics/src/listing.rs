// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Candidate-tenant enumeration.

use regex::RegexSet;
use std::path::Path;
use std::sync::OnceLock;
use tg_core::{DeviceId, TenantId};
use tracing::debug;

/// Command-line shapes that mark a process as an accelerator workload.
const WORKLOAD_PATTERNS: &[&str] = &[
    r"(?i)python.*torch",
    r"(?i)python.*tensorflow",
    r"(?i)python.*jax",
    r"(?i)cuda",
    r"(?i)nvidia",
];

#[allow(clippy::expect_used)] // static patterns, cannot fail
fn workload_patterns() -> &'static RegexSet {
    static RE: OnceLock<RegexSet> = OnceLock::new();
    RE.get_or_init(|| RegexSet::new(WORKLOAD_PATTERNS).expect("static patterns"))
}

/// One process observed on an accelerator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantProcess {
    pub tenant: TenantId,
    pub device: DeviceId,
}

/// Parse the accelerator process-listing output.
///
/// Rows are whitespace-separated
/// `device_index tenant_id type sm mem enc dec command`; `#`-prefixed and
/// empty lines are skipped, as are rows that do not parse.
pub fn parse_process_listing(output: &str) -> Vec<TenantProcess> {
    let mut processes = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 8 {
            continue;
        }

        let (Ok(device_index), Ok(pid)) = (fields[0].parse::<u32>(), fields[1].parse::<u32>())
        else {
            debug!(line, "skipping unparsable process-listing row");
            continue;
        };

        processes.push(TenantProcess {
            tenant: TenantId::new(pid),
            device: DeviceId::synthetic(device_index),
        });
    }

    processes
}

/// Fallback enumeration: scan process command lines for accelerator
/// workload patterns. Devices are assigned round-robin from the pid since
/// no ground truth is available here.
pub fn scan_cmdlines(proc_root: &Path) -> Vec<TenantProcess> {
    let mut processes = Vec::new();

    let entries = match std::fs::read_dir(proc_root) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(path = %proc_root.display(), error = %err, "cannot scan process table");
            return processes;
        }
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(pid) = name.to_string_lossy().parse::<u32>().ok() else {
            continue;
        };

        let cmdline_path = entry.path().join("cmdline");
        let Ok(raw) = std::fs::read(&cmdline_path) else {
            continue;
        };
        let cmdline: String = String::from_utf8_lossy(&raw).replace('\0', " ");

        if workload_patterns().is_match(&cmdline) {
            processes.push(TenantProcess {
                tenant: TenantId::new(pid),
                device: DeviceId::synthetic(pid % 2),
            });
        }
    }

    // Directory order is unspecified; keep runs deterministic
    processes.sort_by_key(|p| p.tenant);
    processes
}

#[cfg(test)]
#[path = "listing_tests.rs"]
mod tests;
