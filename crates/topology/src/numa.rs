// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hardware-locality parsing: NUMA node to bus-address mapping.

use crate::bus::address_regex;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

#[allow(clippy::expect_used)] // static pattern, cannot fail
fn numa_header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"NUMANode.*?#(\d+)").expect("static pattern"))
}

/// Parse a hardware-locality console listing.
///
/// A `NUMANode … #N` header opens node `N`; every subsequent GPU-ish bus
/// address belongs to it until the next header. Addresses seen before any
/// header land on node 0.
pub fn parse_numa_listing(listing: &str) -> BTreeMap<u32, Vec<String>> {
    let mut mapping: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    let mut current_node = 0u32;

    for line in listing.lines() {
        let line = line.trim();

        if let Some(captures) = numa_header_regex().captures(line) {
            if let Some(id) = captures.get(1).and_then(|m| m.as_str().parse().ok()) {
                current_node = id;
                mapping.entry(current_node).or_default();
            }
            continue;
        }

        let looks_like_gpu = line.contains("VGA") || line.contains("3D") || line.contains("GPU");
        if !looks_like_gpu {
            continue;
        }
        if let Some(found) = address_regex().find(line) {
            mapping
                .entry(current_node)
                .or_default()
                .push(found.as_str().to_string());
        }
    }

    mapping
}

/// Fallback NUMA discovery from the sysfs node directory.
///
/// Yields the node ids present under `node_root` (e.g.
/// `/sys/devices/system/node/node0`) with empty device lists, or a single
/// node 0 when nothing is found.
pub fn scan_sysfs_nodes(node_root: &Path) -> BTreeMap<u32, Vec<String>> {
    let mut mapping: BTreeMap<u32, Vec<String>> = BTreeMap::new();

    match std::fs::read_dir(node_root) {
        Ok(entries) => {
            for entry in entries.flatten() {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if let Some(id) = name.strip_prefix("node").and_then(|n| n.parse().ok()) {
                    mapping.entry(id).or_default();
                }
            }
        }
        Err(err) => {
            debug!(path = %node_root.display(), error = %err, "sysfs node scan failed");
        }
    }

    if mapping.is_empty() {
        mapping.insert(0, Vec::new());
    }
    mapping
}

#[cfg(test)]
#[path = "numa_tests.rs"]
mod tests;
