// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Block-device enumeration for I/O throttling targets.

use std::path::PathBuf;
use tracing::debug;

/// Throttle target used when the kernel listing yields nothing usable.
const FALLBACK_DEVICE: &str = "8:0";

/// Reader over the kernel partitions listing.
#[derive(Debug, Clone)]
pub struct BlockDevices {
    partitions_path: PathBuf,
}

impl Default for BlockDevices {
    fn default() -> Self {
        Self {
            partitions_path: PathBuf::from("/proc/partitions"),
        }
    }
}

impl BlockDevices {
    pub fn new(partitions_path: impl Into<PathBuf>) -> Self {
        Self {
            partitions_path: partitions_path.into(),
        }
    }

    /// `maj:min` identifiers of the whole-disk devices to throttle.
    /// Never empty: falls back to `8:0` when the listing is missing or
    /// contains no whole-disk entries.
    pub fn throttle_targets(&self) -> Vec<String> {
        let content = match std::fs::read_to_string(&self.partitions_path) {
            Ok(content) => content,
            Err(err) => {
                debug!(path = %self.partitions_path.display(), error = %err, "cannot read partitions listing");
                return vec![FALLBACK_DEVICE.to_string()];
            }
        };

        let targets = parse_throttle_targets(&content);
        if targets.is_empty() {
            return vec![FALLBACK_DEVICE.to_string()];
        }
        targets
    }
}

/// Parse a `/proc/partitions`-format listing into `maj:min` throttle
/// targets.
///
/// Keeps whole-disk entries: names starting `sd`, `nvme`, or `hd` whose
/// final two characters contain no digit (which excludes partitions such
/// as `sda1` and `nvme0n1p2`).
pub fn parse_throttle_targets(content: &str) -> Vec<String> {
    let mut targets = Vec::new();

    // First two lines are the header and its blank separator
    for line in content.lines().skip(2) {
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            continue;
        }

        let (major, minor, name) = (fields[0], fields[1], fields[3]);
        let is_disk_prefix =
            name.starts_with("sd") || name.starts_with("nvme") || name.starts_with("hd");
        let tail_has_digit = name
            .chars()
            .rev()
            .take(2)
            .any(|c| c.is_ascii_digit());

        if is_disk_prefix && !tail_has_digit {
            targets.push(format!("{major}:{minor}"));
        }
    }

    targets
}

#[cfg(test)]
#[path = "blockdev_tests.rs"]
mod tests;
