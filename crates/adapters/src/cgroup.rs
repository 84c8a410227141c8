// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unified control-group hierarchy access.
//!
//! Resolves a process's cgroup directory from its `0::` membership entry
//! and writes `io.max` bandwidth limits. Roots are injectable so tests run
//! against a tempdir instead of `/proc` and `/sys/fs/cgroup`.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Filesystem view of the unified cgroup hierarchy.
#[derive(Debug, Clone)]
pub struct CgroupFs {
    proc_root: PathBuf,
    cgroup_root: PathBuf,
}

impl Default for CgroupFs {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            cgroup_root: PathBuf::from("/sys/fs/cgroup"),
        }
    }
}

impl CgroupFs {
    pub fn new(proc_root: impl Into<PathBuf>, cgroup_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
            cgroup_root: cgroup_root.into(),
        }
    }

    /// Resolve the cgroup directory a process belongs to.
    ///
    /// Reads `<proc>/<pid>/cgroup` and takes the unified-hierarchy entry
    /// (prefix `0::`). When that directory does not exist, falls back to
    /// the user-slice paths keyed by the process's owning uid. Returns
    /// `None` when the process is gone or no candidate directory exists.
    pub fn resolve(&self, pid: u32) -> Option<PathBuf> {
        let membership = self.proc_root.join(pid.to_string()).join("cgroup");
        let content = match std::fs::read_to_string(&membership) {
            Ok(content) => content,
            Err(err) => {
                debug!(pid, error = %err, "cannot read cgroup membership");
                return None;
            }
        };

        for line in content.lines() {
            if let Some(rel) = line.strip_prefix("0::") {
                let dir = self.cgroup_root.join(rel.trim_start_matches('/'));
                if dir.is_dir() {
                    return Some(dir);
                }
            }
        }

        self.resolve_by_uid(pid)
    }

    /// User-slice fallbacks for processes whose `0::` path is not mounted
    /// under our root (containerised or delegated hierarchies).
    fn resolve_by_uid(&self, pid: u32) -> Option<PathBuf> {
        let uid = self.owner_uid(pid)?;
        let candidates = [
            format!("system.slice/user-{uid}.slice"),
            format!("user.slice/user-{uid}.slice"),
            format!("system.slice/user@{uid}.service"),
        ];

        for candidate in candidates {
            let dir = self.cgroup_root.join(candidate);
            if dir.is_dir() {
                return Some(dir);
            }
        }

        debug!(pid, uid, "no cgroup directory found for process");
        None
    }

    #[cfg(unix)]
    fn owner_uid(&self, pid: u32) -> Option<u32> {
        use std::os::unix::fs::MetadataExt;
        let meta = std::fs::metadata(self.proc_root.join(pid.to_string())).ok()?;
        Some(meta.uid())
    }

    #[cfg(not(unix))]
    fn owner_uid(&self, _pid: u32) -> Option<u32> {
        None
    }

    /// Write read+write bandwidth limits to the group's `io.max` file,
    /// one line per device.
    pub fn write_io_max(
        &self,
        cgroup_dir: &Path,
        devices: &[String],
        bytes_per_sec: u64,
    ) -> std::io::Result<()> {
        let content = format_io_max(devices, bytes_per_sec);
        std::fs::write(cgroup_dir.join("io.max"), content)
    }
}

/// Render `io.max` content: `<maj>:<min> rbps=<B> wbps=<B>` per device,
/// newline-joined with a trailing newline.
pub fn format_io_max(devices: &[String], bytes_per_sec: u64) -> String {
    let mut lines: Vec<String> = devices
        .iter()
        .map(|dev| format!("{dev} rbps={bytes_per_sec} wbps={bytes_per_sec}"))
        .collect();
    lines.push(String::new());
    lines.join("\n")
}

#[cfg(test)]
#[path = "cgroup_tests.rs"]
mod tests;
