//! Test helpers for behavioral specifications.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};

/// Returns the path to the tgd binary.
///
/// Resolves relative to the test binary itself: the test executable lives
/// at `target/debug/deps/specs-<hash>`, so its grandparent is
/// `target/debug/` where tgd is built.
pub fn tgd_binary() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let standard = manifest_dir.join("target/debug/tgd");
    if standard.exists() {
        return standard;
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join("tgd");
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

/// Returns an assert_cmd Command for the tgd binary.
pub fn tgd() -> assert_cmd::Command {
    assert_cmd::Command::new(tgd_binary())
}

/// Write a config file into a fresh tempdir and return both.
pub fn config_file(content: &str) -> (tempfile::TempDir, PathBuf) {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("gpu-controller.conf");
    std::fs::write(&path, content).unwrap();
    (tmp, path)
}
