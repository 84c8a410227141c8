//! Daemon lifecycle specs
//!
//! The daemon runs with a missing config (all defaults) and exits zero on
//! SIGTERM, finishing the tick in flight first.

use crate::prelude::*;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

#[test]
fn terminate_signal_shuts_down_gracefully() {
    let tmp = tempfile::TempDir::new().unwrap();
    let missing_config = tmp.path().join("absent.conf");

    let mut child = Command::new(tgd_binary())
        .arg("--config")
        .arg(&missing_config)
        .arg("--debug")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    // Give startup discovery and the first tick a moment
    std::thread::sleep(Duration::from_millis(1500));

    let term = Command::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(term.success());

    // Graceful shutdown means exit code 0, within a bounded wait
    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        match child.try_wait().unwrap() {
            Some(status) => break status,
            None if Instant::now() > deadline => {
                let _ = child.kill();
                panic!("daemon did not exit after SIGTERM");
            }
            None => std::thread::sleep(Duration::from_millis(50)),
        }
    };

    assert!(status.success(), "expected exit 0, got {status}");
}

#[test]
fn interrupt_signal_shuts_down_gracefully() {
    let tmp = tempfile::TempDir::new().unwrap();
    let missing_config = tmp.path().join("absent.conf");

    let mut child = Command::new(tgd_binary())
        .arg("--config")
        .arg(&missing_config)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    std::thread::sleep(Duration::from_millis(1500));

    let int = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(int.success());

    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        match child.try_wait().unwrap() {
            Some(status) => break status,
            None if Instant::now() > deadline => {
                let _ = child.kill();
                panic!("daemon did not exit after SIGINT");
            }
            None => std::thread::sleep(Duration::from_millis(50)),
        }
    };

    assert!(status.success(), "expected exit 0, got {status}");
}
