//! CLI help and version specs

use crate::prelude::*;

#[test]
fn help_describes_flags() {
    let assert = tgd().arg("--help").assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();

    assert!(stdout.contains("--config"), "missing --config in: {stdout}");
    assert!(stdout.contains("--debug"), "missing --debug in: {stdout}");
    assert!(stdout.contains("SLO controller"), "missing about in: {stdout}");
}

#[test]
fn version_prints_and_exits_zero() {
    let assert = tgd().arg("--version").assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(stdout.starts_with("tgd "), "got: {stdout}");
}
