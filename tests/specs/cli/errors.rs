//! CLI error handling specs
//!
//! Fatal initialisation problems exit non-zero before the loop starts.

use crate::prelude::*;

#[test]
fn out_of_range_config_exits_one() {
    let (_tmp, path) = config_file("[controller]\ntail_threshold_ms = -10\n");

    let assert = tgd().arg("--config").arg(&path).assert().code(1);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("tail_threshold_ms"), "got: {stderr}");
}

#[test]
fn untypeable_config_value_exits_one() {
    let (_tmp, path) = config_file("[placement]\nmax_cgroup_io_limit_mbps = lots\n");

    let assert = tgd().arg("--config").arg(&path).assert().code(1);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("invalid value"), "got: {stderr}");
}

#[test]
fn unknown_flag_is_rejected() {
    tgd().arg("--frobnicate").assert().failure();
}
