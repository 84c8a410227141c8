// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution helpers

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Default timeout for the accelerator process-listing tool.
pub const PROCESS_LISTING_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for toggling partition mode on a device.
pub const PARTITION_TOGGLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for creating partition instances.
pub const PARTITION_CREATE_TIMEOUT: Duration = Duration::from_secs(60);

/// Run a subprocess command with a timeout.
///
/// Wraps `Command::output()` with `tokio::time::timeout`, converting
/// timeout expiration into a descriptive error message. The child process
/// is killed automatically if the timeout elapses (via the tokio `Child`
/// drop implementation).
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, String> {
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(io_err)) => Err(format!("{} failed: {}", description, io_err)),
        Err(_elapsed) => Err(format!(
            "{} timed out after {}s",
            description,
            timeout.as_secs()
        )),
    }
}

/// Run a subprocess command to completion with no timeout.
///
/// Reserved for one-shot startup work (topology discovery) that carries
/// no duration bound.
pub async fn run_capturing(mut cmd: Command, description: &str) -> Result<Output, String> {
    cmd.output()
        .await
        .map_err(|io_err| format!("{} failed: {}", description, io_err))
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
