// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Partition management via the vendor system-management CLI.

use super::{PartitionError, PartitionTool};
use crate::subprocess::{run_with_timeout, PARTITION_CREATE_TIMEOUT, PARTITION_TOGGLE_TIMEOUT};
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;

/// Production partition tool backed by `nvidia-smi`.
#[derive(Debug, Clone)]
pub struct SmiPartitionTool {
    binary: String,
}

impl Default for SmiPartitionTool {
    fn default() -> Self {
        Self {
            binary: "nvidia-smi".to_string(),
        }
    }
}

impl SmiPartitionTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tool binary (tests point this at a stub script).
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn run(
        &self,
        args: &[String],
        timeout: Duration,
        description: &str,
    ) -> Result<(), PartitionError> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args);

        let output = run_with_timeout(cmd, timeout, description)
            .await
            .map_err(PartitionError::ToolFailed)?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(PartitionError::ToolFailed(format!(
            "{} exited with {}: {}",
            description,
            output.status,
            stderr.trim()
        )))
    }
}

#[async_trait]
impl PartitionTool for SmiPartitionTool {
    async fn disable_partitioning(&self, device_index: u32) -> Result<(), PartitionError> {
        let args = vec![
            "-i".to_string(),
            device_index.to_string(),
            "-mig".to_string(),
            "0".to_string(),
        ];
        self.run(&args, PARTITION_TOGGLE_TIMEOUT, "partition disable")
            .await
    }

    async fn enable_partitioning(&self, device_index: u32) -> Result<(), PartitionError> {
        let args = vec![
            "-i".to_string(),
            device_index.to_string(),
            "-mig".to_string(),
            "1".to_string(),
        ];
        self.run(&args, PARTITION_TOGGLE_TIMEOUT, "partition enable")
            .await
    }

    async fn create_instances(
        &self,
        device_index: u32,
        profile: &str,
    ) -> Result<(), PartitionError> {
        let args = vec![
            "mig".to_string(),
            "-i".to_string(),
            device_index.to_string(),
            "-cgi".to_string(),
            profile.to_string(),
        ];
        self.run(&args, PARTITION_CREATE_TIMEOUT, "partition create")
            .await
    }
}

#[cfg(test)]
#[path = "smi_tests.rs"]
mod tests;
