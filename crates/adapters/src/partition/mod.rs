// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Accelerator partition management adapters.
//!
//! Partition reconfiguration reshapes one accelerator into hardware-isolated
//! instances. The production adapter shells out to the vendor toolchain;
//! tests use the recording fake.

mod smi;

pub use smi::SmiPartitionTool;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakePartitionTool, PartitionCall};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from partition-management operations
#[derive(Debug, Error)]
pub enum PartitionError {
    #[error("{0}")]
    ToolFailed(String),
}

/// Adapter for reshaping an accelerator into isolated partitions.
///
/// All three operations address the device by its toolchain index.
#[async_trait]
pub trait PartitionTool: Clone + Send + Sync + 'static {
    /// Turn partition mode off. Commonly fails when already off; callers
    /// treat that as non-fatal.
    async fn disable_partitioning(&self, device_index: u32) -> Result<(), PartitionError>;

    /// Turn partition mode on.
    async fn enable_partitioning(&self, device_index: u32) -> Result<(), PartitionError>;

    /// Create instances according to a profile spec such as `1g.5gb:7`.
    async fn create_instances(
        &self,
        device_index: u32,
        profile: &str,
    ) -> Result<(), PartitionError>;
}
