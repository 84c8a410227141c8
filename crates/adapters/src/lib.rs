// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for external I/O: subprocess invocation, the unified cgroup
//! hierarchy, kernel block-device listings, and the accelerator partition
//! toolchain.

pub mod blockdev;
pub mod cgroup;
pub mod partition;
pub mod subprocess;

pub use blockdev::{parse_throttle_targets, BlockDevices};
pub use cgroup::CgroupFs;
pub use partition::{PartitionError, PartitionTool, SmiPartitionTool};
pub use subprocess::{
    run_capturing, run_with_timeout, PARTITION_CREATE_TIMEOUT, PARTITION_TOGGLE_TIMEOUT,
    PROCESS_LISTING_TIMEOUT,
};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use partition::{FakePartitionTool, PartitionCall};
