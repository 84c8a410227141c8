// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake partition tool for testing

use super::{PartitionError, PartitionTool};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Recorded partition operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionCall {
    Disable(u32),
    Enable(u32),
    Create(u32, String),
}

struct FakePartitionState {
    calls: Vec<PartitionCall>,
    fail_disable: bool,
    fail_enable: bool,
    fail_create: bool,
    unavailable: bool,
}

/// Fake partition tool that records calls and returns scripted results.
#[derive(Clone)]
pub struct FakePartitionTool {
    inner: Arc<Mutex<FakePartitionState>>,
}

impl Default for FakePartitionTool {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakePartitionState {
                calls: Vec::new(),
                fail_disable: false,
                fail_enable: false,
                fail_create: false,
                unavailable: false,
            })),
        }
    }
}

impl FakePartitionTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Behave as if the toolchain binary is absent: every call fails.
    pub fn unavailable() -> Self {
        let tool = Self::default();
        tool.inner.lock().unavailable = true;
        tool
    }

    pub fn fail_disable(self) -> Self {
        self.inner.lock().fail_disable = true;
        self
    }

    pub fn fail_enable(self) -> Self {
        self.inner.lock().fail_enable = true;
        self
    }

    pub fn fail_create(self) -> Self {
        self.inner.lock().fail_create = true;
        self
    }

    /// Get all recorded operations
    pub fn calls(&self) -> Vec<PartitionCall> {
        self.inner.lock().calls.clone()
    }

    fn record(&self, call: PartitionCall, fail: impl Fn(&FakePartitionState) -> bool, what: &str) -> Result<(), PartitionError> {
        let mut state = self.inner.lock();
        state.calls.push(call);
        if state.unavailable {
            return Err(PartitionError::ToolFailed(
                "partition tool not found".to_string(),
            ));
        }
        if fail(&state) {
            return Err(PartitionError::ToolFailed(format!("{what} failed")));
        }
        Ok(())
    }
}

#[async_trait]
impl PartitionTool for FakePartitionTool {
    async fn disable_partitioning(&self, device_index: u32) -> Result<(), PartitionError> {
        self.record(
            PartitionCall::Disable(device_index),
            |s| s.fail_disable,
            "partition disable",
        )
    }

    async fn enable_partitioning(&self, device_index: u32) -> Result<(), PartitionError> {
        self.record(
            PartitionCall::Enable(device_index),
            |s| s.fail_enable,
            "partition enable",
        )
    }

    async fn create_instances(
        &self,
        device_index: u32,
        profile: &str,
    ) -> Result<(), PartitionError> {
        self.record(
            PartitionCall::Create(device_index, profile.to_string()),
            |s| s.fail_create,
            "partition create",
        )
    }
}
