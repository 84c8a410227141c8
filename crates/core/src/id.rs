// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier types for tenants and accelerator devices.

use serde::{Deserialize, Serialize};

/// Process id of a workload co-tenanting an accelerator.
///
/// Created on first observation in a metrics snapshot; the record keyed by
/// it is dropped as soon as the tenant stops appearing in snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantId(pub u32);

impl TenantId {
    pub fn new(pid: u32) -> Self {
        Self(pid)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TenantId {
    fn from(pid: u32) -> Self {
        Self(pid)
    }
}

/// Stable identifier for one accelerator device.
///
/// Real devices carry the vendor UUID; synthetic devices use the
/// `GPU-%08d-mock-uuid` form produced by [`DeviceId::synthetic`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Synthetic device id for a device index, used when no ground-truth
    /// UUID is available (process-listing fallback, topology fallback).
    pub fn synthetic(index: u32) -> Self {
        Self(format!("GPU-{index:08}-mock-uuid"))
    }

    /// Parse the device index out of a synthetic id.
    ///
    /// Returns `None` for real vendor UUIDs, which need a toolchain lookup
    /// instead.
    pub fn synthetic_index(&self) -> Option<u32> {
        if !self.0.ends_with("-mock-uuid") {
            return None;
        }
        self.0.split('-').nth(1)?.parse().ok()
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::borrow::Borrow<str> for DeviceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
