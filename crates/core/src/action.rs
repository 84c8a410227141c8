// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mitigation action records and their bounded history.

use crate::id::{DeviceId, TenantId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::VecDeque;

/// Default capacity of the action history ring.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1024;

/// What a mitigation step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    IoThrottle,
    PartitionReconfig,
    PriorityChange,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::IoThrottle => "io_throttle",
            ActionKind::PartitionReconfig => "partition_reconfig",
            ActionKind::PriorityChange => "priority_change",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one attempted mitigation step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    pub kind: ActionKind,
    pub success: bool,
    pub message: String,
    pub at_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_tenant: Option<TenantId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_device: Option<DeviceId>,
}

/// Success/failure counts for one action kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindStats {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
}

/// Aggregate view over the retained action history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStats {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub per_kind: BTreeMap<ActionKind, KindStats>,
}

/// Bounded ring of action records, oldest evicted first.
#[derive(Debug)]
pub struct ActionHistory {
    records: VecDeque<ActionRecord>,
    capacity: usize,
}

impl Default for ActionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl ActionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, record: ActionRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent records, oldest first, optionally restricted to one
    /// kind, capped at `limit`.
    pub fn history(&self, kind: Option<ActionKind>, limit: usize) -> Vec<ActionRecord> {
        let matching: Vec<&ActionRecord> = self
            .records
            .iter()
            .filter(|r| kind.map_or(true, |k| r.kind == k))
            .collect();
        let skip = matching.len().saturating_sub(limit);
        matching.into_iter().skip(skip).cloned().collect()
    }

    pub fn stats(&self) -> ActionStats {
        let mut stats = ActionStats::default();
        for record in &self.records {
            stats.total += 1;
            let kind = stats.per_kind.entry(record.kind).or_default();
            kind.total += 1;
            if record.success {
                stats.succeeded += 1;
                kind.succeeded += 1;
            } else {
                stats.failed += 1;
                kind.failed += 1;
            }
        }
        stats
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
