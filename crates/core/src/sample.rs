// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded latency history per tenant.

use crate::id::TenantId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// How many observations a tenant's history retains.
pub const SAMPLE_CAPACITY: usize = 10;

/// One tick's observation: tenant id to p99 latency in milliseconds.
///
/// Insertion-ordered so a run's iteration order is deterministic, but
/// callers must not rely on any particular order.
pub type LatencySnapshot = IndexMap<TenantId, f64>;

/// One p99 latency observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencySample {
    pub at_ms: u64,
    pub latency_ms: f64,
}

/// Fixed-capacity ring of recent samples, oldest evicted first.
///
/// Samples are pushed in observation order, so iteration is in
/// non-decreasing timestamp order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleWindow {
    samples: VecDeque<LatencySample>,
}

impl SampleWindow {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(SAMPLE_CAPACITY),
        }
    }

    pub fn push(&mut self, sample: LatencySample) {
        if self.samples.len() == SAMPLE_CAPACITY {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LatencySample> {
        self.samples.iter()
    }

    /// Latency values of the most recent `count` samples, oldest first.
    /// Returns fewer when the history is shorter.
    pub fn recent_latencies(&self, count: usize) -> Vec<f64> {
        let skip = self.samples.len().saturating_sub(count);
        self.samples.iter().skip(skip).map(|s| s.latency_ms).collect()
    }

    /// Mean latency over the most recent `count` samples, or `None` when
    /// the history is empty.
    pub fn mean_recent(&self, count: usize) -> Option<f64> {
        let recent = self.recent_latencies(count);
        if recent.is_empty() {
            return None;
        }
        Some(recent.iter().sum::<f64>() / recent.len() as f64)
    }
}

#[cfg(test)]
#[path = "sample_tests.rs"]
mod tests;
