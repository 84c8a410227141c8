// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The control loop body.
//!
//! One tick: snapshot tenant latencies, advance the tracker, mitigate each
//! emitted violation, purge stale metric files. The loop cadence, signal
//! handling, and shutdown live in `main`.

use std::collections::BTreeMap;
use tg_core::{ActionStats, Clock, FsmState, TenantId};
use tg_engine::{Actuator, StateTracker};
use tg_metrics::MetricsSource;
use tg_adapters::PartitionTool;
use tg_topology::Topology;
use tracing::{debug, info};

/// What one observation cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tenants: usize,
    pub violations: usize,
    pub actions_attempted: usize,
    pub actions_succeeded: usize,
}

/// Owns the core components for the daemon lifetime and drives them once
/// per tick.
pub struct Controller<M: MetricsSource, P: PartitionTool, C: Clock> {
    metrics: M,
    tracker: StateTracker<C>,
    actuator: Actuator<P, C>,
    topology: Topology,
    tick_count: u64,
}

impl<M: MetricsSource, P: PartitionTool, C: Clock> Controller<M, P, C> {
    pub fn new(
        metrics: M,
        tracker: StateTracker<C>,
        actuator: Actuator<P, C>,
        topology: Topology,
    ) -> Self {
        Self {
            metrics,
            tracker,
            actuator,
            topology,
            tick_count: 0,
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Run one observation-and-mitigation cycle.
    ///
    /// An empty snapshot skips the cycle entirely: no state advances, no
    /// purging. Violation mitigation is isolated per violation; a failed
    /// mitigation shows up in its action records, never as an error here.
    pub async fn tick(&mut self) -> TickReport {
        self.tick_count += 1;
        let tick = self.tick_count;
        debug!(tick, "starting observation cycle");

        let snapshot = self.metrics.snapshot().await;
        if snapshot.is_empty() {
            debug!(tick, "no tenant metrics this cycle");
            return TickReport::default();
        }

        let violations = self.tracker.advance(&snapshot);

        let mut attempted = 0;
        let mut succeeded = 0;
        for violation in &violations {
            let records = self.actuator.mitigate(violation).await;
            let ok = records.iter().filter(|r| r.success).count();
            info!(
                victim = %violation.victim_tenant,
                succeeded = ok,
                attempted = records.len(),
                "violation mitigated"
            );
            attempted += records.len();
            succeeded += ok;
        }

        let active: Vec<TenantId> = snapshot.keys().copied().collect();
        self.metrics.purge_stale(&active);

        info!(
            tick,
            tenants = snapshot.len(),
            violations = violations.len(),
            states = ?self.tracker.state_summary(),
            "cycle complete"
        );

        TickReport {
            tenants: snapshot.len(),
            violations: violations.len(),
            actions_attempted: attempted,
            actions_succeeded: succeeded,
        }
    }

    pub fn action_stats(&self) -> ActionStats {
        self.actuator.stats()
    }

    pub fn state_summary(&self) -> BTreeMap<&'static str, usize> {
        self.tracker.state_summary()
    }

    pub fn tenant_state(&self, tenant: TenantId) -> Option<FsmState> {
        self.tracker.get_state(tenant)
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
