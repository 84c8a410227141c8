// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-tenant violation tracking.
//!
//! Each tick advances every observed tenant through
//! `Normal → Degraded → Violated → Cooldown → Normal`, then synthesizes at
//! most one violation per victim. The persistence window filters transient
//! spikes; the cooldown keeps a just-mitigated tenant from being acted on
//! again while the mitigation settles.

use indexmap::IndexMap;
use std::collections::BTreeMap;
use tg_core::{Clock, DeviceId, FsmState, LatencySnapshot, TenantId, TenantRecord, Violation};
use tracing::{debug, info, warn};

/// How many of the newest samples feed the severity mean.
const SEVERITY_SAMPLE_COUNT: usize = 3;

/// Immutable tracker parameters.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// SLO ceiling for p99 latency; a breach is strictly above this.
    pub tail_threshold_ms: f64,
    /// Consecutive breaches required to promote Degraded to Violated.
    pub persistence_windows: u32,
    /// Observation cycles a victim sits out after mitigation.
    pub cooldown_observations: u32,
}

/// Tracks every observed tenant and synthesizes violations.
pub struct StateTracker<C: Clock> {
    config: TrackerConfig,
    clock: C,
    tenants: IndexMap<TenantId, TenantRecord>,
}

impl<C: Clock> StateTracker<C> {
    pub fn new(config: TrackerConfig, clock: C) -> Self {
        info!(
            threshold_ms = config.tail_threshold_ms,
            persistence = config.persistence_windows,
            cooldown = config.cooldown_observations,
            "state tracker initialized"
        );
        Self {
            config,
            clock,
            tenants: IndexMap::new(),
        }
    }

    /// Advance every tenant by one observation cycle and return the
    /// violations to act on this tick.
    ///
    /// Order matters: observations apply first, then cooldown ticks, then
    /// garbage collection of unobserved tenants, then violation synthesis.
    pub fn advance(&mut self, snapshot: &LatencySnapshot) -> Vec<Violation> {
        let now_ms = self.clock.epoch_ms();

        for (&tenant_id, &latency_ms) in snapshot {
            self.observe_tenant(tenant_id, latency_ms, now_ms);
        }

        for record in self.tenants.values_mut() {
            if record.state == FsmState::Cooldown && record.tick_cooldown() {
                debug!(tenant = %record.tenant_id, "cooldown period ended");
            }
        }

        // Unobserved tenants are dropped unconditionally, cooldown included;
        // a reused pid starts over as a fresh tenant.
        let before = self.tenants.len();
        self.tenants.retain(|tenant_id, _| {
            let keep = snapshot.contains_key(tenant_id);
            if !keep {
                debug!(tenant = %tenant_id, "dropping state for inactive tenant");
            }
            keep
        });
        let dropped = before - self.tenants.len();
        if dropped > 0 {
            info!(dropped, "cleaned up stale tenant state");
        }

        let violations = self.detect_violations(now_ms);
        if !violations.is_empty() {
            warn!(count = violations.len(), "detected SLO violations");
            for violation in &violations {
                warn!(%violation, "violation");
            }
        }

        violations
    }

    fn observe_tenant(&mut self, tenant_id: TenantId, latency_ms: f64, now_ms: u64) {
        let record = self
            .tenants
            .entry(tenant_id)
            .or_insert_with(|| TenantRecord::new(tenant_id));
        record.observe(now_ms, latency_ms);

        let breach = latency_ms > self.config.tail_threshold_ms;
        match record.state {
            FsmState::Normal if breach => {
                record.state = FsmState::Degraded;
                record.consecutive_breaches = 1;
                debug!(tenant = %tenant_id, latency_ms, "tenant degraded");
                if record.consecutive_breaches >= self.config.persistence_windows {
                    record.state = FsmState::Violated;
                    info!(tenant = %tenant_id, "tenant violated on first breach");
                }
            }
            FsmState::Degraded if breach => {
                record.consecutive_breaches += 1;
                if record.consecutive_breaches >= self.config.persistence_windows {
                    record.state = FsmState::Violated;
                    info!(
                        tenant = %tenant_id,
                        breaches = record.consecutive_breaches,
                        "tenant violated after consecutive breaches"
                    );
                }
            }
            FsmState::Degraded | FsmState::Violated if !breach => {
                record.state = FsmState::Normal;
                record.consecutive_breaches = 0;
                debug!(tenant = %tenant_id, latency_ms, "tenant recovered");
            }
            // Violated stays under continued breach until emission moves it
            // to cooldown; cooldown ignores observations entirely.
            _ => {}
        }
    }

    /// Group surviving tenants by device and emit one violation per victim.
    ///
    /// Victims and candidate bullies are classified per device group before
    /// any emission, so two tenants violated in the same tick never appear
    /// in each other's bully lists.
    fn detect_violations(&mut self, now_ms: u64) -> Vec<Violation> {
        let mut groups: IndexMap<DeviceId, Vec<TenantId>> = IndexMap::new();
        for (&tenant_id, record) in &mut self.tenants {
            let device = record
                .device_id
                .get_or_insert_with(|| DeviceId::synthetic(tenant_id.as_u32() % 2))
                .clone();
            groups.entry(device).or_default().push(tenant_id);
        }

        let mut violations = Vec::new();

        for (device, members) in groups {
            let mut victims = Vec::new();
            let mut bullies = Vec::new();
            for &tenant_id in &members {
                let Some(record) = self.tenants.get(&tenant_id) else {
                    continue;
                };
                if record.state == FsmState::Violated && !record.in_cooldown() {
                    victims.push(tenant_id);
                } else if record.state != FsmState::Violated {
                    bullies.push(tenant_id);
                }
            }

            for victim in victims {
                let Some(record) = self.tenants.get_mut(&victim) else {
                    continue;
                };
                let Some(mean) = record.history.mean_recent(SEVERITY_SAMPLE_COUNT) else {
                    continue;
                };
                let severity = ((mean - self.config.tail_threshold_ms)
                    / self.config.tail_threshold_ms)
                    .max(0.0);

                violations.push(Violation {
                    victim_tenant: victim,
                    victim_device: device.clone(),
                    bully_tenants: bullies.clone(),
                    severity,
                    created_at_ms: now_ms,
                });

                record.begin_cooldown(self.config.cooldown_observations, now_ms);
                info!(
                    tenant = %victim,
                    device = %device,
                    severity,
                    cooldown = self.config.cooldown_observations,
                    "victim mitigated, entering cooldown"
                );
            }
        }

        violations
    }

    pub fn get_state(&self, tenant_id: TenantId) -> Option<FsmState> {
        self.tenants.get(&tenant_id).map(|r| r.state)
    }

    /// Read-only copy of one tenant's record.
    pub fn get_record(&self, tenant_id: TenantId) -> Option<TenantRecord> {
        self.tenants.get(&tenant_id).cloned()
    }

    pub fn snapshot_states(&self) -> IndexMap<TenantId, FsmState> {
        self.tenants.iter().map(|(&id, r)| (id, r.state)).collect()
    }

    /// Tenant counts per state, every state present.
    pub fn state_summary(&self) -> BTreeMap<&'static str, usize> {
        let mut summary: BTreeMap<&'static str, usize> = [
            (FsmState::Normal.as_str(), 0),
            (FsmState::Degraded.as_str(), 0),
            (FsmState::Violated.as_str(), 0),
            (FsmState::Cooldown.as_str(), 0),
        ]
        .into_iter()
        .collect();

        for record in self.tenants.values() {
            if let Some(count) = summary.get_mut(record.state.as_str()) {
                *count += 1;
            }
        }
        summary
    }

    /// Operator override: push a tenant into cooldown for `ticks` cycles
    /// (the configured cooldown when unspecified). Returns false for an
    /// unknown tenant.
    pub fn force_cooldown(&mut self, tenant_id: TenantId, ticks: Option<u32>) -> bool {
        let now_ms = self.clock.epoch_ms();
        let cooldown = ticks.unwrap_or(self.config.cooldown_observations);
        let Some(record) = self.tenants.get_mut(&tenant_id) else {
            return false;
        };

        record.begin_cooldown(cooldown, now_ms);
        info!(tenant = %tenant_id, ticks = cooldown, "forced tenant into cooldown");
        true
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
