// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A detected SLO violation, ready for mitigation.

use crate::id::{DeviceId, TenantId};
use serde::{Deserialize, Serialize};

/// One victim tenant whose p99 latency persistently exceeded the SLO,
/// together with the co-resident tenants presumed to interfere.
///
/// Synthesized at most once per victim per tick; consumed by the actuator
/// and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub victim_tenant: TenantId,
    pub victim_device: DeviceId,
    /// Co-resident tenants not themselves violated, in device-group order.
    /// Copied at emission; later state changes do not affect it.
    pub bully_tenants: Vec<TenantId>,
    /// Normalised excess latency: `(mean_recent - threshold) / threshold`.
    pub severity: f64,
    pub created_at_ms: u64,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "victim={} device={} bullies={:?} severity={:.2}",
            self.victim_tenant,
            self.victim_device,
            self.bully_tenants.iter().map(|t| t.as_u32()).collect::<Vec<_>>(),
            self.severity
        )
    }
}
