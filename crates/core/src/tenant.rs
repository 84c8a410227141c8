// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-tenant tracking state.

use crate::id::{DeviceId, TenantId};
use crate::sample::{LatencySample, SampleWindow};
use serde::{Deserialize, Serialize};

/// Where a tenant sits in the breach-persistence machine.
///
/// `Normal → Degraded → Violated → Cooldown → Normal`. A tenant in
/// `Cooldown` ignores observations; only the per-tick decrement moves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FsmState {
    Normal,
    Degraded,
    Violated,
    Cooldown,
}

impl FsmState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FsmState::Normal => "normal",
            FsmState::Degraded => "degraded",
            FsmState::Violated => "violated",
            FsmState::Cooldown => "cooldown",
        }
    }
}

impl std::fmt::Display for FsmState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracking record for one observed tenant.
///
/// Exists exactly while the tenant appears in the most recent snapshot;
/// absence garbage-collects the record, cooldown included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantRecord {
    pub tenant_id: TenantId,
    /// Assigned lazily at violation-synthesis time when no ground-truth
    /// mapping is available.
    pub device_id: Option<DeviceId>,
    pub state: FsmState,
    pub consecutive_breaches: u32,
    pub cooldown_remaining: u32,
    pub history: SampleWindow,
    pub last_action_at_ms: u64,
}

impl TenantRecord {
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            device_id: None,
            state: FsmState::Normal,
            consecutive_breaches: 0,
            cooldown_remaining: 0,
            history: SampleWindow::new(),
            last_action_at_ms: 0,
        }
    }

    pub fn observe(&mut self, at_ms: u64, latency_ms: f64) {
        self.history.push(LatencySample { at_ms, latency_ms });
    }

    pub fn in_cooldown(&self) -> bool {
        self.state == FsmState::Cooldown && self.cooldown_remaining > 0
    }

    /// Enter cooldown for `ticks` observation cycles. The breach streak
    /// ends here; a tenant leaving cooldown starts over from a clean slate.
    pub fn begin_cooldown(&mut self, ticks: u32, now_ms: u64) {
        self.state = FsmState::Cooldown;
        self.cooldown_remaining = ticks;
        self.consecutive_breaches = 0;
        self.last_action_at_ms = now_ms;
    }

    /// Advance the cooldown by one tick. Returns true when the cooldown
    /// ended and the tenant moved back to `Normal`.
    pub fn tick_cooldown(&mut self) -> bool {
        if self.cooldown_remaining > 0 {
            self.cooldown_remaining -= 1;
        }
        if self.cooldown_remaining == 0 && self.state == FsmState::Cooldown {
            self.state = FsmState::Normal;
            return true;
        }
        false
    }
}

#[cfg(test)]
#[path = "tenant_tests.rs"]
mod tests;
