// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::id::TenantId;

#[test]
fn new_record_is_normal() {
    let record = TenantRecord::new(TenantId::new(1234));
    assert_eq!(record.state, FsmState::Normal);
    assert_eq!(record.consecutive_breaches, 0);
    assert_eq!(record.cooldown_remaining, 0);
    assert!(record.history.is_empty());
    assert!(!record.in_cooldown());
}

#[test]
fn observe_appends_history() {
    let mut record = TenantRecord::new(TenantId::new(1));
    record.observe(10, 50.0);
    record.observe(20, 60.0);
    assert_eq!(record.history.len(), 2);
}

#[test]
fn cooldown_lifecycle() {
    let mut record = TenantRecord::new(TenantId::new(1));
    record.consecutive_breaches = 5;
    record.begin_cooldown(3, 1_000);

    assert_eq!(record.state, FsmState::Cooldown);
    assert_eq!(record.cooldown_remaining, 3);
    assert_eq!(record.consecutive_breaches, 0);
    assert_eq!(record.last_action_at_ms, 1_000);
    assert!(record.in_cooldown());

    assert!(!record.tick_cooldown());
    assert_eq!(record.cooldown_remaining, 2);
    assert!(record.in_cooldown());

    assert!(!record.tick_cooldown());
    assert!(record.tick_cooldown());
    assert_eq!(record.state, FsmState::Normal);
    assert_eq!(record.cooldown_remaining, 0);
    assert!(!record.in_cooldown());
}

#[test]
fn tick_cooldown_outside_cooldown_is_noop() {
    let mut record = TenantRecord::new(TenantId::new(1));
    assert!(!record.tick_cooldown());
    assert_eq!(record.state, FsmState::Normal);
}

#[test]
fn fsm_state_display() {
    assert_eq!(FsmState::Normal.to_string(), "normal");
    assert_eq!(FsmState::Degraded.to_string(), "degraded");
    assert_eq!(FsmState::Violated.to_string(), "violated");
    assert_eq!(FsmState::Cooldown.to_string(), "cooldown");
}

#[test]
fn fsm_state_serde() {
    let json = serde_json::to_string(&FsmState::Degraded).unwrap();
    assert_eq!(json, "\"degraded\"");
}
