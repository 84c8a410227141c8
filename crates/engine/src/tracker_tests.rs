// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tg_core::{DeviceId, FakeClock, FsmState, LatencySnapshot, TenantId};

fn tracker(threshold: f64, persistence: u32, cooldown: u32) -> (StateTracker<FakeClock>, FakeClock) {
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_700_000_000_000);
    let tracker = StateTracker::new(
        TrackerConfig {
            tail_threshold_ms: threshold,
            persistence_windows: persistence,
            cooldown_observations: cooldown,
        },
        clock.clone(),
    );
    (tracker, clock)
}

fn snap(pairs: &[(u32, f64)]) -> LatencySnapshot {
    pairs
        .iter()
        .map(|&(pid, lat)| (TenantId::new(pid), lat))
        .collect()
}

fn tid(pid: u32) -> TenantId {
    TenantId::new(pid)
}

#[test]
fn persistence_filter_promotes_on_second_breach() {
    let (mut tracker, clock) = tracker(100.0, 2, 3);

    let violations = tracker.advance(&snap(&[(1, 150.0)]));
    assert!(violations.is_empty());
    assert_eq!(tracker.get_state(tid(1)), Some(FsmState::Degraded));

    clock.advance_ms(30_000);
    let violations = tracker.advance(&snap(&[(1, 150.0)]));
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].victim_tenant, tid(1));
    assert!((violations[0].severity - 0.5).abs() < 1e-9);
    assert!(violations[0].bully_tenants.is_empty());
    assert_eq!(tracker.get_state(tid(1)), Some(FsmState::Cooldown));
    assert_eq!(tracker.get_record(tid(1)).unwrap().cooldown_remaining, 3);

    clock.advance_ms(30_000);
    let violations = tracker.advance(&snap(&[(1, 150.0)]));
    assert!(violations.is_empty());
    assert_eq!(tracker.get_record(tid(1)).unwrap().cooldown_remaining, 2);
}

#[test]
fn recovery_before_promotion_resets_count() {
    let (mut tracker, _clock) = tracker(100.0, 3, 10);

    tracker.advance(&snap(&[(7, 200.0)]));
    assert_eq!(tracker.get_state(tid(7)), Some(FsmState::Degraded));
    assert_eq!(tracker.get_record(tid(7)).unwrap().consecutive_breaches, 1);

    tracker.advance(&snap(&[(7, 50.0)]));
    assert_eq!(tracker.get_state(tid(7)), Some(FsmState::Normal));
    assert_eq!(tracker.get_record(tid(7)).unwrap().consecutive_breaches, 0);

    tracker.advance(&snap(&[(7, 200.0)]));
    assert_eq!(tracker.get_state(tid(7)), Some(FsmState::Degraded));
    assert_eq!(tracker.get_record(tid(7)).unwrap().consecutive_breaches, 1);
}

#[test]
fn multi_tenant_grouping_by_synthetic_device() {
    let (mut tracker, _clock) = tracker(100.0, 1, 10);

    let violations = tracker.advance(&snap(&[(1, 50.0), (2, 200.0), (3, 75.0), (4, 300.0)]));

    let mut victims: Vec<u32> = violations.iter().map(|v| v.victim_tenant.as_u32()).collect();
    victims.sort_unstable();
    assert_eq!(victims, vec![2, 4]);

    // Even pids share one device, odd pids the other
    for violation in &violations {
        assert_eq!(violation.victim_device, DeviceId::synthetic(0));
        // Same-tick co-victims are classified before any emission, so
        // neither lists the other as a bully.
        assert!(violation.bully_tenants.is_empty());
    }

    // The odd-pid group had no victims
    assert_eq!(tracker.get_state(tid(1)), Some(FsmState::Normal));
    assert_eq!(tracker.get_state(tid(3)), Some(FsmState::Normal));
    assert_eq!(tracker.get_state(tid(2)), Some(FsmState::Cooldown));
    assert_eq!(tracker.get_state(tid(4)), Some(FsmState::Cooldown));
}

#[test]
fn bullies_include_co_residents_not_violated() {
    let (mut tracker, _clock) = tracker(100.0, 1, 5);

    // Tick 1: tenant 2 is the victim; co-resident 4 is quiet
    let violations = tracker.advance(&snap(&[(2, 200.0), (4, 50.0)]));
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].victim_tenant, tid(2));
    assert_eq!(violations[0].bully_tenants, vec![tid(4)]);

    // Tick 2: tenant 4 becomes the victim; tenant 2 is mid-cooldown and
    // counts as a candidate bully.
    let violations = tracker.advance(&snap(&[(2, 50.0), (4, 300.0)]));
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].victim_tenant, tid(4));
    assert_eq!(violations[0].bully_tenants, vec![tid(2)]);
}

#[test]
fn cooldown_expiry_restores_breach_eligibility() {
    let (mut tracker, _clock) = tracker(100.0, 1, 3);

    let violations = tracker.advance(&snap(&[(9, 150.0)]));
    assert_eq!(violations.len(), 1);
    assert_eq!(tracker.get_record(tid(9)).unwrap().cooldown_remaining, 3);

    // Breaches during cooldown are ignored
    let violations = tracker.advance(&snap(&[(9, 150.0)]));
    assert!(violations.is_empty());
    assert_eq!(tracker.get_record(tid(9)).unwrap().cooldown_remaining, 2);

    tracker.advance(&snap(&[(9, 50.0)]));
    assert_eq!(tracker.get_record(tid(9)).unwrap().cooldown_remaining, 1);
    assert_eq!(tracker.get_state(tid(9)), Some(FsmState::Cooldown));

    tracker.advance(&snap(&[(9, 50.0)]));
    assert_eq!(tracker.get_state(tid(9)), Some(FsmState::Normal));

    // Breach-eligible again
    let violations = tracker.advance(&snap(&[(9, 150.0)]));
    assert_eq!(violations.len(), 1);
}

#[test]
fn breach_is_strictly_above_threshold() {
    let (mut tracker, _clock) = tracker(100.0, 1, 3);

    let violations = tracker.advance(&snap(&[(1, 100.0)]));
    assert!(violations.is_empty());
    assert_eq!(tracker.get_state(tid(1)), Some(FsmState::Normal));

    let violations = tracker.advance(&snap(&[(1, 100.01)]));
    assert_eq!(violations.len(), 1);
}

#[test]
fn severity_uses_all_samples_when_fewer_than_three() {
    let (mut tracker, _clock) = tracker(100.0, 1, 3);

    // Single sample: mean is that sample
    let violations = tracker.advance(&snap(&[(1, 180.0)]));
    assert!((violations[0].severity - 0.8).abs() < 1e-9);
}

#[test]
fn severity_never_negative() {
    let (mut tracker, _clock) = tracker(100.0, 1, 3);

    tracker.advance(&snap(&[(1, 10.0)]));
    tracker.advance(&snap(&[(1, 10.0)]));
    // Promoted on this breach, but the three-sample mean sits below the
    // threshold.
    let violations = tracker.advance(&snap(&[(1, 200.0)]));
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].severity, 0.0);
}

#[test]
fn absent_tenants_garbage_collected() {
    let (mut tracker, _clock) = tracker(100.0, 2, 3);

    tracker.advance(&snap(&[(1, 150.0), (2, 50.0)]));
    assert!(tracker.get_state(tid(1)).is_some());

    tracker.advance(&snap(&[(2, 50.0)]));
    assert_eq!(tracker.get_state(tid(1)), None);
    assert!(tracker.get_state(tid(2)).is_some());
}

#[test]
fn cooldown_tenant_dropped_when_absent() {
    let (mut tracker, _clock) = tracker(100.0, 1, 10);

    tracker.advance(&snap(&[(5, 500.0)]));
    assert_eq!(tracker.get_state(tid(5)), Some(FsmState::Cooldown));

    tracker.advance(&snap(&[]));
    assert_eq!(tracker.get_state(tid(5)), None);
}

#[test]
fn force_cooldown_overrides_state() {
    let (mut tracker, _clock) = tracker(100.0, 3, 10);

    tracker.advance(&snap(&[(1, 150.0)]));
    assert!(tracker.force_cooldown(tid(1), Some(4)));
    assert_eq!(tracker.get_state(tid(1)), Some(FsmState::Cooldown));
    assert_eq!(tracker.get_record(tid(1)).unwrap().cooldown_remaining, 4);

    // Default duration comes from the config
    tracker.advance(&snap(&[(1, 50.0), (2, 50.0)]));
    assert!(tracker.force_cooldown(tid(2), None));
    assert_eq!(tracker.get_record(tid(2)).unwrap().cooldown_remaining, 10);

    assert!(!tracker.force_cooldown(tid(99), None));
}

#[test]
fn state_summary_counts_every_state() {
    let (mut tracker, _clock) = tracker(100.0, 2, 10);

    tracker.advance(&snap(&[(1, 150.0), (2, 50.0), (3, 500.0), (4, 50.0)]));
    tracker.advance(&snap(&[(1, 50.0), (2, 50.0), (3, 500.0), (4, 50.0)]));

    let summary = tracker.state_summary();
    assert_eq!(summary["normal"], 3);
    assert_eq!(summary["degraded"], 0);
    assert_eq!(summary["violated"], 0);
    assert_eq!(summary["cooldown"], 1);
}

#[test]
fn snapshot_states_reflects_records() {
    let (mut tracker, _clock) = tracker(100.0, 2, 10);
    tracker.advance(&snap(&[(1, 150.0), (2, 50.0)]));

    let states = tracker.snapshot_states();
    assert_eq!(states.len(), 2);
    assert_eq!(states[&tid(1)], FsmState::Degraded);
    assert_eq!(states[&tid(2)], FsmState::Normal);
}

#[test]
fn violation_timestamps_come_from_clock() {
    let (mut tracker, clock) = tracker(100.0, 1, 3);
    clock.set_epoch_ms(42_000);

    let violations = tracker.advance(&snap(&[(1, 150.0)]));
    assert_eq!(violations[0].created_at_ms, 42_000);
    assert_eq!(tracker.get_record(tid(1)).unwrap().last_action_at_ms, 42_000);
}

mod invariants {
    use super::*;
    use proptest::prelude::*;

    fn arb_snapshot() -> impl Strategy<Value = Vec<(u32, f64)>> {
        proptest::collection::vec((0u32..6, 0.0f64..300.0), 0..6).prop_map(|mut pairs| {
            pairs.sort_by_key(|&(pid, _)| pid);
            pairs.dedup_by_key(|&mut (pid, _)| pid);
            pairs
        })
    }

    proptest! {
        #[test]
        fn advance_preserves_invariants(snapshots in proptest::collection::vec(arb_snapshot(), 1..30)) {
            let (mut tracker, _clock) = tracker(100.0, 2, 3);

            for pairs in snapshots {
                let snapshot = snap(&pairs);
                let violations = tracker.advance(&snapshot);

                let states = tracker.snapshot_states();

                // Records exist exactly for snapshot tenants
                prop_assert_eq!(states.len(), snapshot.len());
                for tenant in snapshot.keys() {
                    prop_assert!(states.contains_key(tenant));
                }

                // At most one violation per victim; every victim cooling down
                let mut seen = std::collections::HashSet::new();
                for violation in &violations {
                    prop_assert!(seen.insert(violation.victim_tenant));
                    prop_assert_eq!(
                        tracker.get_state(violation.victim_tenant),
                        Some(FsmState::Cooldown)
                    );
                    prop_assert!(violation.severity >= 0.0);
                }

                for (tenant, state) in states {
                    let record = tracker.get_record(tenant).unwrap();
                    // History bounded
                    prop_assert!(record.history.len() <= tg_core::SAMPLE_CAPACITY);
                    // Cooldown iff remaining > 0
                    prop_assert_eq!(state == FsmState::Cooldown, record.cooldown_remaining > 0);
                    // Breach count only in breach states
                    if record.consecutive_breaches > 0 {
                        prop_assert!(matches!(
                            record.state,
                            FsmState::Degraded | FsmState::Violated
                        ));
                    }
                }
            }
        }
    }
}
