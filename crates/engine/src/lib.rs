// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tg-engine: the closed-loop SLO controller core.
//!
//! [`tracker::StateTracker`] turns latency snapshots into violations
//! through a per-tenant persistence machine; [`actuator::Actuator`]
//! executes the tiered mitigation for each violation.

pub mod actuator;
pub mod tracker;

pub use actuator::{compute_io_limit_bytes, select_partition_profile, Actuator, ActuatorConfig};
pub use tracker::{StateTracker, TrackerConfig};
