// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tg-topology: accelerator inventory and affinity model.
//!
//! One-shot discovery parses a bus-topology listing and a hardware-locality
//! listing into per-accelerator records (bus path, NUMA node), which back
//! affinity-penalty queries for partition selection. Discovery never fails:
//! missing tools degrade to a deterministic synthetic topology.

pub mod bus;
pub mod model;
pub mod numa;

pub use bus::{parse_bus_tree, BusNode, BusNodeKind};
pub use model::{AcceleratorInfo, Topology};
pub use numa::parse_numa_listing;
