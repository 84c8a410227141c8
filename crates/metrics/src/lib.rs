// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tg-metrics: best-effort per-tenant latency snapshots.
//!
//! Each tick enumerates candidate tenants (accelerator process listing,
//! falling back to a command-line scan) and reads their metric files into
//! a `tenant id -> p99 latency` snapshot. Individual failures drop the
//! tenant, never the tick.

pub mod listing;
pub mod sample_file;
pub mod source;

pub use listing::{parse_process_listing, TenantProcess};
pub use sample_file::parse_metric_content;
pub use source::{FileMetricsSource, MetricsSource};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use source::FakeMetricsSource;
