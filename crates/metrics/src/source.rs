// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot sources.

use crate::listing::{self, TenantProcess};
use crate::sample_file;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tg_adapters::subprocess::{run_with_timeout, PROCESS_LISTING_TIMEOUT};
use tg_core::{DeviceId, LatencySnapshot, TenantId};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Produces the per-tick `tenant id -> p99 latency` snapshot.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Best-effort snapshot; tenants without a valid metric are omitted.
    async fn snapshot(&self) -> LatencySnapshot;

    /// Delete metric files for tenants no longer active.
    fn purge_stale(&self, active: &[TenantId]);
}

/// Production source: candidate tenants from the accelerator process
/// listing (with a command-line-scan fallback), latencies from per-tenant
/// metric files.
#[derive(Debug, Clone)]
pub struct FileMetricsSource {
    metrics_dir: PathBuf,
    proc_root: PathBuf,
    listing_binary: String,
    smoke: bool,
}

impl FileMetricsSource {
    /// Default metrics directory for deployed daemons.
    pub const DEFAULT_METRICS_DIR: &'static str = "/var/run/tenant_metrics";

    pub fn new(metrics_dir: impl Into<PathBuf>) -> Self {
        let source = Self {
            metrics_dir: metrics_dir.into(),
            proc_root: PathBuf::from("/proc"),
            listing_binary: "nvidia-smi".to_string(),
            smoke: false,
        };
        source.ensure_metrics_dir();
        source
    }

    /// Override the process-listing binary (tests point this at a stub).
    pub fn with_listing_binary(mut self, binary: impl Into<String>) -> Self {
        self.listing_binary = binary.into();
        self
    }

    /// Override the process-table root used by the fallback scan.
    pub fn with_proc_root(mut self, proc_root: impl Into<PathBuf>) -> Self {
        self.proc_root = proc_root.into();
        self
    }

    /// Smoke mode: synthesize deterministic tenants and latencies when the
    /// host provides none. Only reachable from test builds so production
    /// never fabricates metrics.
    #[cfg(any(test, feature = "test-support"))]
    pub fn smoke_mode(mut self) -> Self {
        self.smoke = true;
        self
    }

    fn ensure_metrics_dir(&self) {
        if let Err(err) = std::fs::create_dir_all(&self.metrics_dir) {
            warn!(
                dir = %self.metrics_dir.display(),
                error = %err,
                "cannot create metrics directory; relying on the producer to create it"
            );
        }
    }

    fn metric_path(&self, tenant: TenantId) -> PathBuf {
        self.metrics_dir.join(format!("{tenant}.metric"))
    }

    /// Write the canonical metric file for a tenant. Test-only: the
    /// producer side belongs to the tenant latency exporter.
    #[cfg(any(test, feature = "test-support"))]
    pub fn write_sample(&self, tenant: TenantId, latency_ms: f64) -> std::io::Result<()> {
        std::fs::write(
            self.metric_path(tenant),
            format!("p99_latency_ms: {latency_ms:.2}\n"),
        )
    }

    async fn run_listing_tool(&self) -> Result<Vec<TenantProcess>, String> {
        let mut cmd = Command::new(&self.listing_binary);
        cmd.args(["pmon", "-c", "1", "-s", "um"]);

        let output = run_with_timeout(cmd, PROCESS_LISTING_TIMEOUT, "process listing").await?;
        if !output.status.success() {
            return Err(format!("process listing exited with {}", output.status));
        }

        Ok(listing::parse_process_listing(&String::from_utf8_lossy(
            &output.stdout,
        )))
    }

    async fn candidates(&self) -> Vec<TenantProcess> {
        let mut candidates = match self.run_listing_tool().await {
            Ok(processes) => processes,
            Err(err) => {
                warn!(error = %err, "process listing unavailable, scanning command lines");
                listing::scan_cmdlines(&self.proc_root)
            }
        };

        if candidates.is_empty() && self.smoke {
            debug!("no tenants detected, synthesizing smoke-mode pair");
            candidates = (0..2u32)
                .map(|i| TenantProcess {
                    tenant: TenantId::new(1000 + i),
                    device: DeviceId::synthetic(i),
                })
                .collect();
        }

        candidates
    }

    /// Deterministic latency for smoke mode; varies by pid so some tenants
    /// sit above a default threshold and some below.
    fn synthetic_latency(tenant: TenantId) -> f64 {
        50.0 + f64::from(tenant.as_u32() % 100)
    }
}

#[async_trait]
impl MetricsSource for FileMetricsSource {
    async fn snapshot(&self) -> LatencySnapshot {
        let mut snapshot = LatencySnapshot::new();

        for candidate in self.candidates().await {
            match sample_file::read_metric(&self.metric_path(candidate.tenant)) {
                Some(latency) => {
                    snapshot.insert(candidate.tenant, latency);
                }
                None if self.smoke => {
                    snapshot.insert(candidate.tenant, Self::synthetic_latency(candidate.tenant));
                }
                None => {
                    debug!(tenant = %candidate.tenant, "no valid metric, omitting tenant");
                }
            }
        }

        info!(tenants = snapshot.len(), "collected latency snapshot");
        snapshot
    }

    fn purge_stale(&self, active: &[TenantId]) {
        let entries = match std::fs::read_dir(&self.metrics_dir) {
            Ok(entries) => entries,
            Err(_) => return,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("metric") {
                continue;
            }
            let Some(pid) = metric_stem_pid(&path) else {
                continue;
            };
            if active.contains(&TenantId::new(pid)) {
                continue;
            }

            match std::fs::remove_file(&path) {
                Ok(()) => debug!(pid, "purged stale metric file"),
                Err(err) => debug!(pid, error = %err, "failed to purge stale metric file"),
            }
        }
    }
}

fn metric_stem_pid(path: &Path) -> Option<u32> {
    path.file_stem()?.to_str()?.parse().ok()
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use tg_core::{LatencySnapshot, TenantId};

    struct FakeMetricsState {
        snapshots: VecDeque<LatencySnapshot>,
        purges: Vec<Vec<TenantId>>,
    }

    /// Fake source that replays scripted snapshots and records purges.
    #[derive(Clone)]
    pub struct FakeMetricsSource {
        inner: Arc<Mutex<FakeMetricsState>>,
    }

    impl Default for FakeMetricsSource {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeMetricsState {
                    snapshots: VecDeque::new(),
                    purges: Vec::new(),
                })),
            }
        }
    }

    impl FakeMetricsSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_snapshot(&self, snapshot: LatencySnapshot) {
            self.inner.lock().snapshots.push_back(snapshot);
        }

        pub fn purge_calls(&self) -> Vec<Vec<TenantId>> {
            self.inner.lock().purges.clone()
        }
    }

    #[async_trait]
    impl MetricsSource for FakeMetricsSource {
        async fn snapshot(&self) -> LatencySnapshot {
            self.inner
                .lock()
                .snapshots
                .pop_front()
                .unwrap_or_default()
        }

        fn purge_stale(&self, active: &[TenantId]) {
            self.inner.lock().purges.push(active.to_vec());
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeMetricsSource;

#[cfg(test)]
#[path = "source_tests.rs"]
mod tests;
