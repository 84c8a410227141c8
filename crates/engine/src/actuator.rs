// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tiered violation mitigation.
//!
//! Tier 1 throttles every bully's block I/O through its cgroup `io.max`.
//! Tier 2, for severe violations, reshapes the victim's accelerator into
//! isolated partitions. Steps fail independently: every attempted step
//! yields exactly one action record, and nothing here can take the control
//! loop down.

use tg_adapters::{BlockDevices, CgroupFs, PartitionTool};
use tg_core::{
    ActionHistory, ActionKind, ActionRecord, ActionStats, Clock, DeviceId, TenantId, Violation,
};
use tracing::{debug, info, warn};

/// Severity above which tier 2 (partition reconfiguration) engages.
const PARTITION_SEVERITY_GATE: f64 = 0.5;

/// Actuator parameters.
#[derive(Debug, Clone)]
pub struct ActuatorConfig {
    /// Ceiling for cgroup I/O limits, in MB/s.
    pub max_io_limit_mbps: u64,
    /// Whether partition reconfiguration is allowed at all.
    pub enable_partition_reconfig: bool,
    /// Action records retained for history and stats.
    pub history_capacity: usize,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            max_io_limit_mbps: 1000,
            enable_partition_reconfig: true,
            history_capacity: tg_core::action::DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Executes the tiered mitigation for one violation at a time.
pub struct Actuator<P: PartitionTool, C: Clock> {
    config: ActuatorConfig,
    cgroups: CgroupFs,
    block_devices: BlockDevices,
    partition_tool: P,
    clock: C,
    history: ActionHistory,
}

impl<P: PartitionTool, C: Clock> Actuator<P, C> {
    pub fn new(config: ActuatorConfig, partition_tool: P, clock: C) -> Self {
        info!(
            max_io_limit_mbps = config.max_io_limit_mbps,
            partition_reconfig = config.enable_partition_reconfig,
            "actuator initialized"
        );
        let history = ActionHistory::new(config.history_capacity);
        Self {
            config,
            cgroups: CgroupFs::default(),
            block_devices: BlockDevices::default(),
            partition_tool,
            clock,
            history,
        }
    }

    /// Override the cgroup filesystem roots (tests run against a tempdir).
    pub fn with_cgroups(mut self, cgroups: CgroupFs) -> Self {
        self.cgroups = cgroups;
        self
    }

    /// Override the block-device listing source.
    pub fn with_block_devices(mut self, block_devices: BlockDevices) -> Self {
        self.block_devices = block_devices;
        self
    }

    /// Execute the tiered response for one violation.
    ///
    /// Records land in history in tier-1 bully order, then the tier-2
    /// record when that tier ran.
    pub async fn mitigate(&mut self, violation: &Violation) -> Vec<ActionRecord> {
        info!(%violation, "mitigating violation");
        let mut records = Vec::new();

        if !violation.bully_tenants.is_empty() {
            info!(
                bullies = violation.bully_tenants.len(),
                "tier 1: throttling bully I/O"
            );
            for &bully in &violation.bully_tenants {
                let record = self.throttle_io(bully, violation.severity);
                if !record.success {
                    warn!(tenant = %bully, message = %record.message, "I/O throttle failed");
                }
                self.history.record(record.clone());
                records.push(record);
            }
        }

        if self.config.enable_partition_reconfig && violation.severity > PARTITION_SEVERITY_GATE {
            info!(device = %violation.victim_device, "tier 2: partition reconfiguration");
            let record = self.reconfigure_partition(violation).await;
            if !record.success {
                warn!(message = %record.message, "partition reconfiguration failed");
            }
            self.history.record(record.clone());
            records.push(record);
        }

        let succeeded = records.iter().filter(|r| r.success).count();
        info!(
            succeeded,
            attempted = records.len(),
            "mitigation complete"
        );
        records
    }

    /// Tier 1 for one bully: resolve its cgroup, compute the
    /// severity-scaled bandwidth, write `io.max`.
    fn throttle_io(&self, bully: TenantId, severity: f64) -> ActionRecord {
        let at_ms = self.clock.epoch_ms();
        let make = |success: bool, message: String| ActionRecord {
            kind: ActionKind::IoThrottle,
            success,
            message,
            at_ms,
            target_tenant: Some(bully),
            target_device: None,
        };

        let Some(cgroup_dir) = self.cgroups.resolve(bully.as_u32()) else {
            return make(false, format!("no cgroup path for tenant {bully}"));
        };

        let devices = self.block_devices.throttle_targets();
        let bytes_per_sec = compute_io_limit_bytes(self.config.max_io_limit_mbps, severity);
        debug!(
            tenant = %bully,
            bytes_per_sec,
            devices = devices.len(),
            "applying I/O limit"
        );

        match self.cgroups.write_io_max(&cgroup_dir, &devices, bytes_per_sec) {
            Ok(()) => make(
                true,
                format!(
                    "applied {bytes_per_sec} bytes/s limit across {} devices",
                    devices.len()
                ),
            ),
            Err(err) => make(
                false,
                format!("writing io.max in {}: {err}", cgroup_dir.display()),
            ),
        }
    }

    /// Tier 2: disable, re-enable, then repartition the victim's device.
    /// A disable failure is tolerated (partitioning is commonly already
    /// off); an enable failure aborts; the create step decides success.
    async fn reconfigure_partition(&self, violation: &Violation) -> ActionRecord {
        let at_ms = self.clock.epoch_ms();
        let device = &violation.victim_device;
        let make = |success: bool, message: String| ActionRecord {
            kind: ActionKind::PartitionReconfig,
            success,
            message,
            at_ms,
            target_tenant: None,
            target_device: Some(device.clone()),
        };

        let index = device_index(device);
        let profile = select_partition_profile(violation.severity);
        info!(device = %device, index, profile, "reconfiguring partitions");

        if let Err(err) = self.partition_tool.disable_partitioning(index).await {
            debug!(error = %err, "partition disable failed, possibly already disabled");
        }

        if let Err(err) = self.partition_tool.enable_partitioning(index).await {
            return make(false, format!("enabling partition mode: {err}"));
        }

        match self.partition_tool.create_instances(index, profile).await {
            Ok(()) => make(true, format!("configured partition profile {profile}")),
            Err(err) => make(false, format!("creating partition instances: {err}")),
        }
    }

    /// Recent action records, optionally filtered by kind.
    pub fn history(&self, kind: Option<ActionKind>, limit: usize) -> Vec<ActionRecord> {
        self.history.history(kind, limit)
    }

    pub fn stats(&self) -> ActionStats {
        self.history.stats()
    }
}

/// Throttle bandwidth for a severity: half the configured ceiling, scaled
/// down as severity rises, with a 10% floor. Whole MB/s, in bytes.
pub fn compute_io_limit_bytes(max_io_limit_mbps: u64, severity: f64) -> u64 {
    let base_mbps = max_io_limit_mbps as f64 * 0.5;
    let factor = (1.0 - severity).max(0.1);
    (base_mbps * factor) as u64 * 1024 * 1024
}

/// Partition profile for a severity: harsher violations get smaller, more
/// isolated instances.
pub fn select_partition_profile(severity: f64) -> &'static str {
    if severity > 1.0 {
        "1g.5gb:7"
    } else if severity > 0.5 {
        "2g.10gb:3"
    } else {
        "3g.20gb:2"
    }
}

/// Toolchain index for a device. Synthetic ids carry their index; real
/// vendor UUIDs would need a toolchain lookup and default to 0 here.
fn device_index(device: &DeviceId) -> u32 {
    device.synthetic_index().unwrap_or(0)
}

#[cfg(test)]
#[path = "actuator_tests.rs"]
mod tests;
