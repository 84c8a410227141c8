// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Accelerator inventory and affinity penalties.

use crate::bus::{self, BusNode, BusNodeKind};
use crate::numa;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tg_adapters::subprocess::run_capturing;
use tg_core::DeviceId;
use tokio::process::Command;
use tracing::{info, warn};

/// One discovered accelerator. Immutable after discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceleratorInfo {
    pub device_id: DeviceId,
    pub bus_address: String,
    pub numa_node: u32,
    /// Bus addresses from the root down to the device.
    pub bus_path: Vec<String>,
}

/// Accelerator inventory with bus and NUMA affinity. Pure data after
/// [`Topology::discover`].
#[derive(Debug, Clone, Default)]
pub struct Topology {
    devices: BTreeMap<DeviceId, AcceleratorInfo>,
    numa_nodes: Vec<u32>,
}

impl Topology {
    /// Discover the host topology by invoking the bus-topology and
    /// hardware-locality listing tools.
    ///
    /// Never fails: a missing or broken tool degrades to the sysfs NUMA
    /// scan and, past that, to the synthetic fallback topology.
    pub async fn discover() -> Self {
        let bus_listing = match run_capturing(lspci_command(), "bus-topology listing").await {
            Ok(output) if output.status.success() => {
                Some(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => {
                warn!(status = %output.status, "bus-topology listing failed, using fallback topology");
                None
            }
            Err(err) => {
                warn!(error = %err, "bus-topology listing unavailable, using fallback topology");
                None
            }
        };

        let numa_listing = match run_capturing(lstopo_command(), "hardware-locality listing").await
        {
            Ok(output) if output.status.success() => {
                Some(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => {
                warn!(status = %output.status, "hardware-locality listing failed, using sysfs fallback");
                None
            }
            Err(err) => {
                warn!(error = %err, "hardware-locality listing unavailable, using sysfs fallback");
                None
            }
        };

        Self::from_listings(
            bus_listing.as_deref(),
            numa_listing.as_deref(),
            Path::new("/sys/devices/system/node"),
        )
    }

    /// Build the topology from raw listings (injectable for tests).
    pub fn from_listings(
        bus_listing: Option<&str>,
        numa_listing: Option<&str>,
        sysfs_node_root: &Path,
    ) -> Self {
        let Some(bus_listing) = bus_listing else {
            return Self::fallback();
        };

        let nodes = bus::parse_bus_tree(bus_listing);
        let numa_map = match numa_listing {
            Some(listing) => numa::parse_numa_listing(listing),
            None => numa::scan_sysfs_nodes(sysfs_node_root),
        };

        let topology = Self::cross_join(&nodes, &numa_map);
        if topology.devices.is_empty() {
            info!("no accelerators found in listings, using fallback topology");
            return Self::fallback();
        }

        info!(devices = topology.devices.len(), "discovered accelerator topology");
        topology
    }

    /// Join bus nodes with the NUMA mapping: every GPU-kind bus address
    /// claimed by a NUMA node becomes one accelerator, ids assigned in
    /// discovery order.
    fn cross_join(
        nodes: &HashMap<String, BusNode>,
        numa_map: &BTreeMap<u32, Vec<String>>,
    ) -> Self {
        let mut devices = BTreeMap::new();
        let mut index = 0u32;

        for (numa_node, addresses) in numa_map {
            for address in addresses {
                let is_gpu = nodes
                    .get(address)
                    .map(|n| n.kind == BusNodeKind::Gpu)
                    .unwrap_or(false);
                if !is_gpu {
                    continue;
                }

                let device_id = DeviceId::synthetic(index);
                devices.insert(
                    device_id.clone(),
                    AcceleratorInfo {
                        device_id,
                        bus_address: address.clone(),
                        numa_node: *numa_node,
                        bus_path: bus::path_to_root(nodes, address),
                    },
                );
                index += 1;
            }
        }

        Self {
            devices,
            numa_nodes: numa_map.keys().copied().collect(),
        }
    }

    /// Deterministic two-accelerator, two-NUMA-node topology for hosts
    /// without the listing tools (dev machines, CI).
    pub fn fallback() -> Self {
        let mut devices = BTreeMap::new();
        for i in 0..2u32 {
            let device_id = DeviceId::synthetic(i);
            let bus_address = format!("00:0{}.0", i + 1);
            devices.insert(
                device_id.clone(),
                AcceleratorInfo {
                    device_id,
                    bus_address: bus_address.clone(),
                    numa_node: i % 2,
                    bus_path: vec![bus_address],
                },
            );
        }

        Self {
            devices,
            numa_nodes: vec![0, 1],
        }
    }

    pub fn list_devices(&self) -> Vec<DeviceId> {
        self.devices.keys().cloned().collect()
    }

    pub fn device_info(&self, device_id: &DeviceId) -> Option<&AcceleratorInfo> {
        self.devices.get(device_id)
    }

    pub fn numa_nodes(&self) -> &[u32] {
        &self.numa_nodes
    }

    /// Affinity penalty between two devices: 0 is perfect affinity,
    /// higher is worse, infinite for unknown devices.
    ///
    /// `numa_weight` is charged when the devices sit on different NUMA
    /// nodes; `bus_weight` scales with how little of their bus paths is
    /// shared.
    pub fn affinity_penalty(
        &self,
        a: &DeviceId,
        b: &DeviceId,
        numa_weight: f64,
        bus_weight: f64,
    ) -> f64 {
        let (Some(first), Some(second)) = (self.devices.get(a), self.devices.get(b)) else {
            warn!(a = %a, b = %b, "affinity query for unknown device");
            return f64::INFINITY;
        };

        let mut penalty = 0.0;

        if first.numa_node != second.numa_node {
            penalty += numa_weight;
        }

        let common = common_prefix_len(&first.bus_path, &second.bus_path);
        let longest = first.bus_path.len().max(second.bus_path.len());
        if longest > 0 {
            penalty += bus_weight * (1.0 - common as f64 / longest as f64);
        }

        penalty
    }
}

fn common_prefix_len(a: &[String], b: &[String]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

fn lspci_command() -> Command {
    let mut cmd = Command::new("lspci");
    cmd.arg("-vt");
    cmd
}

fn lstopo_command() -> Command {
    let mut cmd = Command::new("lstopo-no-graphics");
    cmd.args(["--of", "console"]);
    cmd
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
