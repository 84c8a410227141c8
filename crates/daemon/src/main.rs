// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tail Guard daemon (tgd)
//!
//! Node-local SLO controller for co-tenant accelerator workloads.
//!
//! Architecture:
//! - One-shot topology discovery at startup
//! - Fixed-cadence control loop: snapshot -> track -> mitigate -> purge
//! - Graceful shutdown on SIGINT/SIGTERM; a running tick completes first

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod controller;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use tg_adapters::SmiPartitionTool;
use tg_core::SystemClock;
use tg_engine::{Actuator, ActuatorConfig, StateTracker, TrackerConfig};
use tg_metrics::FileMetricsSource;
use tg_topology::Topology;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::{debug, error, info, warn};

use crate::config::DaemonConfig;
use crate::controller::Controller;

/// Tail Guard: node-local SLO controller for shared accelerators
#[derive(Debug, Parser)]
#[command(name = "tgd", version, about)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match DaemonConfig::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            // Logging is not up yet; this must reach the operator directly.
            eprintln!("tgd: {err}");
            std::process::exit(1);
        }
    };

    setup_logging(&config, cli.debug);
    info!(config = %cli.config.display(), "starting SLO controller daemon");

    let (sigterm, sigint) = match shutdown_signals() {
        Ok(signals) => signals,
        Err(err) => {
            error!(error = %err, "failed to install signal handlers");
            std::process::exit(1);
        }
    };

    let controller = build_controller(&config).await;

    run_loop(controller, &config, sigterm, sigint).await;
}

/// Wire the core components from configuration.
async fn build_controller(
    config: &DaemonConfig,
) -> Controller<FileMetricsSource, SmiPartitionTool, SystemClock> {
    let topology = Topology::discover().await;
    log_topology(&topology, config);

    let metrics = FileMetricsSource::new(FileMetricsSource::DEFAULT_METRICS_DIR);

    let tracker = StateTracker::new(
        TrackerConfig {
            tail_threshold_ms: config.tail_threshold_ms,
            persistence_windows: config.persistence_windows,
            cooldown_observations: config.cooldown_observations,
        },
        SystemClock,
    );

    let actuator = Actuator::new(
        ActuatorConfig {
            max_io_limit_mbps: config.max_cgroup_io_limit_mbps,
            enable_partition_reconfig: config.enable_mig_reconfiguration,
            ..ActuatorConfig::default()
        },
        SmiPartitionTool::new(),
        SystemClock,
    );

    Controller::new(metrics, tracker, actuator, topology)
}

/// Log the discovered inventory and the configured affinity picture.
fn log_topology(topology: &Topology, config: &DaemonConfig) {
    let devices = topology.list_devices();
    info!(devices = devices.len(), "accelerator inventory ready");

    for device in &devices {
        if let Some(info) = topology.device_info(device) {
            info!(
                device = %info.device_id,
                bus = %info.bus_address,
                numa = info.numa_node,
                "accelerator"
            );
        }
    }

    for a in &devices {
        for b in &devices {
            if a < b {
                debug!(
                    a = %a,
                    b = %b,
                    penalty = topology.affinity_penalty(a, b, config.numa_weight, config.pcie_weight),
                    "device affinity penalty"
                );
            }
        }
    }
}

/// The fixed-cadence loop. A shutdown signal is honored between ticks; the
/// tick in flight always completes.
async fn run_loop(
    mut controller: Controller<FileMetricsSource, SmiPartitionTool, SystemClock>,
    config: &DaemonConfig,
    mut sigterm: Signal,
    mut sigint: Signal,
) {
    let poll = Duration::from_secs_f64(config.poll_interval_sec);
    info!(poll_interval_sec = config.poll_interval_sec, "entering control loop");

    loop {
        let started = Instant::now();
        controller.tick().await;
        let elapsed = started.elapsed();

        let sleep_for = match poll.checked_sub(elapsed) {
            Some(remaining) => remaining,
            None => {
                warn!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    interval_ms = poll.as_millis() as u64,
                    "tick overran poll interval, continuing immediately"
                );
                Duration::ZERO
            }
        };

        tokio::select! {
            _ = tokio::time::sleep(sleep_for) => {}
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }
            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                break;
            }
        }
    }

    emit_final_stats(&controller);
    info!("daemon stopped");
}

fn shutdown_signals() -> std::io::Result<(Signal, Signal)> {
    Ok((
        signal(SignalKind::terminate())?,
        signal(SignalKind::interrupt())?,
    ))
}

fn emit_final_stats(
    controller: &Controller<FileMetricsSource, SmiPartitionTool, SystemClock>,
) {
    let stats = controller.action_stats();
    let stats_json =
        serde_json::to_string(&stats).unwrap_or_else(|_| "<unserializable>".to_string());
    info!(actions = %stats_json, "final action statistics");
    info!(states = ?controller.state_summary(), "final tenant states");
}

fn setup_logging(config: &DaemonConfig, debug_enabled: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // --debug wins; otherwise RUST_LOG, then the configured level.
    let filter = if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_filter()))
    };

    // Log to stdout; the host log pipeline (systemd) owns retention.
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    info!(level = config.log_level.as_filter(), debug = debug_enabled, "logging configured");
}
