// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const LISTING: &str = "\
Machine (256GB total)
  Package L#0
    NUMANode L#0 (P#0 128GB)
    PCI 01:00.0 (VGA)
      GPU \"card0\"
  Package L#1
    NUMANode L#1 (P#1 128GB)
    PCI 81:00.0 (3D)
";

#[test]
fn headers_scope_following_addresses() {
    let mapping = parse_numa_listing(LISTING);

    assert_eq!(mapping[&0], vec!["01:00.0"]);
    assert_eq!(mapping[&1], vec!["81:00.0"]);
}

#[test]
fn non_gpu_addresses_ignored() {
    let listing = "\
NUMANode L#0 (P#0)
PCI 00:1f.3 (Audio)
PCI 02:00.0 (VGA)
";
    let mapping = parse_numa_listing(listing);
    assert_eq!(mapping[&0], vec!["02:00.0"]);
}

#[test]
fn addresses_before_any_header_go_to_node_zero() {
    let listing = "PCI 02:00.0 (VGA)\n";
    let mapping = parse_numa_listing(listing);
    assert_eq!(mapping[&0], vec!["02:00.0"]);
}

#[test]
fn empty_listing_yields_empty_mapping() {
    assert!(parse_numa_listing("").is_empty());
}

#[test]
fn sysfs_scan_reads_node_dirs() {
    let tmp = tempfile::TempDir::new().unwrap();
    std::fs::create_dir(tmp.path().join("node0")).unwrap();
    std::fs::create_dir(tmp.path().join("node1")).unwrap();
    std::fs::create_dir(tmp.path().join("cpumap")).unwrap();

    let mapping = scan_sysfs_nodes(tmp.path());
    assert_eq!(mapping.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
    assert!(mapping.values().all(|v| v.is_empty()));
}

#[test]
fn sysfs_scan_missing_dir_assumes_single_node() {
    let mapping = scan_sysfs_nodes(std::path::Path::new("/definitely/not/nodes"));
    assert_eq!(mapping.keys().copied().collect::<Vec<_>>(), vec![0]);
}
