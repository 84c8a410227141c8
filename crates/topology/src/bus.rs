// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bus-topology tree parsing.
//!
//! The listing is a text tree with two-space indentation per depth, one
//! device per line. A device's parent is the nearest preceding line at a
//! shallower indent.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

/// Bus address pattern: optional domain, then `bb:dd.f` in lowercase hex.
const ADDRESS_PATTERN: &str = r"([0-9a-f]{2,4}:)?[0-9a-f]{2}:[0-9a-f]{2}\.[0-9a-f]";

#[allow(clippy::expect_used)] // static pattern, cannot fail
pub(crate) fn address_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(ADDRESS_PATTERN).expect("static pattern"))
}

/// What a bus node is, derived from the listing's line text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusNodeKind {
    Root,
    Bridge,
    Gpu,
    Other,
}

impl BusNodeKind {
    fn classify(line: &str) -> Self {
        if line.contains("VGA compatible controller") || line.contains("3D controller") {
            BusNodeKind::Gpu
        } else if line.contains("PCI bridge") {
            BusNodeKind::Bridge
        } else if line.contains("Root Port") {
            BusNodeKind::Root
        } else {
            BusNodeKind::Other
        }
    }
}

/// One device in the bus tree. Immutable after discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusNode {
    pub address: String,
    pub kind: BusNodeKind,
    pub parent: Option<String>,
    pub children: Vec<String>,
}

/// Parse a bus-topology listing into a node map keyed by address.
///
/// Lines without a recognisable bus address are skipped with a debug
/// record; the parse itself cannot fail.
pub fn parse_bus_tree(listing: &str) -> HashMap<String, BusNode> {
    let mut nodes: HashMap<String, BusNode> = HashMap::new();
    // (indent, address) of open ancestors, deepest last
    let mut stack: Vec<(usize, String)> = Vec::new();

    for line in listing.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let indent = (line.len() - line.trim_start().len()) / 2;

        let Some(found) = address_regex().find(line) else {
            debug!(line, "skipping bus listing line without address");
            continue;
        };
        let address = found.as_str().to_string();

        while stack.last().is_some_and(|(depth, _)| *depth >= indent) {
            stack.pop();
        }
        let parent = stack.last().map(|(_, addr)| addr.clone());

        if let Some(parent_addr) = &parent {
            if let Some(parent_node) = nodes.get_mut(parent_addr) {
                parent_node.children.push(address.clone());
            }
        }

        nodes.insert(
            address.clone(),
            BusNode {
                address: address.clone(),
                kind: BusNodeKind::classify(line),
                parent,
                children: Vec::new(),
            },
        );

        stack.push((indent, address));
    }

    nodes
}

/// Bus path from the root down to `address`, following parent links.
pub fn path_to_root(nodes: &HashMap<String, BusNode>, address: &str) -> Vec<String> {
    let mut path = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let mut current = Some(address.to_string());

    while let Some(addr) = current {
        if !seen.insert(addr.clone()) {
            break;
        }
        path.push(addr.clone());
        current = nodes.get(&addr).and_then(|n| n.parent.clone());
    }

    path.reverse();
    path
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
