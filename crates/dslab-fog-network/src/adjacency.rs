//! Per-switch adjacency derived from the registered links.

use std::collections::{BTreeMap, BTreeSet};

use log::warn;

use crate::link::{Link, LinkId};
use crate::node::NodeId;
use crate::topology::{PhysicalTopology, LOG_TARGET};

/// Devices and switches directly attached to a single switch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SwitchAdjacency {
    /// Attached fog devices.
    pub hosts: BTreeSet<NodeId>,
    /// Attached end devices, each with the ids of its actuators.
    pub end_devices: BTreeMap<NodeId, Vec<NodeId>>,
    /// Directly linked switches.
    pub neighbors: BTreeSet<NodeId>,
}

/// Adjacency of every switch in the topology, the input of route convergence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Adjacency {
    switches: BTreeMap<NodeId, SwitchAdjacency>,
}

impl Adjacency {
    /// Creates empty adjacency.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives adjacency from the links registered in `topology`.
    ///
    /// Devices without a link, or linked to something other than a switch, are skipped.
    pub fn build(topology: &PhysicalTopology) -> Self {
        let mut adjacency = Self::new();
        for switch in topology.switches() {
            adjacency.add_switch(switch.id());
        }

        for dev in topology.fog_devices() {
            if let Some(switch) = attached_switch(topology, dev.id(), dev.name()) {
                adjacency.add_host(switch, dev.id());
            }
        }
        // Actuators only exist as destinations: traffic for them is delivered to the owning end device.
        for dev in topology.end_devices() {
            if let Some(switch) = attached_switch(topology, dev.id(), dev.name()) {
                adjacency.add_end_device(switch, dev.id(), dev.actuators().iter().map(|a| a.id));
            }
        }

        for switch in topology.switches() {
            for link in topology.links() {
                if let Some(other) = link.other_endpoint(switch.id()) {
                    if topology.switch(other).is_some() {
                        adjacency.add_neighbor(switch.id(), other);
                    }
                }
            }
        }
        adjacency
    }

    /// Registers a switch with no attached nodes.
    pub fn add_switch(&mut self, switch: NodeId) {
        self.switches.entry(switch).or_default();
    }

    /// Attaches a fog device to `switch`.
    pub fn add_host(&mut self, switch: NodeId, host: NodeId) {
        self.switches.entry(switch).or_default().hosts.insert(host);
    }

    /// Attaches an end device with the given actuators to `switch`.
    pub fn add_end_device<I: IntoIterator<Item = NodeId>>(&mut self, switch: NodeId, device: NodeId, actuators: I) {
        self.switches
            .entry(switch)
            .or_default()
            .end_devices
            .insert(device, actuators.into_iter().collect());
    }

    /// Records `neighbor` as a neighbor of `switch` (one direction only).
    pub fn add_neighbor(&mut self, switch: NodeId, neighbor: NodeId) {
        self.switches.entry(switch).or_default().neighbors.insert(neighbor);
    }

    /// Links two switches in both directions.
    pub fn connect(&mut self, switch1: NodeId, switch2: NodeId) {
        self.add_neighbor(switch1, switch2);
        self.add_neighbor(switch2, switch1);
    }

    /// Returns the adjacency of `switch`.
    pub fn get(&self, switch: NodeId) -> Option<&SwitchAdjacency> {
        self.switches.get(&switch)
    }

    /// Iterates over switches in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SwitchAdjacency)> {
        self.switches.iter().map(|(id, adj)| (*id, adj))
    }

    /// Number of switches.
    pub fn switch_count(&self) -> usize {
        self.switches.len()
    }
}

/// Returns the first link incident to `device`.
pub fn attachment_link<'a, I: IntoIterator<Item = &'a Link>>(links: I, device: NodeId) -> Option<LinkId> {
    links.into_iter().find(|l| l.is_incident(device)).map(|l| l.id)
}

fn attached_switch(topology: &PhysicalTopology, device: NodeId, name: &str) -> Option<NodeId> {
    let Some(link) = attachment_link(topology.links(), device).and_then(|id| topology.link(id)) else {
        warn!(target: LOG_TARGET, "Device {} ({}) has no link and is omitted from routing", name, device);
        return None;
    };
    let other = link.other_endpoint(device)?;
    if topology.switch(other).is_none() {
        warn!(
            target: LOG_TARGET,
            "Device {} ({}) is attached to {} which is not a switch, omitted from routing", name, device, other
        );
        return None;
    }
    Some(other)
}
