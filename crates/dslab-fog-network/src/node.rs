//! Topology nodes: switches, fog devices and end devices.

use std::collections::{BTreeMap, BTreeSet};

use crate::link::LinkId;

/// Unique node id.
pub type NodeId = usize;

/// Hands out sequential node ids, never reusing one.
#[derive(Debug)]
pub struct IdGenerator {
    next_id: NodeId,
}

impl IdGenerator {
    /// Creates a generator whose first id is `first_id`.
    pub fn starting_from(first_id: NodeId) -> Self {
        Self { next_id: first_id }
    }

    /// Returns the next unused id.
    pub fn next_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::starting_from(1)
    }
}

/// Forwarding node relaying traffic between devices and other switches.
#[derive(Clone, Debug)]
pub struct Switch {
    id: NodeId,
    name: String,
    pub(crate) adjacent_hosts: BTreeSet<NodeId>,
    pub(crate) adjacent_end_devices: BTreeSet<NodeId>,
    pub(crate) neighbor_switches: BTreeSet<NodeId>,
    pub(crate) switching_table: BTreeMap<NodeId, LinkId>,
}

impl Switch {
    /// Creates a switch with empty adjacency and switching table.
    pub fn new(id: NodeId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            adjacent_hosts: BTreeSet::new(),
            adjacent_end_devices: BTreeSet::new(),
            neighbor_switches: BTreeSet::new(),
            switching_table: BTreeMap::new(),
        }
    }

    /// Switch id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Switch name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fog devices directly attached to the switch.
    pub fn adjacent_hosts(&self) -> &BTreeSet<NodeId> {
        &self.adjacent_hosts
    }

    /// End devices directly attached to the switch.
    pub fn adjacent_end_devices(&self) -> &BTreeSet<NodeId> {
        &self.adjacent_end_devices
    }

    /// Switches directly linked to the switch.
    pub fn neighbor_switches(&self) -> &BTreeSet<NodeId> {
        &self.neighbor_switches
    }

    /// Map from destination (fog device or actuator) to the outgoing link.
    pub fn switching_table(&self) -> &BTreeMap<NodeId, LinkId> {
        &self.switching_table
    }

    /// Returns the outgoing link for `destination`, if known.
    pub fn next_link(&self, destination: NodeId) -> Option<LinkId> {
        self.switching_table.get(&destination).copied()
    }

    pub(crate) fn reset(&mut self) {
        self.adjacent_hosts.clear();
        self.adjacent_end_devices.clear();
        self.neighbor_switches.clear();
        self.switching_table.clear();
    }
}

/// Compute node which is also a traffic endpoint.
#[derive(Clone, Debug)]
pub struct FogDevice {
    id: NodeId,
    name: String,
    pub(crate) link_id: Option<LinkId>,
}

impl FogDevice {
    /// Creates a fog device not yet attached to any link.
    pub fn new(id: NodeId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            link_id: None,
        }
    }

    /// Device id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The link attaching the device to the network, assigned during setup.
    pub fn link_id(&self) -> Option<LinkId> {
        self.link_id
    }
}

/// Logical destination hosted by an end device. Actuators are never linked directly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actuator {
    /// Actuator id.
    pub id: NodeId,
    /// Actuator name.
    pub name: String,
}

/// Node hosting sensors and actuators.
#[derive(Clone, Debug)]
pub struct EndDevice {
    id: NodeId,
    name: String,
    actuators: Vec<Actuator>,
    pub(crate) link_id: Option<LinkId>,
}

impl EndDevice {
    /// Creates an end device without actuators.
    pub fn new(id: NodeId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            actuators: Vec::new(),
            link_id: None,
        }
    }

    /// Attaches an actuator to the device.
    pub fn add_actuator(&mut self, id: NodeId, name: &str) {
        self.actuators.push(Actuator {
            id,
            name: name.to_string(),
        });
    }

    /// Builder-style variant of [`Self::add_actuator`].
    pub fn with_actuator(mut self, id: NodeId, name: &str) -> Self {
        self.add_actuator(id, name);
        self
    }

    /// Device id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Actuators owned by the device.
    pub fn actuators(&self) -> &[Actuator] {
        &self.actuators
    }

    /// The link attaching the device to the network, assigned during setup.
    pub fn link_id(&self) -> Option<LinkId> {
        self.link_id
    }
}
