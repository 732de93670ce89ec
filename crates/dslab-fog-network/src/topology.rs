//! Physical topology: node registry and one-shot routing setup.

use indexmap::IndexMap;
use log::{debug, info, warn};

use crate::adjacency::{attachment_link, Adjacency};
use crate::config::RoutingConfig;
use crate::error::{Result, TopologyError};
use crate::link::{Link, LinkId};
use crate::node::{EndDevice, FogDevice, NodeId, Switch};
use crate::routing::{self, ConvergedRoutes};
use crate::switching::build_switching_tables;
use crate::validation::{check_destinations, check_links};

pub(crate) const LOG_TARGET: &str = "physical_topology";

/// Holds switches, fog devices, end devices and links of a simulated network,
/// and computes switching tables for its switches.
///
/// The topology is populated with `add_*` calls, then [`Self::set_up_entities`] is called once,
/// after which switching tables can be queried.
pub struct PhysicalTopology {
    switches: IndexMap<NodeId, Switch>,
    fog_devices: IndexMap<NodeId, FogDevice>,
    end_devices: IndexMap<NodeId, EndDevice>,
    links: IndexMap<LinkId, Link>,
    link_id_counter: LinkId,
    routing_config: RoutingConfig,
    set_up: bool,
}

impl PhysicalTopology {
    /// Creates an empty topology.
    pub fn new() -> Self {
        Self::with_routing_config(RoutingConfig::default())
    }

    /// Creates an empty topology using the given routing parameters.
    pub fn with_routing_config(routing_config: RoutingConfig) -> Self {
        Self {
            switches: IndexMap::new(),
            fog_devices: IndexMap::new(),
            end_devices: IndexMap::new(),
            links: IndexMap::new(),
            link_id_counter: 1,
            routing_config,
            set_up: false,
        }
    }

    // Registration ----------------------------------------------------------------------------------------------------

    /// Adds a fog device.
    pub fn add_fog_device(&mut self, dev: FogDevice) {
        self.fog_devices.insert(dev.id(), dev);
    }

    /// Adds an end device together with its actuators.
    pub fn add_end_device(&mut self, dev: EndDevice) {
        self.end_devices.insert(dev.id(), dev);
    }

    /// Adds a switch.
    pub fn add_switch(&mut self, sw: Switch) {
        self.switches.insert(sw.id(), sw);
    }

    /// Adds a link between two nodes and returns its id.
    ///
    /// `bandwidth` is one-directional, both directions get the same bandwidth and latency.
    /// The link is not checked here, see [`Self::validate_topology`].
    pub fn add_link(&mut self, endpoint_a: NodeId, endpoint_b: NodeId, latency: f64, bandwidth: f64) -> LinkId {
        let link_id = self.link_id_counter;
        self.link_id_counter += 1;
        self.links
            .insert(link_id, Link::new(link_id, endpoint_a, endpoint_b, latency, bandwidth));
        link_id
    }

    // Validation and setup --------------------------------------------------------------------------------------------

    /// Checks that the topology is valid:
    ///
    /// - no link is a self-loop,
    /// - no fog device or end device is attached to more than one link,
    /// - link latencies are non-negative and bandwidths are positive,
    /// - fog device and actuator ids do not clash.
    pub fn check_topology(&self) -> Result<()> {
        let devices = self.fog_devices.keys().chain(self.end_devices.keys()).copied();
        check_links(self.links.values(), devices)?;
        let actuators = self.end_devices.values().flat_map(|d| d.actuators()).map(|a| a.id);
        check_destinations(self.fog_devices.keys().copied().chain(actuators))
    }

    /// Returns true if the topology is valid, see [`Self::check_topology`].
    pub fn validate_topology(&self) -> bool {
        match self.check_topology() {
            Ok(()) => true,
            Err(e) => {
                warn!(target: LOG_TARGET, "Topology validation failed: {}", e);
                false
            }
        }
    }

    /// Makes the topology ready: assigns links to devices, computes adjacent devices and neighbor
    /// switches, converges routes and fills switching tables.
    ///
    /// The topology is validated first. On error no switching table is populated.
    pub fn set_up_entities(&mut self) -> Result<()> {
        self.set_up = false;
        self.reset_entities();
        self.check_topology()?;

        debug!(target: LOG_TARGET, "Assigning links to devices");
        self.assign_device_links();

        debug!(target: LOG_TARGET, "Calculating adjacent entities");
        let adjacency = Adjacency::build(self);
        self.apply_adjacency(&adjacency);

        debug!(target: LOG_TARGET, "Calculating routing tables");
        let routes = routing::converge(&adjacency, self.routing_config.max_rounds)?;
        self.log_routes(&routes);
        if let Some(&(switch, destination)) = routes.unreachable().first() {
            return Err(TopologyError::Unreachable { switch, destination });
        }

        let tables = build_switching_tables(&routes, self.links.values())?;
        for (switch, table) in tables {
            if let Some(sw) = self.switches.get_mut(&switch) {
                sw.switching_table = table;
            }
        }
        self.set_up = true;
        info!(
            target: LOG_TARGET,
            "Topology is set up: {} switches, {} destinations, converged in {} rounds",
            self.switches.len(),
            routes.destinations().len(),
            routes.rounds()
        );
        Ok(())
    }

    /// Derives adjacency of switches from the registered links.
    pub fn adjacency(&self) -> Adjacency {
        Adjacency::build(self)
    }

    /// Returns true if [`Self::set_up_entities`] completed successfully.
    pub fn is_set_up(&self) -> bool {
        self.set_up
    }

    fn reset_entities(&mut self) {
        for sw in self.switches.values_mut() {
            sw.reset();
        }
        for dev in self.fog_devices.values_mut() {
            dev.link_id = None;
        }
        for dev in self.end_devices.values_mut() {
            dev.link_id = None;
        }
    }

    fn assign_device_links(&mut self) {
        for dev in self.fog_devices.values_mut() {
            dev.link_id = attachment_link(self.links.values(), dev.id());
        }
        for dev in self.end_devices.values_mut() {
            dev.link_id = attachment_link(self.links.values(), dev.id());
        }
    }

    fn apply_adjacency(&mut self, adjacency: &Adjacency) {
        for (id, adj) in adjacency.iter() {
            if let Some(sw) = self.switches.get_mut(&id) {
                sw.adjacent_hosts = adj.hosts.clone();
                sw.adjacent_end_devices = adj.end_devices.keys().copied().collect();
                sw.neighbor_switches = adj.neighbors.clone();
            }
        }
    }

    fn log_routes(&self, routes: &ConvergedRoutes) {
        if !log::log_enabled!(target: LOG_TARGET, log::Level::Debug) {
            return;
        }
        for (switch, table) in routes.tables() {
            debug!(target: LOG_TARGET, "{}", self.node_name(switch).unwrap_or("?"));
            for (destination, entry) in table.iter() {
                debug!(
                    target: LOG_TARGET,
                    "\t{} ---> {} ({} hops)",
                    self.node_name(*destination).unwrap_or("?"),
                    self.node_name(entry.next_hop).unwrap_or("?"),
                    entry.hop_count
                );
            }
        }
    }

    // Forwarding ------------------------------------------------------------------------------------------------------

    /// Returns the link used by `switch` to forward traffic for `destination`.
    ///
    /// Returns `None` unless the last [`Self::set_up_entities`] call succeeded.
    pub fn switching_table(&self, switch: NodeId, destination: NodeId) -> Option<LinkId> {
        if !self.set_up {
            return None;
        }
        self.switches.get(&switch)?.next_link(destination)
    }

    /// Returns the links traversed by traffic relayed from `switch` to `destination`
    /// by following switching tables.
    pub fn route(&self, switch: NodeId, destination: NodeId) -> Option<Vec<LinkId>> {
        let mut path = Vec::new();
        let mut current = switch;
        loop {
            if path.len() > self.switches.len() {
                return None;
            }
            let link_id = self.switching_table(current, destination)?;
            path.push(link_id);
            let next = self.links.get(&link_id)?.other_endpoint(current)?;
            if self.switches.contains_key(&next) {
                current = next;
                continue;
            }
            return if next == destination || self.owns_actuator(next, destination) {
                Some(path)
            } else {
                None
            };
        }
    }

    /// Returns the total latency of [`Self::route`].
    pub fn route_latency(&self, switch: NodeId, destination: NodeId) -> Option<f64> {
        let path = self.route(switch, destination)?;
        Some(path.iter().filter_map(|id| self.links.get(id)).map(|l| l.latency).sum())
    }

    /// Returns the bottleneck bandwidth of [`Self::route`].
    pub fn route_bandwidth(&self, switch: NodeId, destination: NodeId) -> Option<f64> {
        let path = self.route(switch, destination)?;
        path.iter()
            .filter_map(|id| self.links.get(id))
            .map(|l| l.bandwidth)
            .min_by(|a, b| a.total_cmp(b))
    }

    fn owns_actuator(&self, device: NodeId, actuator: NodeId) -> bool {
        self.end_devices
            .get(&device)
            .map_or(false, |dev| dev.actuators().iter().any(|a| a.id == actuator))
    }

    // Lookups ---------------------------------------------------------------------------------------------------------

    /// Returns the switch with the given id.
    pub fn switch(&self, id: NodeId) -> Option<&Switch> {
        self.switches.get(&id)
    }

    /// Returns the fog device with the given id.
    pub fn fog_device(&self, id: NodeId) -> Option<&FogDevice> {
        self.fog_devices.get(&id)
    }

    /// Returns the end device with the given id.
    pub fn end_device(&self, id: NodeId) -> Option<&EndDevice> {
        self.end_devices.get(&id)
    }

    /// Returns the link with the given id.
    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    /// Returns the lowest-id link directly connecting two nodes.
    pub fn link_between(&self, node1: NodeId, node2: NodeId) -> Option<&Link> {
        self.links.values().filter(|l| l.connects(node1, node2)).min_by_key(|l| l.id)
    }

    /// Iterates over switches in registration order.
    pub fn switches(&self) -> impl Iterator<Item = &Switch> {
        self.switches.values()
    }

    /// Iterates over fog devices in registration order.
    pub fn fog_devices(&self) -> impl Iterator<Item = &FogDevice> {
        self.fog_devices.values()
    }

    /// Iterates over end devices in registration order.
    pub fn end_devices(&self) -> impl Iterator<Item = &EndDevice> {
        self.end_devices.values()
    }

    /// Iterates over links in registration order.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Number of possible destinations: fog devices plus actuators.
    pub fn destination_count(&self) -> usize {
        self.fog_devices.len() + self.end_devices.values().map(|d| d.actuators().len()).sum::<usize>()
    }

    /// Returns the name of a switch, device or actuator.
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        if let Some(sw) = self.switches.get(&id) {
            return Some(sw.name());
        }
        if let Some(dev) = self.fog_devices.get(&id) {
            return Some(dev.name());
        }
        if let Some(dev) = self.end_devices.get(&id) {
            return Some(dev.name());
        }
        self.end_devices
            .values()
            .flat_map(|d| d.actuators())
            .find(|a| a.id == id)
            .map(|a| a.name.as_str())
    }

    /// Returns the id of the node or actuator with the given name.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.switches
            .values()
            .map(|sw| (sw.id(), sw.name()))
            .chain(self.fog_devices.values().map(|d| (d.id(), d.name())))
            .chain(self.end_devices.values().map(|d| (d.id(), d.name())))
            .chain(
                self.end_devices
                    .values()
                    .flat_map(|d| d.actuators())
                    .map(|a| (a.id, a.name.as_str())),
            )
            .find(|(_, n)| *n == name)
            .map(|(id, _)| id)
    }
}

impl Default for PhysicalTopology {
    fn default() -> Self {
        Self::new()
    }
}
