//! Distance-vector route convergence.
//!
//! Every switch starts knowing its directly attached fog devices and actuators at distance 0.
//! In each round every switch offers its known destinations to its neighbor switches with the
//! hop count increased by one, and a neighbor accepts an offer if it has no route to the destination
//! yet or the offered route is strictly shorter. Rounds are synchronous: offers are computed from
//! the tables as they were at the start of the round. The computation stops at the first round
//! which changes nothing.
//!
//! Switches, neighbors and destinations are processed in ascending id order, so among several
//! equally short routes the one offered by the neighbor with the lowest id is kept.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::adjacency::Adjacency;
use crate::error::{Result, TopologyError};
use crate::node::NodeId;
use crate::topology::LOG_TARGET;

/// Route to a destination known by a switch.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RoutingEntry {
    /// Next node on the route: a neighbor switch or the attached device itself.
    pub next_hop: NodeId,
    /// Number of switch-to-switch traversals to the destination.
    pub hop_count: usize,
}

type RoutingTable = BTreeMap<NodeId, RoutingEntry>;

/// Routing tables of all switches after convergence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConvergedRoutes {
    tables: BTreeMap<NodeId, RoutingTable>,
    destinations: BTreeSet<NodeId>,
    unreachable: Vec<(NodeId, NodeId)>,
    rounds: usize,
}

impl ConvergedRoutes {
    /// Returns the route from `switch` to `destination`.
    pub fn entry(&self, switch: NodeId, destination: NodeId) -> Option<&RoutingEntry> {
        self.tables.get(&switch)?.get(&destination)
    }

    /// Returns the hop count from `switch` to `destination`.
    pub fn hop_count(&self, switch: NodeId, destination: NodeId) -> Option<usize> {
        self.entry(switch, destination).map(|e| e.hop_count)
    }

    /// Returns the next hop from `switch` towards `destination`.
    pub fn next_hop(&self, switch: NodeId, destination: NodeId) -> Option<NodeId> {
        self.entry(switch, destination).map(|e| e.next_hop)
    }

    /// Returns the routing table of `switch`.
    pub fn table(&self, switch: NodeId) -> Option<&BTreeMap<NodeId, RoutingEntry>> {
        self.tables.get(&switch)
    }

    /// Iterates over routing tables in ascending switch id order.
    pub fn tables(&self) -> impl Iterator<Item = (NodeId, &BTreeMap<NodeId, RoutingEntry>)> {
        self.tables.iter().map(|(id, table)| (*id, table))
    }

    /// All destinations attached to some switch.
    pub fn destinations(&self) -> &BTreeSet<NodeId> {
        &self.destinations
    }

    /// `(switch, destination)` pairs without a route, in ascending order.
    pub fn unreachable(&self) -> &[(NodeId, NodeId)] {
        &self.unreachable
    }

    /// Returns true if every switch has a route to every destination.
    pub fn is_complete(&self) -> bool {
        self.unreachable.is_empty()
    }

    /// Number of performed rounds, including the final one which changed nothing.
    pub fn rounds(&self) -> usize {
        self.rounds
    }
}

/// Runs relaxation rounds over `adjacency` until no routing entry changes.
///
/// At most `max_rounds` rounds are performed, by default the number of switches, which is
/// enough for any topology since no shortest route traverses more switches than there are.
/// Unreachable destinations do not fail the computation, they are listed in the result.
pub fn converge(adjacency: &Adjacency, max_rounds: Option<usize>) -> Result<ConvergedRoutes> {
    let mut tables = initial_tables(adjacency);
    let destinations: BTreeSet<NodeId> = tables.values().flat_map(|t| t.keys().copied()).collect();
    let max_rounds = max_rounds.unwrap_or(adjacency.switch_count()).max(1);

    let mut rounds = 0;
    loop {
        if rounds == max_rounds {
            return Err(TopologyError::ConvergenceTimeout { rounds });
        }
        rounds += 1;
        let changed = relax(adjacency, &mut tables);
        debug!(target: LOG_TARGET, "Routing round {}: {} entries changed", rounds, changed);
        if changed == 0 {
            break;
        }
    }

    let mut unreachable = Vec::new();
    for (switch, table) in tables.iter() {
        for destination in destinations.iter() {
            if !table.contains_key(destination) {
                unreachable.push((*switch, *destination));
            }
        }
    }
    debug!(
        target: LOG_TARGET,
        "Routing converged after {} rounds, {} unreachable pairs",
        rounds,
        unreachable.len()
    );

    Ok(ConvergedRoutes {
        tables,
        destinations,
        unreachable,
        rounds,
    })
}

fn initial_tables(adjacency: &Adjacency) -> BTreeMap<NodeId, RoutingTable> {
    let mut tables = BTreeMap::new();
    for (switch, adj) in adjacency.iter() {
        let mut table = RoutingTable::new();
        for host in adj.hosts.iter() {
            table.insert(
                *host,
                RoutingEntry {
                    next_hop: *host,
                    hop_count: 0,
                },
            );
        }
        for (device, actuators) in adj.end_devices.iter() {
            for actuator in actuators {
                table.insert(
                    *actuator,
                    RoutingEntry {
                        next_hop: *device,
                        hop_count: 0,
                    },
                );
            }
        }
        tables.insert(switch, table);
    }
    tables
}

/// Performs one synchronous round and returns the number of changed entries.
fn relax(adjacency: &Adjacency, tables: &mut BTreeMap<NodeId, RoutingTable>) -> usize {
    let snapshot = tables.clone();
    let mut changed = 0;
    for (switch, table) in snapshot.iter() {
        let Some(adj) = adjacency.get(*switch) else {
            continue;
        };
        for neighbor in adj.neighbors.iter() {
            let Some(neighbor_table) = tables.get_mut(neighbor) else {
                continue;
            };
            for (destination, entry) in table.iter() {
                let candidate = RoutingEntry {
                    next_hop: *switch,
                    hop_count: entry.hop_count + 1,
                };
                if update_entry(neighbor_table, *destination, candidate) {
                    changed += 1;
                }
            }
        }
    }
    changed
}

fn update_entry(table: &mut RoutingTable, destination: NodeId, candidate: RoutingEntry) -> bool {
    match table.entry(destination) {
        Entry::Vacant(e) => {
            e.insert(candidate);
            true
        }
        Entry::Occupied(mut e) => {
            if candidate.hop_count < e.get().hop_count {
                e.insert(candidate);
                true
            } else {
                false
            }
        }
    }
}
