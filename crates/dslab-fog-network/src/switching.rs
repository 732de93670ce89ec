//! Translation of converged routes into per-switch switching tables.

use std::collections::BTreeMap;

use crate::error::{Result, TopologyError};
use crate::link::{Link, LinkId};
use crate::node::NodeId;
use crate::routing::ConvergedRoutes;

/// Switching table of a single switch: destination to outgoing link.
pub type SwitchingTable = BTreeMap<NodeId, LinkId>;

/// Maps every unordered pair of directly linked nodes to the link between them.
///
/// If several parallel links exist, the one with the lowest id is used.
pub fn link_index<'a, I: IntoIterator<Item = &'a Link>>(links: I) -> BTreeMap<(NodeId, NodeId), LinkId> {
    let mut index = BTreeMap::new();
    for link in links {
        let key = ordered_pair(link.endpoint_a, link.endpoint_b);
        let id = index.entry(key).or_insert(link.id);
        if link.id < *id {
            *id = link.id;
        }
    }
    index
}

/// Builds switching tables for all switches from their converged routes.
///
/// Fails with [`TopologyError::MissingLink`] if some next hop is not directly linked to its switch.
pub fn build_switching_tables<'a, I: IntoIterator<Item = &'a Link>>(
    routes: &ConvergedRoutes,
    links: I,
) -> Result<BTreeMap<NodeId, SwitchingTable>> {
    let index = link_index(links);
    let mut tables = BTreeMap::new();
    for (switch, routing_table) in routes.tables() {
        let mut table = SwitchingTable::new();
        for (destination, entry) in routing_table.iter() {
            let link = index
                .get(&ordered_pair(switch, entry.next_hop))
                .ok_or(TopologyError::MissingLink {
                    switch,
                    next_hop: entry.next_hop,
                })?;
            table.insert(*destination, *link);
        }
        tables.insert(switch, table);
    }
    Ok(tables)
}

fn ordered_pair(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
