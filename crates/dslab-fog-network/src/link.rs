//! Network link.

use crate::node::NodeId;

/// Unique link id.
pub type LinkId = usize;

/// A symmetric point-to-point link between two nodes of the physical topology.
///
/// Latency and bandwidth are the same in both directions.
#[derive(Clone, Debug, PartialEq)]
pub struct Link {
    /// Link id, assigned by the topology on registration.
    pub id: LinkId,
    /// Link name used in logs.
    pub name: String,
    /// First endpoint.
    pub endpoint_a: NodeId,
    /// Second endpoint.
    pub endpoint_b: NodeId,
    /// Link latency.
    pub latency: f64,
    /// One-directional link bandwidth.
    pub bandwidth: f64,
}

impl Link {
    /// Creates a new link named `link-{a}-{b}`.
    pub fn new(id: LinkId, endpoint_a: NodeId, endpoint_b: NodeId, latency: f64, bandwidth: f64) -> Self {
        Self {
            id,
            name: format!("link-{}-{}", endpoint_a, endpoint_b),
            endpoint_a,
            endpoint_b,
            latency,
            bandwidth,
        }
    }

    /// Returns true if `node` is one of the link endpoints.
    pub fn is_incident(&self, node: NodeId) -> bool {
        self.endpoint_a == node || self.endpoint_b == node
    }

    /// Returns true if the link connects `node1` and `node2` (in any direction).
    pub fn connects(&self, node1: NodeId, node2: NodeId) -> bool {
        (self.endpoint_a == node1 && self.endpoint_b == node2) || (self.endpoint_a == node2 && self.endpoint_b == node1)
    }

    /// Returns the endpoint opposite to `node`, or `None` if `node` is not incident to the link.
    pub fn other_endpoint(&self, node: NodeId) -> Option<NodeId> {
        if self.endpoint_a == node {
            Some(self.endpoint_b)
        } else if self.endpoint_b == node {
            Some(self.endpoint_a)
        } else {
            None
        }
    }

    /// Returns true if both endpoints are the same node.
    pub fn is_self_loop(&self) -> bool {
        self.endpoint_a == self.endpoint_b
    }
}
