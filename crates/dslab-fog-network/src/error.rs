//! Topology setup errors.

use thiserror::Error;

use crate::link::LinkId;
use crate::node::NodeId;

/// Errors raised while validating a topology or computing its switching tables.
///
/// All of them are fatal for the topology: no switching table is exposed after an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TopologyError {
    /// A link connects a node to itself.
    #[error("link {link} is a self-loop")]
    SelfLoop {
        /// Offending link.
        link: LinkId,
    },

    /// A fog device or end device is attached to more than one link.
    #[error("node {node} is attached to more than one link ({first} and {second})")]
    MultipleAttachment {
        /// Device id.
        node: NodeId,
        /// First link found for the device.
        first: LinkId,
        /// Second link found for the device.
        second: LinkId,
    },

    /// A link has negative latency or non-positive bandwidth.
    #[error("link {link} has invalid parameters: latency = {latency}, bandwidth = {bandwidth}")]
    InvalidLinkParameters {
        /// Offending link.
        link: LinkId,
        /// Link latency.
        latency: f64,
        /// Link bandwidth.
        bandwidth: f64,
    },

    /// Two destinations (fog devices or actuators) share the same id.
    #[error("destination id {destination} is used more than once")]
    DuplicateDestination {
        /// Clashing id.
        destination: NodeId,
    },

    /// Some destination cannot be reached from a switch.
    #[error("destination {destination} is unreachable from switch {switch}")]
    Unreachable {
        /// Switch without a route.
        switch: NodeId,
        /// Unreachable fog device or actuator.
        destination: NodeId,
    },

    /// Routing tables kept changing after the maximum number of relaxation rounds.
    #[error("routing did not converge after {rounds} rounds")]
    ConvergenceTimeout {
        /// Number of rounds performed.
        rounds: usize,
    },

    /// A converged next hop is not directly linked to its switch.
    #[error("no link between switch {switch} and its next hop {next_hop}")]
    MissingLink {
        /// Switch owning the routing entry.
        switch: NodeId,
        /// Next hop without a direct link.
        next_hop: NodeId,
    },

    /// A node referenced during topology construction was never registered.
    #[error("unknown node {id}")]
    UnknownNode {
        /// Node id or name.
        id: String,
    },

    /// Topology config cannot be read or parsed.
    #[error("invalid topology config: {0}")]
    Config(String),
}

/// Result type of topology operations.
pub type Result<T> = std::result::Result<T, TopologyError>;
