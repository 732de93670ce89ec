#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod adjacency;
pub mod config;
pub mod error;
pub mod link;
pub mod node;
pub mod routing;
pub mod switching;
pub mod topology;
pub mod validation;

pub use config::{RoutingConfig, TopologyConfig};
pub use error::{Result, TopologyError};
pub use link::{Link, LinkId};
pub use node::{Actuator, EndDevice, FogDevice, IdGenerator, NodeId, Switch};
pub use routing::{ConvergedRoutes, RoutingEntry};
pub use topology::PhysicalTopology;
