//! Topology and routing configuration.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TopologyError};
use crate::node::{EndDevice, FogDevice, IdGenerator, NodeId, Switch};
use crate::topology::PhysicalTopology;

/// Routing parameters.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize, Clone)]
pub struct RoutingConfig {
    /// Maximum number of relaxation rounds, the number of switches if not set.
    pub max_rounds: Option<usize>,
}

/// End device with its actuators.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct EndDeviceConfig {
    /// Device name.
    pub name: String,
    /// Names of actuators hosted by the device.
    #[serde(default)]
    pub actuators: Vec<String>,
}

/// Link between two named nodes.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct LinkConfig {
    /// First endpoint name.
    pub from: String,
    /// Second endpoint name.
    pub to: String,
    /// Link latency.
    pub latency: f64,
    /// One-directional link bandwidth.
    pub bandwidth: f64,
}

/// Physical topology description, usually read from a YAML file.
///
/// Configuration file example:
///
/// ```yaml
/// switches: [SW1, SW2]
/// fog_devices: [FD1, FD2]
/// end_devices:
///   - name: DEV1
///     actuators: [a-1]
/// links:
///   - { from: DEV1, to: SW1, latency: 10, bandwidth: 1000 }
///   - { from: FD1, to: SW1, latency: 10, bandwidth: 1000 }
///   - { from: SW1, to: SW2, latency: 10, bandwidth: 1000 }
///   - { from: FD2, to: SW2, latency: 10, bandwidth: 1000 }
/// routing:
///   max_rounds: 16
/// ```
#[derive(Debug, Default, PartialEq, Serialize, Deserialize, Clone)]
pub struct TopologyConfig {
    /// Switch names.
    #[serde(default)]
    pub switches: Vec<String>,
    /// Fog device names.
    #[serde(default)]
    pub fog_devices: Vec<String>,
    /// End devices.
    #[serde(default)]
    pub end_devices: Vec<EndDeviceConfig>,
    /// Links between the nodes above.
    #[serde(default)]
    pub links: Vec<LinkConfig>,
    /// Routing parameters.
    #[serde(default)]
    pub routing: RoutingConfig,
}

impl TopologyConfig {
    /// Reads topology config from YAML file.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let yaml = std::fs::read_to_string(file)
            .map_err(|e| TopologyError::Config(format!("can't read file {}: {}", file.display(), e)))?;
        Self::from_yaml(&yaml)
    }

    /// Parses topology config from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| TopologyError::Config(format!("can't parse YAML: {}", e)))
    }

    /// Creates the described topology, assigning sequential node ids starting from 1.
    ///
    /// The topology is only populated, not validated or set up.
    pub fn build(&self) -> Result<PhysicalTopology> {
        self.build_with(&mut IdGenerator::default())
    }

    /// Same as [`Self::build`] but takes node ids from `ids`.
    pub fn build_with(&self, ids: &mut IdGenerator) -> Result<PhysicalTopology> {
        self.check_unique_names()?;
        let mut topology = PhysicalTopology::with_routing_config(self.routing.clone());

        for name in &self.switches {
            topology.add_switch(Switch::new(ids.next_id(), name));
        }
        for name in &self.fog_devices {
            topology.add_fog_device(FogDevice::new(ids.next_id(), name));
        }
        for dev_config in &self.end_devices {
            let mut dev = EndDevice::new(ids.next_id(), &dev_config.name);
            for actuator in &dev_config.actuators {
                dev.add_actuator(ids.next_id(), actuator);
            }
            topology.add_end_device(dev);
        }

        for link in &self.links {
            let from = resolve(&topology, &link.from)?;
            let to = resolve(&topology, &link.to)?;
            topology.add_link(from, to, link.latency, link.bandwidth);
        }
        Ok(topology)
    }

    fn check_unique_names(&self) -> Result<()> {
        let mut names = HashSet::new();
        let all = self
            .switches
            .iter()
            .chain(self.fog_devices.iter())
            .chain(self.end_devices.iter().map(|d| &d.name))
            .chain(self.end_devices.iter().flat_map(|d| d.actuators.iter()));
        for name in all {
            if !names.insert(name.as_str()) {
                return Err(TopologyError::Config(format!("duplicate node name {}", name)));
            }
        }
        Ok(())
    }
}

// Actuators cannot be linked, so only switches and devices are valid link endpoints.
fn resolve(topology: &PhysicalTopology, name: &str) -> Result<NodeId> {
    topology
        .find_node(name)
        .filter(|id| {
            topology.switch(*id).is_some() || topology.fog_device(*id).is_some() || topology.end_device(*id).is_some()
        })
        .ok_or_else(|| TopologyError::UnknownNode { id: name.to_string() })
}
