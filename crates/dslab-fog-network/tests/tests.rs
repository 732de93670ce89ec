use std::collections::{BTreeMap, VecDeque};

use rand::prelude::*;
use rand_pcg::Pcg64;
use rstest::rstest;

use dslab_fog_network::routing::converge;
use dslab_fog_network::{
    EndDevice, FogDevice, IdGenerator, NodeId, PhysicalTopology, Switch, TopologyConfig, TopologyError,
};

// Switches 1..=n, switch i has fog device 100 + i.
fn switches_with_hosts(n: usize) -> PhysicalTopology {
    let mut topology = PhysicalTopology::new();
    for i in 1..=n {
        topology.add_switch(Switch::new(i, &format!("sw-{}", i)));
        topology.add_fog_device(FogDevice::new(100 + i, &format!("fd-{}", i)));
        topology.add_link(i, 100 + i, 1., 100.);
    }
    topology
}

fn line(n: usize) -> PhysicalTopology {
    let mut topology = switches_with_hosts(n);
    for i in 1..n {
        topology.add_link(i, i + 1, 1., 100.);
    }
    topology
}

fn bfs_distances(n: usize, edges: &[(NodeId, NodeId)], from: NodeId) -> BTreeMap<NodeId, usize> {
    let mut dist = BTreeMap::from([(from, 0)]);
    let mut queue = VecDeque::from([from]);
    while let Some(node) = queue.pop_front() {
        let d = dist[&node];
        for &(a, b) in edges {
            let next = if a == node {
                b
            } else if b == node {
                a
            } else {
                continue;
            };
            if next <= n && !dist.contains_key(&next) {
                dist.insert(next, d + 1);
                queue.push_back(next);
            }
        }
    }
    dist
}

#[rstest]
fn test_line(#[values(1, 2, 5, 10)] n: usize) {
    let mut topology = line(n);
    assert!(topology.validate_topology());
    topology.set_up_entities().unwrap();

    let routes = converge(&topology.adjacency(), None).unwrap();
    for i in 1..=n {
        for j in 1..=n {
            assert_eq!(routes.hop_count(i, 100 + j), Some(i.abs_diff(j)));
            assert_eq!(topology.route(i, 100 + j).unwrap().len(), i.abs_diff(j) + 1);
        }
    }
    for i in 1..n {
        // every switch forwards towards the host of the last switch via its right neighbor
        assert_eq!(routes.next_hop(i, 100 + n), Some(i + 1));
        assert_eq!(routes.hop_count(i, 100 + n).unwrap(), routes.hop_count(i + 1, 100 + n).unwrap() + 1);
    }
}

#[rstest]
fn test_star(#[values(1, 3, 8)] k: usize) {
    // centre is switch 1, leaves are switches 2..=k+1
    let mut topology = switches_with_hosts(k + 1);
    for leaf in 2..=k + 1 {
        topology.add_link(1, leaf, 1., 100.);
    }
    topology.set_up_entities().unwrap();

    let routes = converge(&topology.adjacency(), None).unwrap();
    for leaf in 2..=k + 1 {
        assert_eq!(routes.hop_count(1, 100 + leaf), Some(1));
        assert_eq!(routes.hop_count(leaf, 101), Some(1));
        for other in 2..=k + 1 {
            if other != leaf {
                assert_eq!(routes.hop_count(leaf, 100 + other), Some(2));
                assert_eq!(routes.next_hop(leaf, 100 + other), Some(1));
            }
        }
    }
}

#[test]
fn test_self_loop() {
    let mut topology = line(3);
    let link = topology.add_link(2, 2, 1., 100.);
    assert!(!topology.validate_topology());
    assert_eq!(topology.set_up_entities(), Err(TopologyError::SelfLoop { link }));
    assert!(!topology.is_set_up());
}

#[test]
fn test_failed_setup_clears_previous_tables() {
    let mut topology = line(3);
    topology.set_up_entities().unwrap();
    assert!(topology.switching_table(1, 103).is_some());

    let link = topology.add_link(2, 2, 1., 100.);
    assert_eq!(topology.set_up_entities(), Err(TopologyError::SelfLoop { link }));
    assert!(!topology.is_set_up());
    assert_eq!(topology.switching_table(1, 103), None);
    assert_eq!(topology.route(1, 103), None);
    assert!(topology.switches().all(|sw| sw.switching_table().is_empty()));
}

#[test]
fn test_duplicate_destination_ids() {
    let mut topology = line(2);
    // actuator reuses the id of a fog device
    topology.add_end_device(EndDevice::new(50, "dev").with_actuator(101, "act"));
    topology.add_link(50, 2, 1., 100.);
    assert!(!topology.validate_topology());
    assert_eq!(
        topology.set_up_entities(),
        Err(TopologyError::DuplicateDestination { destination: 101 })
    );

    let mut topology = line(2);
    topology.add_end_device(EndDevice::new(50, "dev-1").with_actuator(60, "act"));
    topology.add_end_device(EndDevice::new(51, "dev-2").with_actuator(60, "act"));
    assert!(matches!(
        topology.check_topology(),
        Err(TopologyError::DuplicateDestination { destination: 60 })
    ));
}

#[test]
fn test_host_with_two_links() {
    let mut topology = line(3);
    let second = topology.add_link(3, 101, 1., 100.);
    assert!(!topology.validate_topology());
    assert!(matches!(
        topology.check_topology(),
        Err(TopologyError::MultipleAttachment { node: 101, second: s, .. }) if s == second
    ));
}

#[test]
fn test_end_device_with_two_links() {
    let mut topology = line(2);
    topology.add_end_device(EndDevice::new(50, "dev").with_actuator(51, "act"));
    topology.add_link(50, 1, 1., 100.);
    assert!(topology.validate_topology());
    topology.add_link(50, 2, 1., 100.);
    assert!(!topology.validate_topology());
}

#[test]
fn test_invalid_link_parameters() {
    let mut topology = line(2);
    topology.add_link(1, 2, -1., 100.);
    assert!(!topology.validate_topology());
}

#[rstest]
fn test_actuator(#[values(1, 3, 6)] s: usize) {
    let n = 6;
    let mut topology = line(n);
    topology.add_end_device(EndDevice::new(50, "dev").with_actuator(51, "act-1").with_actuator(52, "act-2"));
    let dev_link = topology.add_link(50, s, 2., 10.);
    topology.set_up_entities().unwrap();

    let routes = converge(&topology.adjacency(), None).unwrap();
    assert_eq!(routes.next_hop(s, 51), Some(50));
    for i in 1..=n {
        assert_eq!(routes.hop_count(i, 51), Some(i.abs_diff(s)));
        assert_eq!(routes.hop_count(i, 52), Some(i.abs_diff(s)));
    }
    // the end device itself is not a destination
    assert_eq!(routes.hop_count(s, 50), None);
    assert_eq!(topology.switching_table(s, 51), Some(dev_link));
    assert_eq!(topology.route(s, 52), Some(vec![dev_link]));
    assert_eq!(topology.end_device(50).unwrap().link_id(), Some(dev_link));
}

#[test]
fn test_disconnected() {
    // 1 - 2 and 3 - 4 without a link between them
    let mut topology = switches_with_hosts(4);
    topology.add_link(1, 2, 1., 100.);
    topology.add_link(3, 4, 1., 100.);
    assert!(topology.validate_topology());

    let routes = converge(&topology.adjacency(), None).unwrap();
    assert!(!routes.is_complete());
    assert!(routes.rounds() <= 4);
    assert!(routes.unreachable().contains(&(1, 103)));
    assert!(routes.unreachable().contains(&(4, 101)));
    assert_eq!(routes.unreachable().len(), 8);
    assert_eq!(routes.hop_count(2, 101), Some(1));

    assert_eq!(
        topology.set_up_entities(),
        Err(TopologyError::Unreachable {
            switch: 1,
            destination: 103
        })
    );
    assert!(!topology.is_set_up());
    assert!(topology.switches().all(|sw| sw.switching_table().is_empty()));
}

#[test]
fn test_isolated_switch() {
    let mut topology = line(2);
    topology.add_switch(Switch::new(3, "lonely"));
    let routes = converge(&topology.adjacency(), None).unwrap();
    assert_eq!(routes.unreachable(), &[(3, 101), (3, 102)]);
}

#[test]
fn test_unlinked_device_is_omitted() {
    let mut topology = line(2);
    topology.add_fog_device(FogDevice::new(200, "offline"));
    topology.set_up_entities().unwrap();
    assert_eq!(topology.switching_table(1, 200), None);
    assert_eq!(topology.switching_table(1, 102), topology.link_between(1, 2).map(|l| l.id));
    assert_eq!(topology.fog_device(200).unwrap().link_id(), None);
    assert_eq!(topology.destination_count(), 3);
}

#[test]
fn test_idempotence() {
    let mut topology = switches_with_hosts(4);
    // square with equal-cost paths between opposite corners
    topology.add_link(1, 2, 1., 100.);
    topology.add_link(2, 3, 1., 100.);
    topology.add_link(3, 4, 1., 100.);
    topology.add_link(4, 1, 1., 100.);

    let adjacency = topology.adjacency();
    let first = converge(&adjacency, None).unwrap();
    let second = converge(&adjacency, None).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.next_hop(1, 103), Some(2));

    topology.set_up_entities().unwrap();
    let tables: Vec<_> = topology.switches().map(|sw| sw.switching_table().clone()).collect();
    topology.set_up_entities().unwrap();
    let tables_again: Vec<_> = topology.switches().map(|sw| sw.switching_table().clone()).collect();
    assert_eq!(tables, tables_again);
}

#[test]
fn test_parallel_switch_links() {
    let mut topology = switches_with_hosts(2);
    let first = topology.add_link(1, 2, 5., 10.);
    topology.add_link(2, 1, 1., 1000.);
    topology.set_up_entities().unwrap();
    assert_eq!(topology.switching_table(1, 102), Some(first));
    assert_eq!(topology.switching_table(2, 101), Some(first));
    assert_eq!(topology.route_latency(1, 102), Some(6.));
    assert_eq!(topology.route_bandwidth(1, 102), Some(10.));
}

#[test]
fn test_adjacency() {
    let mut topology = line(3);
    topology.add_end_device(EndDevice::new(50, "dev"));
    topology.add_link(2, 50, 1., 100.);
    topology.set_up_entities().unwrap();

    let sw = topology.switch(2).unwrap();
    assert_eq!(sw.adjacent_hosts().iter().copied().collect::<Vec<_>>(), vec![102]);
    assert_eq!(sw.adjacent_end_devices().iter().copied().collect::<Vec<_>>(), vec![50]);
    assert_eq!(sw.neighbor_switches().iter().copied().collect::<Vec<_>>(), vec![1, 3]);
    assert!(topology.switch(1).unwrap().adjacent_end_devices().is_empty());
}

#[rstest]
fn test_random_topologies(#[values(1, 2, 3, 4, 5)] seed: u64) {
    let mut rng = Pcg64::seed_from_u64(seed);
    for _ in 0..20 {
        let n = rng.gen_range(2..30);
        let mut topology = switches_with_hosts(n);
        let mut edges = Vec::new();
        for i in 2..=n {
            edges.push((i, rng.gen_range(1..i)));
        }
        for _ in 0..rng.gen_range(0..n) {
            let (a, b) = (rng.gen_range(1..=n), rng.gen_range(1..=n));
            if a != b {
                edges.push((a, b));
            }
        }
        for &(a, b) in &edges {
            topology.add_link(a, b, rng.gen_range(0.0..10.0), rng.gen_range(1.0..100.0));
        }
        topology.set_up_entities().unwrap();

        let routes = converge(&topology.adjacency(), None).unwrap();
        assert!(routes.rounds() <= n);
        for i in 1..=n {
            let dist = bfs_distances(n, &edges, i);
            let sw = topology.switch(i).unwrap();
            assert_eq!(sw.switching_table().len(), n);
            for j in 1..=n {
                assert_eq!(routes.hop_count(i, 100 + j), Some(dist[&j]));
                // outgoing link is always incident to the switch
                let link = topology.link(sw.next_link(100 + j).unwrap()).unwrap();
                assert!(link.is_incident(i));
                let path = topology.route(i, 100 + j).unwrap();
                assert_eq!(path.len(), dist[&j] + 1);
                assert_eq!(path.last().copied(), topology.fog_device(100 + j).unwrap().link_id());
            }
        }
    }
}

const PROJECT_YAML: &str = r#"
switches: [SW1, SW2]
fog_devices: [FD3, FD2, FD1]
end_devices:
  - name: DEV1
    actuators: [a-1]
  - name: DEV2
links:
  - { from: DEV1, to: SW1, latency: 10, bandwidth: 1000 }
  - { from: DEV2, to: SW2, latency: 10, bandwidth: 1000 }
  - { from: SW1, to: FD1, latency: 10, bandwidth: 1000 }
  - { from: SW1, to: FD2, latency: 10, bandwidth: 1000 }
  - { from: SW1, to: SW2, latency: 10, bandwidth: 1000 }
  - { from: SW2, to: FD3, latency: 10, bandwidth: 1000 }
"#;

#[test]
fn test_config() {
    let config = TopologyConfig::from_yaml(PROJECT_YAML).unwrap();
    assert_eq!(config.routing.max_rounds, None);
    let mut from_config = config.build().unwrap();

    let mut ids = IdGenerator::default();
    let mut topology = PhysicalTopology::new();
    let sw1 = ids.next_id();
    let sw2 = ids.next_id();
    topology.add_switch(Switch::new(sw1, "SW1"));
    topology.add_switch(Switch::new(sw2, "SW2"));
    let fd3 = ids.next_id();
    let fd2 = ids.next_id();
    let fd1 = ids.next_id();
    topology.add_fog_device(FogDevice::new(fd3, "FD3"));
    topology.add_fog_device(FogDevice::new(fd2, "FD2"));
    topology.add_fog_device(FogDevice::new(fd1, "FD1"));
    let dev1 = ids.next_id();
    let a1 = ids.next_id();
    let dev2 = ids.next_id();
    topology.add_end_device(EndDevice::new(dev1, "DEV1").with_actuator(a1, "a-1"));
    topology.add_end_device(EndDevice::new(dev2, "DEV2"));
    topology.add_link(dev1, sw1, 10., 1000.);
    topology.add_link(dev2, sw2, 10., 1000.);
    topology.add_link(sw1, fd1, 10., 1000.);
    topology.add_link(sw1, fd2, 10., 1000.);
    let trunk = topology.add_link(sw1, sw2, 10., 1000.);
    topology.add_link(sw2, fd3, 10., 1000.);

    assert_eq!(from_config.links().cloned().collect::<Vec<_>>(), topology.links().cloned().collect::<Vec<_>>());
    assert_eq!(from_config.find_node("a-1"), Some(a1));
    assert_eq!(from_config.node_name(dev2), Some("DEV2"));

    from_config.set_up_entities().unwrap();
    topology.set_up_entities().unwrap();
    for sw in [sw1, sw2] {
        assert_eq!(
            from_config.switch(sw).unwrap().switching_table(),
            topology.switch(sw).unwrap().switching_table()
        );
    }
    assert_eq!(topology.destination_count(), 4);
    assert_eq!(topology.switching_table(sw2, a1), Some(trunk));
    assert_eq!(topology.route_latency(sw2, a1), Some(20.));
}

#[test]
fn test_config_errors() {
    let unknown = "switches: [SW1]\nlinks:\n  - { from: SW1, to: FD1, latency: 1, bandwidth: 1 }\n";
    assert_eq!(
        TopologyConfig::from_yaml(unknown).unwrap().build().err(),
        Some(TopologyError::UnknownNode { id: "FD1".to_string() })
    );

    let actuator_link = "switches: [SW1]\nend_devices:\n  - { name: DEV1, actuators: [a-1] }\nlinks:\n  - { from: SW1, to: a-1, latency: 1, bandwidth: 1 }\n";
    assert!(matches!(
        TopologyConfig::from_yaml(actuator_link).unwrap().build(),
        Err(TopologyError::UnknownNode { .. })
    ));

    let duplicate = "switches: [X]\nfog_devices: [X]\n";
    assert!(matches!(
        TopologyConfig::from_yaml(duplicate).unwrap().build(),
        Err(TopologyError::Config(_))
    ));

    assert!(matches!(
        TopologyConfig::from_yaml("switches: 42"),
        Err(TopologyError::Config(_))
    ));
    assert!(matches!(
        TopologyConfig::from_file("no/such/topology.yaml"),
        Err(TopologyError::Config(_))
    ));
}

#[test]
fn test_round_limit_from_config() {
    let yaml = "switches: [A, B, C]\nfog_devices: [H]\nlinks:\n  - { from: A, to: B, latency: 1, bandwidth: 1 }\n  - { from: B, to: C, latency: 1, bandwidth: 1 }\n  - { from: C, to: H, latency: 1, bandwidth: 1 }\nrouting:\n  max_rounds: 1\n";
    let mut topology = TopologyConfig::from_yaml(yaml).unwrap().build().unwrap();
    assert_eq!(
        topology.set_up_entities(),
        Err(TopologyError::ConvergenceTimeout { rounds: 1 })
    );
}
