//! Structural checks performed before the topology is set up.

use std::collections::{HashMap, HashSet};

use crate::error::{Result, TopologyError};
use crate::link::{Link, LinkId};
use crate::node::NodeId;

/// Checks that no link is a self-loop, that link parameters are sane, and that every
/// device from `devices` is attached to at most one link.
///
/// Links are checked in registration order and the first violation is returned.
pub fn check_links<'a, L, D>(links: L, devices: D) -> Result<()>
where
    L: IntoIterator<Item = &'a Link>,
    D: IntoIterator<Item = NodeId>,
{
    let mut attachment: HashMap<NodeId, Option<LinkId>> = devices.into_iter().map(|id| (id, None)).collect();

    for link in links {
        if link.is_self_loop() {
            return Err(TopologyError::SelfLoop { link: link.id });
        }
        if link.latency.is_nan() || link.latency < 0. || link.bandwidth.is_nan() || link.bandwidth <= 0. {
            return Err(TopologyError::InvalidLinkParameters {
                link: link.id,
                latency: link.latency,
                bandwidth: link.bandwidth,
            });
        }
        for endpoint in [link.endpoint_a, link.endpoint_b] {
            if let Some(attached) = attachment.get_mut(&endpoint) {
                if let Some(first) = *attached {
                    return Err(TopologyError::MultipleAttachment {
                        node: endpoint,
                        first,
                        second: link.id,
                    });
                }
                *attached = Some(link.id);
            }
        }
    }
    Ok(())
}

/// Checks that every destination id occurs only once.
pub fn check_destinations<D: IntoIterator<Item = NodeId>>(destinations: D) -> Result<()> {
    let mut seen = HashSet::new();
    for destination in destinations {
        if !seen.insert(destination) {
            return Err(TopologyError::DuplicateDestination { destination });
        }
    }
    Ok(())
}
