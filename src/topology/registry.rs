//! Topology registry
//!
//! Coarse-grained: one mutex guards the whole node map. Mutation is rare
//! compared to message volume, so lookups simply take the same lock.

use crate::topology::error::{TopologyError, TopologyResult};
use crate::topology::types::{LinkParams, NeighborRoute, Node, NodeStatus};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

/// Registry of relay nodes and their symmetric links
#[derive(Debug, Default)]
pub struct TopologyRegistry {
    nodes: Mutex<HashMap<String, Node>>,
}

impl TopologyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a node keyed by its id.
    ///
    /// Replacing drops every link the previous node had. Links carried by
    /// the new node are mirrored onto registered peers; links to unknown
    /// ids are discarded.
    pub fn add_node(&self, mut node: Node) {
        let mut nodes = self.nodes.lock();

        if let Some(previous) = nodes.remove(&node.id) {
            for neighbor in previous.links.keys() {
                if let Some(peer) = nodes.get_mut(neighbor) {
                    peer.links.remove(&previous.id);
                }
            }
            tracing::info!(node = %node.id, "Replacing node in topology");
        }

        node.links.retain(|neighbor, params| {
            if neighbor == &node.id {
                tracing::warn!(node = %node.id, "Ignoring self-link");
                return false;
            }
            match nodes.get_mut(neighbor) {
                Some(peer) => {
                    peer.links.insert(node.id.clone(), *params);
                    true
                }
                None => {
                    tracing::warn!(
                        node = %node.id,
                        neighbor = %neighbor,
                        "Ignoring link to unknown node"
                    );
                    false
                }
            }
        });

        tracing::info!(node = %node.id, addr = %node.addr, "Node added to topology");
        nodes.insert(node.id.clone(), node);
    }

    /// Remove a node and purge every link pointing at it.
    ///
    /// Returns the removed node; absent ids are a logged no-op.
    pub fn remove_node(&self, node_id: &str) -> Option<Node> {
        let mut nodes = self.nodes.lock();

        match nodes.remove(node_id) {
            Some(removed) => {
                for peer in nodes.values_mut() {
                    peer.links.remove(node_id);
                }
                tracing::info!(node = %node_id, "Node removed from topology");
                Some(removed)
            }
            None => {
                tracing::info!(node = %node_id, "Node does not exist, nothing to remove");
                None
            }
        }
    }

    /// Set both directions of the link between `a` and `b`.
    ///
    /// Last write wins; both endpoints must already be registered.
    pub fn update_link(
        &self,
        a: &str,
        b: &str,
        latency: Duration,
        loss_probability: f64,
    ) -> TopologyResult<()> {
        let params = LinkParams::new(latency, loss_probability)?;
        if a == b {
            return Err(TopologyError::SelfLink(a.to_string()));
        }

        let mut nodes = self.nodes.lock();
        for id in [a, b] {
            if !nodes.contains_key(id) {
                tracing::warn!(node = %id, "Link endpoint does not exist");
                return Err(TopologyError::NodeNotFound(id.to_string()));
            }
        }

        if let Some(node) = nodes.get_mut(a) {
            node.links.insert(b.to_string(), params);
        }
        if let Some(node) = nodes.get_mut(b) {
            node.links.insert(a.to_string(), params);
        }

        tracing::info!(a = %a, b = %b, link = %params, "Link updated");
        Ok(())
    }

    pub fn set_status(&self, node_id: &str, status: NodeStatus) -> TopologyResult<()> {
        let mut nodes = self.nodes.lock();
        let node = nodes
            .get_mut(node_id)
            .ok_or_else(|| TopologyError::NodeNotFound(node_id.to_string()))?;
        node.status = status;
        tracing::info!(node = %node_id, ?status, "Node status changed");
        Ok(())
    }

    pub fn get(&self, node_id: &str) -> Option<Node> {
        self.nodes.lock().get(node_id).cloned()
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.nodes.lock().contains_key(node_id)
    }

    /// Link parameters as seen from `from` toward `to`
    pub fn link(&self, from: &str, to: &str) -> Option<LinkParams> {
        self.nodes
            .lock()
            .get(from)
            .and_then(|node| node.links.get(to).copied())
    }

    /// Sorted ids of all registered nodes
    pub fn node_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.nodes.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Whether the node can hand messages straight to the ground station
    pub fn ground_uplink(&self, node_id: &str) -> Option<bool> {
        self.nodes.lock().get(node_id).map(|node| node.ground_uplink)
    }

    pub fn len(&self) -> usize {
        self.nodes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.lock().is_empty()
    }

    /// Resolve the outgoing edges of `node_id`.
    ///
    /// Returns `None` for an unknown node. Neighbors that cannot be
    /// resolved are left out.
    pub fn routes_from(&self, node_id: &str) -> Option<Vec<NeighborRoute>> {
        let nodes = self.nodes.lock();
        let node = nodes.get(node_id)?;

        let routes = node
            .links
            .iter()
            .filter_map(|(neighbor_id, link)| match nodes.get(neighbor_id) {
                Some(neighbor) => Some(NeighborRoute {
                    neighbor_id: neighbor_id.clone(),
                    addr: neighbor.addr,
                    status: neighbor.status,
                    link: *link,
                }),
                None => {
                    tracing::debug!(
                        node = %node_id,
                        neighbor = %neighbor_id,
                        "Skipping unresolvable neighbor"
                    );
                    None
                }
            })
            .collect();

        Some(routes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn registry_with(ids: &[&str]) -> TopologyRegistry {
        let registry = TopologyRegistry::new();
        for (i, id) in ids.iter().enumerate() {
            registry.add_node(Node::new(*id, addr(7000 + i as u16)));
        }
        registry
    }

    fn assert_symmetric(registry: &TopologyRegistry) {
        for id in registry.node_ids() {
            let node = registry.get(&id).unwrap();
            for (neighbor, params) in &node.links {
                assert_eq!(
                    registry.link(neighbor, &id),
                    Some(*params),
                    "link {id} -> {neighbor} is not mirrored"
                );
            }
        }
    }

    #[test]
    fn test_add_node_is_idempotent() {
        let registry = registry_with(&["a"]);
        registry.add_node(Node::new("a", addr(9999)));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a").unwrap().addr, addr(9999));
    }

    #[test]
    fn test_update_link_is_symmetric() {
        let registry = registry_with(&["a", "b", "c"]);

        registry
            .update_link("a", "b", Duration::from_millis(40), 0.25)
            .unwrap();
        registry
            .update_link("b", "c", Duration::from_millis(5), 0.0)
            .unwrap();

        let expected = LinkParams::new(Duration::from_millis(40), 0.25).unwrap();
        assert_eq!(registry.link("a", "b"), Some(expected));
        assert_eq!(registry.link("b", "a"), Some(expected));
        assert_eq!(registry.link("a", "c"), None);
        assert_symmetric(&registry);
    }

    #[test]
    fn test_update_link_overwrites() {
        let registry = registry_with(&["a", "b"]);

        registry
            .update_link("a", "b", Duration::from_millis(40), 0.25)
            .unwrap();
        registry
            .update_link("b", "a", Duration::from_millis(10), 0.9)
            .unwrap();

        let expected = LinkParams::new(Duration::from_millis(10), 0.9).unwrap();
        assert_eq!(registry.link("a", "b"), Some(expected));
        assert_eq!(registry.link("b", "a"), Some(expected));
        assert_eq!(registry.get("a").unwrap().links.len(), 1);
    }

    #[test]
    fn test_update_link_unknown_endpoint() {
        let registry = registry_with(&["a"]);

        assert_eq!(
            registry.update_link("a", "ghost", Duration::ZERO, 0.0),
            Err(TopologyError::NodeNotFound("ghost".into()))
        );
        assert_eq!(
            registry.update_link("ghost", "a", Duration::ZERO, 0.0),
            Err(TopologyError::NodeNotFound("ghost".into()))
        );
        assert!(registry.get("a").unwrap().links.is_empty());
    }

    #[test]
    fn test_update_link_rejects_bad_params() {
        let registry = registry_with(&["a", "b"]);

        assert!(matches!(
            registry.update_link("a", "b", Duration::ZERO, 2.0),
            Err(TopologyError::InvalidLossProbability(_))
        ));
        assert!(matches!(
            registry.update_link("a", "a", Duration::ZERO, 0.0),
            Err(TopologyError::SelfLink(_))
        ));
    }

    #[test]
    fn test_remove_missing_node_is_noop() {
        let registry = registry_with(&["a"]);
        assert!(registry.remove_node("ghost").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_node_purges_links() {
        let registry = registry_with(&["a", "b", "c"]);
        registry.update_link("a", "b", Duration::ZERO, 0.0).unwrap();
        registry.update_link("b", "c", Duration::ZERO, 0.0).unwrap();

        let removed = registry.remove_node("b").unwrap();
        assert_eq!(removed.links.len(), 2);

        assert!(registry.get("a").unwrap().links.is_empty());
        assert!(registry.get("c").unwrap().links.is_empty());
        assert_symmetric(&registry);
    }

    #[test]
    fn test_removed_node_is_not_resurrected() {
        let registry = registry_with(&["a", "b"]);
        registry
            .update_link("a", "b", Duration::from_millis(7), 0.5)
            .unwrap();
        registry.remove_node("b");

        let d = Node::new("d", addr(7100))
            .with_link("b", LinkParams::perfect())
            .with_link("a", LinkParams::perfect());
        registry.add_node(d);

        assert!(!registry.contains("b"));
        assert!(registry.get("b").is_none());
        assert_eq!(registry.link("d", "b"), None);
        assert_eq!(registry.link("a", "d"), Some(LinkParams::perfect()));
        assert_eq!(registry.link("a", "b"), None);
        assert_symmetric(&registry);

        let routes = registry.routes_from("d").unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].neighbor_id, "a");
    }

    #[test]
    fn test_replacing_node_drops_old_links() {
        let registry = registry_with(&["a", "b"]);
        registry.update_link("a", "b", Duration::ZERO, 0.0).unwrap();

        registry.add_node(Node::new("b", addr(8000)));

        assert_eq!(registry.link("a", "b"), None);
        assert_symmetric(&registry);
    }

    #[test]
    fn test_set_status_and_routes() {
        let registry = registry_with(&["a", "b", "c"]);
        registry
            .update_link("a", "b", Duration::from_millis(3), 0.1)
            .unwrap();
        registry.update_link("a", "c", Duration::ZERO, 0.0).unwrap();
        registry.set_status("c", NodeStatus::Failed).unwrap();

        let routes = registry.routes_from("a").unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].neighbor_id, "b");
        assert_eq!(routes[0].addr, registry.get("b").unwrap().addr);
        assert_eq!(routes[1].status, NodeStatus::Failed);

        assert!(registry.routes_from("ghost").is_none());
        assert!(matches!(
            registry.set_status("ghost", NodeStatus::Failed),
            Err(TopologyError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_symmetry_after_update_sequence() {
        let registry = registry_with(&["a", "b", "c", "d"]);
        let pairs = [("a", "b"), ("b", "c"), ("c", "a"), ("a", "b"), ("d", "c"), ("c", "d")];

        for (i, (x, y)) in pairs.iter().enumerate() {
            registry
                .update_link(x, y, Duration::from_millis(i as u64), i as f64 / 10.0)
                .unwrap();
        }

        assert_symmetric(&registry);
        assert_eq!(registry.link("b", "a").unwrap().latency, Duration::from_millis(3));
        assert_eq!(registry.link("d", "c").unwrap().loss_probability, 0.5);
    }
}
