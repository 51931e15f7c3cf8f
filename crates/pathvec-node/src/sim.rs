//! Deterministic in-memory host for protocol nodes.
//!
//! [`SimNetwork`] owns a set of [`ProtocolNode`]s joined by point-to-point
//! links and drives them from a single time-ordered event queue. It carries
//! out every [`NodeAction`] a node returns: transmissions become deliveries
//! on the far end of the link after the link delay, scheduled sends become
//! timer events, and cancellations remove them again.
//!
//! Events are ordered by time, then by insertion sequence, so a run is fully
//! reproducible for a given topology and set of node seeds.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pathvec_core::types::{NodeId, Timestamp};

use crate::action::{EndpointId, NodeAction, TimerToken};
use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::node::ProtocolNode;

/// Propagation delay used by [`SimNetwork::connect`].
pub const DEFAULT_LINK_DELAY: Duration = Duration::from_millis(1);

/// Errors from building a simulated topology.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("node {0} already exists")]
    DuplicateNode(NodeId),

    #[error("nodes {0} and {1} are already linked")]
    DuplicateLink(NodeId, NodeId),

    #[error("cannot link node {0} to itself")]
    SelfLink(NodeId),

    #[error("unknown link {0}")]
    UnknownLink(usize),

    #[error("cannot connect {nodes} nodes with only {links} links")]
    TooFewLinks { nodes: u32, links: u32 },

    #[error("{nodes} nodes allow at most {max} links, {links} requested")]
    TooManyLinks { nodes: u32, links: u32, max: u32 },

    #[error(transparent)]
    Node(#[from] NodeError),
}

/// Index of a link within a [`SimNetwork`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkId(pub usize);

/// One bidirectional point-to-point link.
#[derive(Debug, Clone)]
pub struct SimLink {
    pub ends: [(NodeId, EndpointId); 2],
    pub delay: Duration,
    pub up: bool,
}

impl SimLink {
    /// The end opposite to `node`.
    fn peer_of(&self, node: NodeId) -> (NodeId, EndpointId) {
        if self.ends[0].0 == node {
            self.ends[1]
        } else {
            self.ends[0]
        }
    }

    fn joins(&self, a: NodeId, b: NodeId) -> bool {
        let (x, y) = (self.ends[0].0, self.ends[1].0);
        (x == a && y == b) || (x == b && y == a)
    }
}

/// Counters accumulated over a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimStats {
    pub events_processed: u64,
    pub packets_delivered: u64,
    pub packets_lost: u64,
    pub sends_cancelled: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct EventKey {
    at: Timestamp,
    sequence: u64,
}

#[derive(Debug, Clone)]
enum SimEvent {
    Send {
        node: NodeId,
        token: TimerToken,
    },
    Deliver {
        link: LinkId,
        to: NodeId,
        endpoint: EndpointId,
        raw: Vec<u8>,
    },
    LinkDown(LinkId),
    StopNode(NodeId),
}

/// A deterministic network of protocol nodes.
#[derive(Default)]
pub struct SimNetwork {
    now: Timestamp,
    nodes: BTreeMap<NodeId, ProtocolNode>,
    links: Vec<SimLink>,
    endpoint_links: BTreeMap<(NodeId, EndpointId), LinkId>,
    queue: BTreeMap<EventKey, SimEvent>,
    timers: BTreeMap<(NodeId, TimerToken), EventKey>,
    sequence: u64,
    stats: SimStats,
}

impl SimNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a random connected topology.
    ///
    /// Nodes are numbered `0..nodes`. Each node after the first is linked
    /// to a uniformly chosen earlier node, which yields a spanning tree;
    /// the remaining links join random unlinked pairs. Every node gets
    /// `base` with its own id and a seed drawn from the topology RNG.
    ///
    /// Returns the network and the ids of the links added beyond the
    /// spanning tree.
    pub fn random(
        seed: u64,
        nodes: u32,
        links: u32,
        base: &NodeConfig,
    ) -> Result<(Self, Vec<LinkId>), SimError> {
        if nodes > 0 && links < nodes - 1 {
            return Err(SimError::TooFewLinks { nodes, links });
        }
        let max = nodes.saturating_mul(nodes.saturating_sub(1)) / 2;
        if links > max {
            return Err(SimError::TooManyLinks { nodes, links, max });
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut net = Self::new();
        for i in 0..nodes {
            let mut config = base.clone();
            config.node.id = i;
            config.node.seed = Some(rng.gen());
            net.add_node(&config)?;
        }

        for i in 1..nodes {
            let j = rng.gen_range(0..i);
            net.connect(NodeId(i), NodeId(j))?;
        }

        let mut extra = Vec::new();
        while (net.links.len() as u32) < links {
            let i = NodeId(rng.gen_range(0..nodes));
            let j = NodeId(rng.gen_range(0..nodes));
            if i == j || net.link_between(i, j).is_some() {
                continue;
            }
            extra.push(net.connect(i, j)?);
        }

        tracing::debug!(seed, nodes, links, extra = extra.len(), "built random topology");
        Ok((net, extra))
    }

    /// Add a stopped node built from `config`.
    pub fn add_node(&mut self, config: &NodeConfig) -> Result<NodeId, SimError> {
        let node = ProtocolNode::new(config)?;
        let id = node.id();
        if self.nodes.contains_key(&id) {
            return Err(SimError::DuplicateNode(id));
        }
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Link `a` and `b` with [`DEFAULT_LINK_DELAY`].
    pub fn connect(&mut self, a: NodeId, b: NodeId) -> Result<LinkId, SimError> {
        self.connect_with_delay(a, b, DEFAULT_LINK_DELAY)
    }

    pub fn connect_with_delay(
        &mut self,
        a: NodeId,
        b: NodeId,
        delay: Duration,
    ) -> Result<LinkId, SimError> {
        if a == b {
            return Err(SimError::SelfLink(a));
        }
        for id in [a, b] {
            if !self.nodes.contains_key(&id) {
                return Err(SimError::UnknownNode(id));
            }
        }
        if self.link_between(a, b).is_some() {
            return Err(SimError::DuplicateLink(a, b));
        }

        let ea = self.node_entry(a)?.add_endpoint();
        let eb = self.node_entry(b)?.add_endpoint();
        let link = LinkId(self.links.len());
        self.links.push(SimLink {
            ends: [(a, ea), (b, eb)],
            delay,
            up: true,
        });
        self.endpoint_links.insert((a, ea), link);
        self.endpoint_links.insert((b, eb), link);
        tracing::trace!(%a, %b, link = link.0, "linked");
        Ok(link)
    }

    /// Take `link` down at time `at`. Packets in flight on it are lost.
    pub fn disable_link_at(&mut self, link: LinkId, at: Timestamp) -> Result<(), SimError> {
        if link.0 >= self.links.len() {
            return Err(SimError::UnknownLink(link.0));
        }
        self.push(at, SimEvent::LinkDown(link));
        Ok(())
    }

    /// Stop `node` at time `at`.
    pub fn stop_node_at(&mut self, node: NodeId, at: Timestamp) -> Result<(), SimError> {
        if !self.nodes.contains_key(&node) {
            return Err(SimError::UnknownNode(node));
        }
        self.push(at, SimEvent::StopNode(node));
        Ok(())
    }

    /// Stop every node at time `at`.
    pub fn stop_all_at(&mut self, at: Timestamp) {
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        for id in ids {
            self.push(at, SimEvent::StopNode(id));
        }
    }

    /// Start every node at the current time.
    pub fn start_all(&mut self) {
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        for id in ids {
            let now = self.now;
            if let Some(node) = self.nodes.get_mut(&id) {
                let actions = node.start(now);
                self.apply(id, actions);
            }
        }
    }

    /// Process every event scheduled at or before `end`, then advance the
    /// clock to `end`.
    pub fn run_until(&mut self, end: Timestamp) {
        while let Some((&key, _)) = self.queue.first_key_value() {
            if key.at > end {
                break;
            }
            let Some((key, event)) = self.queue.pop_first() else {
                break;
            };
            self.now = key.at;
            self.stats.events_processed += 1;
            self.dispatch(event);
        }
        if end > self.now {
            self.now = end;
        }
        tracing::debug!(now = %self.now, pending = self.queue.len(), "simulation paused");
    }

    fn dispatch(&mut self, event: SimEvent) {
        let now = self.now;
        match event {
            SimEvent::Send { node, token } => {
                self.timers.remove(&(node, token));
                if let Some(n) = self.nodes.get_mut(&node) {
                    let actions = n.on_tick(token, now);
                    self.apply(node, actions);
                }
            }
            SimEvent::Deliver {
                link,
                to,
                endpoint,
                raw,
            } => {
                if !self.links[link.0].up {
                    self.stats.packets_lost += 1;
                    return;
                }
                if let Some(n) = self.nodes.get_mut(&to) {
                    n.on_packet(endpoint, &raw, now);
                    self.stats.packets_delivered += 1;
                }
            }
            SimEvent::LinkDown(link) => {
                let l = &mut self.links[link.0];
                l.up = false;
                tracing::info!(link = link.0, a = %l.ends[0].0, b = %l.ends[1].0, %now, "link down");
            }
            SimEvent::StopNode(node) => {
                if let Some(n) = self.nodes.get_mut(&node) {
                    let actions = n.stop();
                    self.apply(node, actions);
                }
            }
        }
    }

    fn apply(&mut self, node: NodeId, actions: Vec<NodeAction>) {
        for action in actions {
            match action {
                NodeAction::Transmit { endpoint, raw } => {
                    let Some(&link) = self.endpoint_links.get(&(node, endpoint)) else {
                        tracing::warn!(%node, %endpoint, "transmit on unlinked endpoint");
                        continue;
                    };
                    let l = &self.links[link.0];
                    if !l.up {
                        self.stats.packets_lost += 1;
                        continue;
                    }
                    let (to, far_endpoint) = l.peer_of(node);
                    let at = self.now + l.delay;
                    self.push(
                        at,
                        SimEvent::Deliver {
                            link,
                            to,
                            endpoint: far_endpoint,
                            raw,
                        },
                    );
                }
                NodeAction::ScheduleSend { token, at } => {
                    let key = self.push(at, SimEvent::Send { node, token });
                    self.timers.insert((node, token), key);
                }
                NodeAction::CancelSend { token } => {
                    if let Some(key) = self.timers.remove(&(node, token)) {
                        self.queue.remove(&key);
                        self.stats.sends_cancelled += 1;
                    }
                }
            }
        }
    }

    fn push(&mut self, at: Timestamp, event: SimEvent) -> EventKey {
        let key = EventKey {
            at,
            sequence: self.sequence,
        };
        self.sequence += 1;
        self.queue.insert(key, event);
        key
    }

    fn node_entry(&mut self, id: NodeId) -> Result<&mut ProtocolNode, SimError> {
        self.nodes.get_mut(&id).ok_or(SimError::UnknownNode(id))
    }

    fn link_between(&self, a: NodeId, b: NodeId) -> Option<LinkId> {
        self.links
            .iter()
            .position(|l| l.joins(a, b))
            .map(LinkId)
    }

    /// Hop distance from `from` to every other node reachable over links
    /// that are currently up.
    pub fn hop_distances(&self, from: NodeId) -> BTreeMap<NodeId, usize> {
        let mut distances = BTreeMap::new();
        let mut seen = BTreeSet::from([from]);
        let mut frontier = VecDeque::from([(from, 0usize)]);
        while let Some((node, d)) = frontier.pop_front() {
            for link in self.links.iter().filter(|l| l.up) {
                if !link.ends.iter().any(|(n, _)| *n == node) {
                    continue;
                }
                let (peer, _) = link.peer_of(node);
                if seen.insert(peer) {
                    distances.insert(peer, d + 1);
                    frontier.push_back((peer, d + 1));
                }
            }
        }
        distances
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    pub fn node(&self, id: NodeId) -> Option<&ProtocolNode> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut ProtocolNode> {
        self.nodes.get_mut(&id)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn link(&self, id: LinkId) -> Option<&SimLink> {
        self.links.get(id.0)
    }

    pub fn link_between_nodes(&self, a: NodeId, b: NodeId) -> Option<LinkId> {
        self.link_between(a, b)
    }

    pub fn links(&self) -> &[SimLink] {
        &self.links
    }

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(id: u32) -> NodeConfig {
        let mut c = NodeConfig::for_node(id);
        c.node.seed = Some(u64::from(id) + 100);
        c
    }

    fn pair() -> SimNetwork {
        let mut net = SimNetwork::new();
        net.add_node(&config(1)).unwrap();
        net.add_node(&config(2)).unwrap();
        net.connect(NodeId(1), NodeId(2)).unwrap();
        net
    }

    #[test]
    fn rejects_bad_links() {
        let mut net = pair();
        assert!(matches!(
            net.connect(NodeId(2), NodeId(1)),
            Err(SimError::DuplicateLink(_, _))
        ));
        assert!(matches!(
            net.connect(NodeId(1), NodeId(1)),
            Err(SimError::SelfLink(_))
        ));
        assert!(matches!(
            net.connect(NodeId(1), NodeId(9)),
            Err(SimError::UnknownNode(NodeId(9)))
        ));
        assert!(matches!(
            net.add_node(&config(1)),
            Err(SimError::DuplicateNode(NodeId(1)))
        ));
    }

    #[test]
    fn neighbors_learn_each_other() {
        let mut net = pair();
        net.start_all();
        net.run_until(Timestamp::from_secs(30));

        for (me, peer) in [(1, 2), (2, 1)] {
            let node = net.node_mut(NodeId(me)).unwrap();
            assert_eq!(node.next_hop(NodeId(peer)), Some(NodeId(peer)));
            assert_eq!(node.routes().hops_to(NodeId(peer)), Some(1));
        }
        assert!(net.stats().packets_delivered > 0);
        assert_eq!(net.now(), Timestamp::from_secs(30));
    }

    #[test]
    fn down_link_loses_packets() {
        let mut net = pair();
        net.disable_link_at(LinkId(0), Timestamp::ZERO).unwrap();
        net.start_all();
        net.run_until(Timestamp::from_secs(60));
        assert_eq!(net.stats().packets_delivered, 0);
        assert!(net.stats().packets_lost > 0);
        assert!(net.node(NodeId(1)).unwrap().store().is_empty());
    }

    #[test]
    fn stopped_node_sends_nothing_more() {
        let mut net = pair();
        net.start_all();
        net.stop_node_at(NodeId(2), Timestamp::from_secs(40)).unwrap();
        net.run_until(Timestamp::from_secs(40));
        let sent = net.node(NodeId(2)).unwrap().stats().records_sent;

        net.run_until(Timestamp::from_secs(200));
        let node2 = net.node(NodeId(2)).unwrap();
        assert!(!node2.is_running());
        assert_eq!(node2.stats().records_sent, sent);
        assert_eq!(net.stats().sends_cancelled, 1);
        // node 1 has aged out its silent neighbor
        assert!(net.node(NodeId(1)).unwrap().store().is_empty());
    }

    #[test]
    fn hop_distances_follow_up_links() {
        let mut net = SimNetwork::new();
        for id in 1..=4 {
            net.add_node(&config(id)).unwrap();
        }
        net.connect(NodeId(1), NodeId(2)).unwrap();
        let cut = net.connect(NodeId(2), NodeId(3)).unwrap();
        net.connect(NodeId(1), NodeId(4)).unwrap();
        net.connect(NodeId(4), NodeId(3)).unwrap();

        let d = net.hop_distances(NodeId(1));
        assert_eq!(d[&NodeId(2)], 1);
        assert_eq!(d[&NodeId(3)], 2);
        assert!(!d.contains_key(&NodeId(1)));

        net.disable_link_at(cut, Timestamp::ZERO).unwrap();
        net.run_until(Timestamp::ZERO);
        let d = net.hop_distances(NodeId(2));
        assert_eq!(d[&NodeId(3)], 3);
    }

    #[test]
    fn random_topology_is_connected() {
        let (net, extra) = SimNetwork::random(1, 10, 15, &NodeConfig::default()).unwrap();
        assert_eq!(net.links().len(), 15);
        assert_eq!(extra.len(), 6);
        assert_eq!(net.hop_distances(NodeId(0)).len(), 9);
    }

    #[test]
    fn random_topology_is_reproducible() {
        let (a, _) = SimNetwork::random(7, 8, 12, &NodeConfig::default()).unwrap();
        let (b, _) = SimNetwork::random(7, 8, 12, &NodeConfig::default()).unwrap();
        let ends = |n: &SimNetwork| -> Vec<(NodeId, NodeId)> {
            n.links().iter().map(|l| (l.ends[0].0, l.ends[1].0)).collect()
        };
        assert_eq!(ends(&a), ends(&b));
    }

    #[test]
    fn random_topology_validates_link_count() {
        assert!(matches!(
            SimNetwork::random(1, 10, 8, &NodeConfig::default()),
            Err(SimError::TooFewLinks { .. })
        ));
        assert!(matches!(
            SimNetwork::random(1, 4, 7, &NodeConfig::default()),
            Err(SimError::TooManyLinks { max: 6, .. })
        ));
    }
}
