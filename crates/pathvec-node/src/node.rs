//! The protocol node state machine.
//!
//! A node is either Stopped or Running. While Running it keeps exactly one
//! send pending; each fired send ages out stale advertisements, refreshes
//! the shortest-path table if the store changed, and emits one datagram per
//! advertised destination on every endpoint before scheduling the next send
//! after a fresh random delay in `[0, interval)`.

use std::collections::BTreeMap;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pathvec_core::types::{NodeId, Path, PathRecord, Timestamp};
use pathvec_core::wire::{decode_record, encode_record};
use pathvec_routing::advert::{AdvertisementStore, LearnOutcome};
use pathvec_routing::shortest::{ShortestPathEngine, ShortestPathTable};
use pathvec_routing::timeout::TimeoutManager;

use crate::action::{DropReason, EndpointId, NodeAction, NodeState, PacketOutcome, TimerToken};
use crate::config::NodeConfig;
use crate::error::NodeError;

/// Running counters for one node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeStats {
    pub ticks: u64,
    pub packets_received: u64,
    pub packets_dropped: u64,
    pub packets_ignored: u64,
    pub withdrawals: u64,
    pub records_sent: u64,
    pub encode_failures: u64,
}

/// A path-vector routing node.
pub struct ProtocolNode {
    id: NodeId,
    neighbor_count: u32,
    interval: Duration,
    announce_self: bool,
    state: NodeState,
    store: AdvertisementStore,
    engine: ShortestPathEngine,
    timeouts: TimeoutManager,
    endpoints: Vec<EndpointId>,
    neighbor_endpoints: BTreeMap<NodeId, EndpointId>,
    pending: Option<TimerToken>,
    next_token: u64,
    rng: StdRng,
    stats: NodeStats,
}

impl ProtocolNode {
    /// Build a stopped node from validated configuration.
    pub fn new(config: &NodeConfig) -> Result<Self, NodeError> {
        config.validate()?;
        let section = &config.node;
        let id = section.node_id();

        let rng = match section.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            id,
            neighbor_count: section.neighbor_count,
            interval: section.interval()?,
            announce_self: section.announce_self,
            state: NodeState::Stopped,
            store: AdvertisementStore::new(section.timeout()?, section.expiry_scope()?),
            engine: ShortestPathEngine::new(id),
            timeouts: TimeoutManager::new(),
            endpoints: Vec::new(),
            neighbor_endpoints: BTreeMap::new(),
            pending: None,
            next_token: 0,
            rng,
            stats: NodeStats::default(),
        })
    }

    /// Register a new transport endpoint and return its id.
    pub fn add_endpoint(&mut self) -> EndpointId {
        let endpoint = EndpointId(self.endpoints.len() as u32);
        self.endpoints.push(endpoint);
        if self.endpoints.len() > self.neighbor_count as usize {
            tracing::debug!(
                node = %self.id,
                endpoints = self.endpoints.len(),
                expected = self.neighbor_count,
                "more endpoints than configured neighbor count"
            );
        }
        endpoint
    }

    /// Enter Running and schedule the first send.
    ///
    /// No-op if already running.
    pub fn start(&mut self, now: Timestamp) -> Vec<NodeAction> {
        if self.state == NodeState::Running {
            return Vec::new();
        }
        self.state = NodeState::Running;
        tracing::info!(node = %self.id, endpoints = self.endpoints.len(), %now, "node started");
        vec![self.schedule_send(now)]
    }

    /// Enter Stopped and cancel the pending send.
    ///
    /// No-op if already stopped. Stored advertisements are kept.
    pub fn stop(&mut self) -> Vec<NodeAction> {
        if self.state == NodeState::Stopped {
            return Vec::new();
        }
        self.state = NodeState::Stopped;
        tracing::info!(node = %self.id, "node stopped");
        self.pending
            .take()
            .map(|token| NodeAction::CancelSend { token })
            .into_iter()
            .collect()
    }

    /// Handle a fired send timer.
    ///
    /// Tokens other than the pending one, and ticks while stopped, are
    /// ignored.
    pub fn on_tick(&mut self, token: TimerToken, now: Timestamp) -> Vec<NodeAction> {
        if self.state != NodeState::Running || self.pending != Some(token) {
            tracing::trace!(node = %self.id, token = token.0, "ignoring stale send timer");
            return Vec::new();
        }
        self.pending = None;
        self.stats.ticks += 1;

        self.sweep(now);

        let mut records = Vec::new();
        if self.announce_self {
            records.push(PathRecord::new(self.id, Path::new()));
        }
        records.extend(self.engine.table(&mut self.store).records());

        let mut actions = Vec::with_capacity(records.len() * self.endpoints.len() + 1);
        for record in &records {
            let raw = match encode_record(record, self.id) {
                Ok(raw) => raw,
                Err(e) => {
                    self.stats.encode_failures += 1;
                    tracing::error!(
                        node = %self.id,
                        destination = %record.destination,
                        hops = record.path.hops(),
                        "refusing to advertise route: {e}"
                    );
                    continue;
                }
            };
            for endpoint in &self.endpoints {
                tracing::trace!(node = %self.id, %endpoint, destination = %record.destination, "transmit");
                actions.push(NodeAction::Transmit {
                    endpoint: *endpoint,
                    raw: raw.clone(),
                });
            }
            self.stats.records_sent += 1;
        }

        actions.push(self.schedule_send(now));
        actions
    }

    /// Handle one datagram received on `endpoint`.
    ///
    /// Never fails: undecodable packets are logged and dropped. Every
    /// processed packet is followed by a timeout sweep.
    pub fn on_packet(&mut self, endpoint: EndpointId, raw: &[u8], now: Timestamp) -> PacketOutcome {
        if self.state != NodeState::Running {
            self.stats.packets_ignored += 1;
            return PacketOutcome::Ignored;
        }
        self.stats.packets_received += 1;

        let outcome = match decode_record(raw) {
            Err(e) => self.drop_packet(endpoint, DropReason::Codec(e)),
            Ok((sender, _)) if sender == self.id => self.drop_packet(endpoint, DropReason::OwnPacket),
            Ok((sender, record)) => {
                self.neighbor_endpoints.insert(sender, endpoint);
                match self.store.learn(self.id, sender, record, now) {
                    LearnOutcome::Stored(outcome) => PacketOutcome::Stored {
                        neighbor: sender,
                        outcome,
                    },
                    LearnOutcome::Withdrawn { reason, removed } => {
                        self.stats.withdrawals += 1;
                        PacketOutcome::Withdrawn {
                            neighbor: sender,
                            reason,
                            removed,
                        }
                    }
                }
            }
        };

        self.sweep(now);
        outcome
    }

    fn sweep(&mut self, now: Timestamp) {
        let eviction = self.timeouts.sweep(&mut self.store, now);
        for neighbor in &eviction.neighbors {
            self.neighbor_endpoints.remove(neighbor);
        }
    }

    fn drop_packet(&mut self, endpoint: EndpointId, reason: DropReason) -> PacketOutcome {
        self.stats.packets_dropped += 1;
        tracing::warn!(node = %self.id, %endpoint, "dropping packet: {reason}");
        PacketOutcome::Dropped(reason)
    }

    fn schedule_send(&mut self, now: Timestamp) -> NodeAction {
        let bound = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX);
        let delay = if bound == 0 {
            0
        } else {
            self.rng.gen_range(0..bound)
        };
        let token = TimerToken(self.next_token);
        self.next_token += 1;
        self.pending = Some(token);
        NodeAction::ScheduleSend {
            token,
            at: now + Duration::from_millis(delay),
        }
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> NodeState {
        self.state
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == NodeState::Running
    }

    /// Read-only view of what neighbors have advertised.
    pub fn store(&self) -> &AdvertisementStore {
        &self.store
    }

    /// Current shortest-path table, rebuilt first if the store changed.
    pub fn routes(&mut self) -> &ShortestPathTable {
        self.engine.table(&mut self.store)
    }

    /// Neighbor to forward to for `destination`.
    pub fn next_hop(&mut self, destination: NodeId) -> Option<NodeId> {
        self.routes().next_hop(destination)
    }

    /// Endpoint on which `neighbor` was last heard.
    #[must_use]
    pub fn neighbor_endpoint(&self, neighbor: NodeId) -> Option<EndpointId> {
        self.neighbor_endpoints.get(&neighbor).copied()
    }

    #[must_use]
    pub fn endpoints(&self) -> &[EndpointId] {
        &self.endpoints
    }

    /// Token of the send currently scheduled, if running.
    #[must_use]
    pub fn pending_send(&self) -> Option<TimerToken> {
        self.pending
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn stats(&self) -> &NodeStats {
        &self.stats
    }

    pub fn timeouts(&self) -> &TimeoutManager {
        &self.timeouts
    }

    /// Number of shortest-path rebuilds so far.
    #[must_use]
    pub fn recomputations(&self) -> u64 {
        self.engine.recomputations()
    }
}
