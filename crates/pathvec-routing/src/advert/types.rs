//! Advertisement store types.

use std::collections::BTreeMap;

use pathvec_core::types::{NodeId, Path, Timestamp};

use crate::filter::RejectReason;

/// Granularity at which stored advertisements expire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExpiryScope {
    /// One expiry per neighbor, refreshed by anything heard from it.
    /// A sweep evicts the whole neighbor at once.
    #[default]
    Neighbor,
    /// Each route carries its own expiry, refreshed only when that
    /// destination is re-advertised. A sweep drops stale routes one by one
    /// and evicts neighbors left with nothing.
    Route,
}

/// A single stored path and its own expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub path: Path,
    /// Only consulted under [`ExpiryScope::Route`].
    pub expires: Timestamp,
}

impl RouteEntry {
    /// Expired once `now` reaches `expires`.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires
    }
}

/// Everything currently known from one neighbor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborEntry {
    pub(crate) routes: BTreeMap<NodeId, RouteEntry>,
    pub(crate) expires: Timestamp,
}

impl NeighborEntry {
    pub(crate) fn new(expires: Timestamp) -> Self {
        Self {
            routes: BTreeMap::new(),
            expires,
        }
    }

    /// Absolute time at which this neighbor is considered silent.
    #[must_use]
    pub fn expires(&self) -> Timestamp {
        self.expires
    }

    /// Expired once `now` reaches the neighbor's expiry.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires
    }

    /// Path advertised for `destination`, if any.
    #[must_use]
    pub fn path(&self, destination: NodeId) -> Option<&Path> {
        self.routes.get(&destination).map(|r| &r.path)
    }

    /// Full route entry for `destination`, including its own expiry.
    #[must_use]
    pub fn route(&self, destination: NodeId) -> Option<&RouteEntry> {
        self.routes.get(&destination)
    }

    /// Iterate `(destination, path)` pairs in ascending destination order.
    pub fn paths(&self) -> impl Iterator<Item = (NodeId, &Path)> {
        self.routes.iter().map(|(dest, r)| (*dest, &r.path))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Result of storing a record that passed loop prevention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// Destination was not known from this neighbor.
    Inserted,
    /// Destination was known with a different path; path replaced.
    Updated,
    /// Same path as before; only the expiry moved.
    Refreshed,
}

impl UpsertOutcome {
    /// Whether the store content changed.
    #[must_use]
    pub fn is_change(&self) -> bool {
        !matches!(self, UpsertOutcome::Refreshed)
    }
}

/// Result of offering a received record to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnOutcome {
    /// The record was admitted and stored.
    Stored(UpsertOutcome),
    /// The record failed loop prevention; any previous path from the same
    /// neighbor for the same destination was withdrawn.
    Withdrawn { reason: RejectReason, removed: bool },
}

/// What a single expiry pass removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Eviction {
    /// Neighbors removed entirely, ascending.
    pub neighbors: Vec<NodeId>,
    /// Total stored routes dropped, whether individually or with their neighbor.
    pub routes: usize,
}

impl Eviction {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty() && self.routes == 0
    }
}
