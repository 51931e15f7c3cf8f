//! Advertisement store keyed by `(neighbor, destination)`.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::time::Duration;

use pathvec_core::types::{NodeId, Path, PathRecord, Timestamp};

use super::types::{
    Eviction, ExpiryScope, LearnOutcome, NeighborEntry, RouteEntry, UpsertOutcome,
};
use crate::filter::{Admission, admit};

/// Paths heard from each neighbor, with expiry and change tracking.
///
/// The dirty flag is raised by every mutation that changes stored paths and
/// is cleared only by [`crate::shortest::ShortestPathEngine::table`].
#[must_use]
pub struct AdvertisementStore {
    neighbors: BTreeMap<NodeId, NeighborEntry>,
    timeout: Duration,
    scope: ExpiryScope,
    dirty: bool,
}

impl AdvertisementStore {
    pub fn new(timeout: Duration, scope: ExpiryScope) -> Self {
        Self {
            neighbors: BTreeMap::new(),
            timeout,
            scope,
            dirty: false,
        }
    }

    /// Store with per-neighbor expiry.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(timeout, ExpiryScope::Neighbor)
    }

    /// Apply loop prevention to `record` and store or withdraw accordingly.
    ///
    /// Any record from a known neighbor refreshes that neighbor's expiry,
    /// including one that is rejected.
    pub fn learn(
        &mut self,
        self_id: NodeId,
        neighbor: NodeId,
        record: PathRecord,
        now: Timestamp,
    ) -> LearnOutcome {
        match admit(self_id, &record) {
            Admission::Accept => LearnOutcome::Stored(self.upsert(neighbor, record, now)),
            Admission::Reject(reason) => {
                self.touch(neighbor, now);
                let removed = self.withdraw(neighbor, record.destination);
                LearnOutcome::Withdrawn { reason, removed }
            }
        }
    }

    /// Insert or update the path `neighbor` advertises for `record.destination`.
    ///
    /// Paths are compared position by position. An identical path only
    /// refreshes expiry and leaves the dirty flag alone.
    pub fn upsert(&mut self, neighbor: NodeId, record: PathRecord, now: Timestamp) -> UpsertOutcome {
        let expires = now + self.timeout;
        let entry = self
            .neighbors
            .entry(neighbor)
            .or_insert_with(|| NeighborEntry::new(expires));
        entry.expires = expires;

        let outcome = match entry.routes.entry(record.destination) {
            Entry::Vacant(slot) => {
                slot.insert(RouteEntry {
                    path: record.path,
                    expires,
                });
                UpsertOutcome::Inserted
            }
            Entry::Occupied(mut slot) => {
                let route = slot.get_mut();
                route.expires = expires;
                if route.path == record.path {
                    UpsertOutcome::Refreshed
                } else {
                    route.path = record.path;
                    UpsertOutcome::Updated
                }
            }
        };

        if outcome.is_change() {
            self.dirty = true;
            tracing::debug!(
                %neighbor,
                destination = %record.destination,
                ?outcome,
                "advertisement changed"
            );
        }
        outcome
    }

    /// Remove the path `neighbor` advertised for `destination`.
    ///
    /// Returns `true` if a path was removed. Absent neighbors and
    /// destinations are a no-op. The neighbor entry itself is kept even when
    /// its last path goes, so its liveness is still tracked.
    pub fn withdraw(&mut self, neighbor: NodeId, destination: NodeId) -> bool {
        let removed = self
            .neighbors
            .get_mut(&neighbor)
            .is_some_and(|entry| entry.routes.remove(&destination).is_some());
        if removed {
            self.dirty = true;
            tracing::debug!(%neighbor, %destination, "advertisement withdrawn");
        }
        removed
    }

    /// Push a known neighbor's expiry out to `now + timeout`.
    ///
    /// Returns `false` if the neighbor is unknown.
    pub fn touch(&mut self, neighbor: NodeId, now: Timestamp) -> bool {
        match self.neighbors.get_mut(&neighbor) {
            Some(entry) => {
                entry.expires = now + self.timeout;
                true
            }
            None => false,
        }
    }

    /// Remove everything whose expiry is at or before `now`.
    pub fn expire(&mut self, now: Timestamp) -> Eviction {
        let mut eviction = Eviction::default();

        match self.scope {
            ExpiryScope::Neighbor => {
                self.neighbors.retain(|id, entry| {
                    if entry.is_expired(now) {
                        eviction.neighbors.push(*id);
                        eviction.routes += entry.len();
                        false
                    } else {
                        true
                    }
                });
            }
            ExpiryScope::Route => {
                self.neighbors.retain(|id, entry| {
                    let before = entry.routes.len();
                    entry.routes.retain(|_, route| !route.is_expired(now));
                    eviction.routes += before - entry.routes.len();
                    if entry.routes.is_empty() && entry.is_expired(now) {
                        eviction.neighbors.push(*id);
                        false
                    } else {
                        true
                    }
                });
            }
        }

        if !eviction.is_empty() {
            self.dirty = true;
        }
        eviction
    }

    /// Enumerate `(neighbor, destination, path)` for every stored path.
    ///
    /// Order is ascending by neighbor, then destination.
    pub fn all_paths(&self) -> impl Iterator<Item = (NodeId, NodeId, &Path)> {
        self.neighbors.iter().flat_map(|(neighbor, entry)| {
            entry
                .paths()
                .map(move |(destination, path)| (*neighbor, destination, path))
        })
    }

    /// Entry for `neighbor`, if one is stored.
    #[must_use]
    pub fn neighbor(&self, neighbor: NodeId) -> Option<&NeighborEntry> {
        self.neighbors.get(&neighbor)
    }

    /// Path `neighbor` advertised for `destination`.
    #[must_use]
    pub fn path(&self, neighbor: NodeId, destination: NodeId) -> Option<&Path> {
        self.neighbors.get(&neighbor)?.path(destination)
    }

    /// Whether the `(neighbor, destination)` pair is stored.
    #[must_use]
    pub fn contains(&self, neighbor: NodeId, destination: NodeId) -> bool {
        self.path(neighbor, destination).is_some()
    }

    /// Known neighbor ids, ascending.
    pub fn neighbors(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.neighbors.keys().copied()
    }

    /// Number of neighbor entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Number of stored `(neighbor, destination)` paths.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.neighbors.values().map(NeighborEntry::len).sum()
    }

    /// Whether stored paths changed since the last shortest-path rebuild.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn scope(&self) -> ExpiryScope {
        self.scope
    }

    /// Clear the dirty flag, returning its previous value.
    pub(crate) fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_record() -> impl Strategy<Value = (u32, u32, Vec<u32>)> {
        (0..8u32, 0..8u32, proptest::collection::vec(0..8u32, 0..5))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn store_never_holds_looping_routes(
            self_id in 0..8u32,
            records in proptest::collection::vec(arb_record(), 1..40),
        ) {
            let me = NodeId(self_id);
            let mut s = AdvertisementStore::with_timeout(Duration::from_secs(60));
            for (i, (neighbor, dest, hops)) in records.into_iter().enumerate() {
                let record = PathRecord::new(
                    NodeId(dest),
                    hops.into_iter().map(NodeId).collect::<Path>(),
                );
                s.learn(me, NodeId(neighbor), record, Timestamp::from_secs(i as u64));
            }
            for (_, dest, path) in s.all_paths() {
                prop_assert_ne!(dest, me);
                prop_assert!(!path.contains(me));
            }
        }

        #[test]
        fn repeated_upsert_is_idempotent(
            neighbor in any::<u32>(),
            dest in any::<u32>(),
            hops in proptest::collection::vec(any::<u32>(), 0..10),
            t0 in 0..1_000u64,
            dt in 0..1_000u64,
        ) {
            let mut s = AdvertisementStore::with_timeout(Duration::from_secs(60));
            let record = PathRecord::new(
                NodeId(dest),
                hops.into_iter().map(NodeId).collect::<Path>(),
            );
            s.upsert(NodeId(neighbor), record.clone(), Timestamp::from_secs(t0));
            s.take_dirty();
            let outcome = s.upsert(NodeId(neighbor), record, Timestamp::from_secs(t0 + dt));
            prop_assert_eq!(outcome, UpsertOutcome::Refreshed);
            prop_assert!(!s.is_dirty());
            prop_assert_eq!(
                s.neighbor(NodeId(neighbor)).unwrap().expires(),
                Timestamp::from_secs(t0 + dt + 60)
            );
        }
    }
}
