//! Shortest-path recomputation and its cache.

use pathvec_core::types::NodeId;

use super::table::ShortestPathTable;
use crate::advert::AdvertisementStore;

/// Rebuild the shortest-path table for node `self_id` from `store`.
///
/// Each stored `(neighbor, destination, path)` yields the candidate
/// `[neighbor] ++ path`. Per destination the candidate with the fewest hops
/// wins; equal hop counts go to the lowest neighbor id, independent of
/// enumeration order. `self_id` never appears as a destination.
pub fn recompute(store: &AdvertisementStore, self_id: NodeId) -> ShortestPathTable {
    let mut table = ShortestPathTable::new();
    for (neighbor, destination, path) in store.all_paths() {
        if destination == self_id {
            continue;
        }
        let hops = path.hops() + 1;
        if let Some(best) = table.get(destination) {
            let incumbent = (best.hops(), best.first().unwrap_or(neighbor));
            if incumbent <= (hops, neighbor) {
                continue;
            }
        }
        table.insert(destination, path.prepend(neighbor));
    }
    table
}

/// Cached shortest-path table with explicit invalidation.
///
/// [`ShortestPathEngine::table`] is the only way to read the table: it
/// rebuilds when the store's dirty flag is set and clears the flag in the
/// same call, so a caller never observes a cleared flag alongside a stale
/// table.
#[must_use]
pub struct ShortestPathEngine {
    self_id: NodeId,
    table: ShortestPathTable,
    recomputations: u64,
}

impl ShortestPathEngine {
    pub fn new(self_id: NodeId) -> Self {
        Self {
            self_id,
            table: ShortestPathTable::new(),
            recomputations: 0,
        }
    }

    /// Current table, rebuilt first if `store` changed since the last call.
    pub fn table(&mut self, store: &mut AdvertisementStore) -> &ShortestPathTable {
        if store.take_dirty() {
            self.table = recompute(store, self.self_id);
            self.recomputations += 1;
            tracing::debug!(
                node = %self.self_id,
                destinations = self.table.len(),
                stored = store.route_count(),
                "recomputed shortest paths"
            );
        }
        &self.table
    }

    /// Number of rebuilds performed so far.
    #[must_use]
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}
