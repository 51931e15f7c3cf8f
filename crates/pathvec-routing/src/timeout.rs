//! Staleness sweep over the advertisement store.
//!
//! Hosts call [`TimeoutManager::sweep`] after every received packet and on
//! every send tick, so a neighbor that goes quiet is aged out even when
//! nothing else arrives.

use pathvec_core::types::Timestamp;

use crate::advert::{AdvertisementStore, Eviction};

/// Runs expiry passes and keeps running totals for diagnostics.
#[derive(Debug, Default)]
pub struct TimeoutManager {
    sweeps: u64,
    evicted_neighbors: u64,
    expired_routes: u64,
}

impl TimeoutManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evict everything in `store` that is stale at `now`.
    pub fn sweep(&mut self, store: &mut AdvertisementStore, now: Timestamp) -> Eviction {
        let eviction = store.expire(now);
        self.sweeps += 1;
        self.evicted_neighbors += eviction.neighbors.len() as u64;
        self.expired_routes += eviction.routes as u64;

        for neighbor in &eviction.neighbors {
            tracing::debug!(%neighbor, %now, "neighbor timed out");
        }
        if eviction.routes > 0 {
            tracing::debug!(routes = eviction.routes, %now, "expired stored routes");
        }
        eviction
    }

    #[must_use]
    pub fn sweeps(&self) -> u64 {
        self.sweeps
    }

    #[must_use]
    pub fn evicted_neighbors(&self) -> u64 {
        self.evicted_neighbors
    }

    #[must_use]
    pub fn expired_routes(&self) -> u64 {
        self.expired_routes
    }
}
