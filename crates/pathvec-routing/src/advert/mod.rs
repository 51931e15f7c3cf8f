//! Per-neighbor advertisement storage.
//!
//! Tracks every path each neighbor has advertised, the expiry governing
//! those paths, and whether anything changed since the shortest-path table
//! was last rebuilt.

pub mod store;
pub mod types;

pub use store::AdvertisementStore;
pub use types::{Eviction, ExpiryScope, LearnOutcome, NeighborEntry, RouteEntry, UpsertOutcome};
