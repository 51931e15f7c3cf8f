//! Routing state for the path-vector engine.
//!
//! This crate holds everything a node learns from its neighbors: the
//! per-neighbor advertisement store, the loop-prevention filter applied
//! before anything is stored, the shortest-path aggregation that turns the
//! store into the node's own advertisement, and the timeout sweep that ages
//! out silent neighbors.

pub mod advert;
pub mod filter;
pub mod shortest;
pub mod timeout;

pub use advert::{
    AdvertisementStore, Eviction, ExpiryScope, LearnOutcome, NeighborEntry, UpsertOutcome,
};
pub use filter::{Admission, RejectReason, admit};
pub use shortest::{ShortestPathEngine, ShortestPathTable, recompute};
pub use timeout::TimeoutManager;
