//! Shortest-path aggregation over the advertisement store.
//!
//! Produces one best path per destination, which is both the node's routing
//! view and the payload it advertises to its neighbors.

pub mod engine;
pub mod table;

pub use engine::{ShortestPathEngine, recompute};
pub use table::ShortestPathTable;
