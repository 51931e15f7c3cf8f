//! Protocol node orchestration for the path-vector routing engine.
//!
//! A [`ProtocolNode`] owns one advertisement store, one shortest-path
//! engine, and the node's transport endpoints. It is a sans-IO state
//! machine: hosts feed it ticks and packets and carry out the
//! [`NodeAction`]s it returns. [`sim`] is a deterministic in-memory host.

pub mod action;
pub mod config;
pub mod error;
pub mod logging;
pub mod node;
pub mod sim;

pub use action::{DropReason, EndpointId, NodeAction, NodeState, PacketOutcome, TimerToken};
pub use config::NodeConfig;
pub use error::NodeError;
pub use node::{NodeStats, ProtocolNode};
