//! Types exchanged between a protocol node and its host.

use std::fmt;

use pathvec_core::error::CodecError;
use pathvec_core::types::{NodeId, Timestamp};
use pathvec_routing::advert::UpsertOutcome;
use pathvec_routing::filter::RejectReason;

/// One transport endpoint of a node, i.e. one link to one neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EndpointId(pub u32);

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ep{}", self.0)
    }
}

/// Handle to one scheduled send. Never reused within a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerToken(pub u64);

/// Lifecycle state of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NodeState {
    #[default]
    Stopped,
    Running,
}

/// Work the host must carry out on behalf of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeAction {
    /// Send `raw` over `endpoint`. Best effort, no acknowledgment.
    Transmit { endpoint: EndpointId, raw: Vec<u8> },
    /// Call [`crate::ProtocolNode::on_tick`] with `token` at time `at`.
    ScheduleSend { token: TimerToken, at: Timestamp },
    /// The send scheduled under `token` must not fire.
    CancelSend { token: TimerToken },
}

/// Why an inbound packet was discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// The datagram did not decode.
    Codec(CodecError),
    /// The datagram carries this node's own id as sender.
    OwnPacket,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::Codec(e) => write!(f, "{e}"),
            DropReason::OwnPacket => write!(f, "packet carries own node id"),
        }
    }
}

/// What a node did with one inbound packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketOutcome {
    /// The record passed loop prevention and was stored.
    Stored {
        neighbor: NodeId,
        outcome: UpsertOutcome,
    },
    /// The record failed loop prevention; `removed` tells whether an
    /// earlier path from the same neighbor was withdrawn.
    Withdrawn {
        neighbor: NodeId,
        reason: RejectReason,
        removed: bool,
    },
    /// The packet was discarded before reaching the store.
    Dropped(DropReason),
    /// The node is stopped; nothing was processed.
    Ignored,
}
