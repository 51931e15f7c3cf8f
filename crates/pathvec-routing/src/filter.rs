//! Loop prevention applied to every received record before it is stored.

use pathvec_core::types::{NodeId, PathRecord};

/// Why a record was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The record advertises a route to the receiving node itself.
    SelfDestination,
    /// The receiving node already lies on the advertised path.
    SelfInPath,
}

/// Decision for one received record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accept,
    Reject(RejectReason),
}

/// Decide whether `record` may be stored by node `self_id`.
#[must_use]
pub fn admit(self_id: NodeId, record: &PathRecord) -> Admission {
    if record.destination == self_id {
        Admission::Reject(RejectReason::SelfDestination)
    } else if record.path.contains(self_id) {
        Admission::Reject(RejectReason::SelfInPath)
    } else {
        Admission::Accept
    }
}
