//! Identifier, path, and time types shared by every layer of the engine.

use std::fmt;
use std::ops::Add;
use std::time::Duration;

/// Identifier of a node, unique within the network.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl From<u32> for NodeId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Ordered hop sequence toward a destination.
///
/// In a received record the sequence excludes both the advertiser and the
/// receiver. In the local shortest-path table it starts with the neighbor
/// the route was learned from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<NodeId>);

impl Path {
    /// The empty path.
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Number of hops in the path.
    #[must_use]
    pub fn hops(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `node` appears anywhere in the path.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.0.contains(&node)
    }

    /// First hop, if any.
    #[must_use]
    pub fn first(&self) -> Option<NodeId> {
        self.0.first().copied()
    }

    /// Return a new path with `node` in front of the existing hops.
    #[must_use]
    pub fn prepend(&self, node: NodeId) -> Path {
        let mut hops = Vec::with_capacity(self.0.len() + 1);
        hops.push(node);
        hops.extend_from_slice(&self.0);
        Path(hops)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeId> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<NodeId> {
        self.0
    }
}

impl From<Vec<NodeId>> for Path {
    fn from(hops: Vec<NodeId>) -> Self {
        Self(hops)
    }
}

impl FromIterator<NodeId> for Path {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl AsRef<[NodeId]> for Path {
    fn as_ref(&self) -> &[NodeId] {
        &self.0
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, hop) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{hop}")?;
        }
        write!(f, "]")
    }
}

/// One advertised route: a destination and the hops leading to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathRecord {
    pub destination: NodeId,
    pub path: Path,
}

impl PathRecord {
    pub fn new(destination: NodeId, path: impl Into<Path>) -> Self {
        Self {
            destination,
            path: path.into(),
        }
    }
}

/// Point in engine time, in milliseconds since a host-chosen epoch.
///
/// The engine never reads a clock; hosts pass the current `Timestamp` into
/// every entry point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Add a duration, clamping at the maximum representable time.
    pub fn saturating_add(self, d: Duration) -> Self {
        let ms = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(ms))
    }

    /// Time elapsed since `earlier`, or zero if `earlier` is in the future.
    pub fn saturating_duration_since(self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        self.saturating_add(rhs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}s", self.0 / 1000, self.0 % 1000)
    }
}
