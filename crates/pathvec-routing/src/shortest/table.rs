//! Best-path-per-destination table.

use std::collections::BTreeMap;

use pathvec_core::types::{NodeId, Path, PathRecord};

/// One best path per destination, each starting with the neighbor it was
/// learned from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use]
pub struct ShortestPathTable {
    routes: BTreeMap<NodeId, Path>,
}

impl ShortestPathTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, destination: NodeId, path: Path) {
        self.routes.insert(destination, path);
    }

    /// Best known path to `destination`.
    #[must_use]
    pub fn get(&self, destination: NodeId) -> Option<&Path> {
        self.routes.get(&destination)
    }

    /// Neighbor through which `destination` is reached.
    #[must_use]
    pub fn next_hop(&self, destination: NodeId) -> Option<NodeId> {
        self.routes.get(&destination).and_then(Path::first)
    }

    /// Hop count of the best path to `destination`.
    #[must_use]
    pub fn hops_to(&self, destination: NodeId) -> Option<usize> {
        self.routes.get(&destination).map(Path::hops)
    }

    #[must_use]
    pub fn contains(&self, destination: NodeId) -> bool {
        self.routes.contains_key(&destination)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterate `(destination, path)` in ascending destination order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Path)> {
        self.routes.iter().map(|(d, p)| (*d, p))
    }

    /// The table as the records a node advertises.
    pub fn records(&self) -> impl Iterator<Item = PathRecord> + '_ {
        self.routes
            .iter()
            .map(|(destination, path)| PathRecord::new(*destination, path.clone()))
    }
}
