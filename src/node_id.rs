//! Lightweight unique identifier for nodes within a [`SolutionTree`](crate::tree::SolutionTree).
//!
//! Every node installed into a tree is assigned a sequential `NodeId`. These
//! are opaque handles -- only the planner and tree arena inspect them
//! directly. They're small, `Copy`, and hashable, so they can be used
//! efficiently as keys when snapshotting or traversing a plan.

/// Unique numeric identifier for a node in a [`SolutionTree`](crate::tree::SolutionTree).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, serde::Serialize, serde::Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Create a new `NodeId` (used internally by the tree arena).
    pub(crate) fn new(v: u64) -> Self {
        Self(v)
    }

    /// Return the underlying numeric value.
    ///
    /// Useful mainly for debugging, logging, or display.
    #[must_use]
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
