use std::fmt::{Display, Formatter};

use crate::arena::Handle;

/// Handle to a pooled [`Node`][crate::node::Node].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(Handle);

impl NodeId {
    pub(crate) const fn new(handle: Handle) -> Self {
        Self(handle)
    }

    /// Return the underlying arena handle.
    pub const fn handle(self) -> Handle {
        self.0
    }

    /// Return the slot index of the node.
    pub const fn index(self) -> usize {
        self.0.index()
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Handle to a pooled [`Diagram`][crate::mdd::Diagram].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DiagramId(Handle);

impl DiagramId {
    pub(crate) const fn new(handle: Handle) -> Self {
        Self(handle)
    }

    pub const fn handle(self) -> Handle {
        self.0
    }
}

impl Display for DiagramId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "d{}", self.0)
    }
}
