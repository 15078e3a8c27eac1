use std::collections::BTreeSet;

use crate::reference::NodeId;

/// Nodes sharing one depth of a diagram.
///
/// Membership is a set; iteration follows handle order, which keeps
/// reduction and propagation deterministic.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct Layer {
    nodes: BTreeSet<NodeId>,
}

impl Layer {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    pub(crate) fn insert(&mut self, node: NodeId) -> bool {
        self.nodes.insert(node)
    }

    pub(crate) fn remove(&mut self, node: NodeId) -> bool {
        self.nodes.remove(&node)
    }
}
