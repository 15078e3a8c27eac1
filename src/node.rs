use std::collections::BTreeMap;

use crate::arena::Recycle;
use crate::property::PropertyMap;
use crate::reference::NodeId;
use crate::types::{Cost, Label};

/// Node variant. Selects which extension a node carries besides its arcs.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum NodeKind {
    #[default]
    Plain,
    Cost,
    Property,
}

/// Outgoing arcs of a node: label -> child. Labels are unique; inserting an
/// existing label overwrites its child.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct OutArcs(BTreeMap<Label, NodeId>);

impl OutArcs {
    pub fn get(&self, label: Label) -> Option<NodeId> {
        self.0.get(&label).copied()
    }

    pub fn contains(&self, label: Label) -> bool {
        self.0.contains_key(&label)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(label, child)` pairs in ascending label order.
    pub fn iter(&self) -> impl Iterator<Item = (Label, NodeId)> + '_ {
        self.0.iter().map(|(&label, &child)| (label, child))
    }

    pub fn labels(&self) -> impl Iterator<Item = Label> + '_ {
        self.0.keys().copied()
    }

    pub(crate) fn insert(&mut self, label: Label, child: NodeId) -> Option<NodeId> {
        self.0.insert(label, child)
    }

    pub(crate) fn remove(&mut self, label: Label) -> Option<NodeId> {
        self.0.remove(&label)
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear()
    }
}

/// Mirrored incoming arcs of a cost node: `(parent, label) -> cost`.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct InArcs(BTreeMap<(NodeId, Label), Cost>);

impl InArcs {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(parent, label, cost)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Label, Cost)> + '_ {
        self.0
            .iter()
            .map(|(&(parent, label), &cost)| (parent, label, cost))
    }

    pub(crate) fn insert(&mut self, parent: NodeId, label: Label, cost: Cost) {
        self.0.insert((parent, label), cost);
    }

    pub(crate) fn remove(&mut self, parent: NodeId, label: Label) -> Option<Cost> {
        self.0.remove(&(parent, label))
    }
}

#[derive(Debug, Default)]
pub(crate) struct CostArcs {
    pub(crate) costs: BTreeMap<Label, Cost>,
    pub(crate) parents: InArcs,
}

#[derive(Debug, Default)]
enum Extension {
    #[default]
    Plain,
    Cost(CostArcs),
    Property(PropertyMap),
}

impl Extension {
    fn new(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Plain => Extension::Plain,
            NodeKind::Cost => Extension::Cost(CostArcs::default()),
            NodeKind::Property => Extension::Property(PropertyMap::new()),
        }
    }
}

#[derive(Debug, Default)]
pub struct Node {
    arcs: OutArcs,
    ext: Extension,
}

impl Recycle for Node {
    type Kind = NodeKind;

    fn prepare(&mut self, kind: NodeKind) {
        self.arcs.clear();
        self.ext = Extension::new(kind);
    }
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self.ext {
            Extension::Plain => NodeKind::Plain,
            Extension::Cost(_) => NodeKind::Cost,
            Extension::Property(_) => NodeKind::Property,
        }
    }

    pub fn arcs(&self) -> &OutArcs {
        &self.arcs
    }

    pub(crate) fn arcs_mut(&mut self) -> &mut OutArcs {
        &mut self.arcs
    }

    pub fn child(&self, label: Label) -> Option<NodeId> {
        self.arcs.get(label)
    }

    /// Cost of the arc with the given label, for cost nodes only.
    pub fn cost(&self, label: Label) -> Option<Cost> {
        match &self.ext {
            Extension::Cost(c) => c.costs.get(&label).copied(),
            _ => None,
        }
    }

    pub fn in_arcs(&self) -> Option<&InArcs> {
        match &self.ext {
            Extension::Cost(c) => Some(&c.parents),
            _ => None,
        }
    }

    pub(crate) fn cost_arcs_mut(&mut self) -> Option<&mut CostArcs> {
        match &mut self.ext {
            Extension::Cost(c) => Some(c),
            _ => None,
        }
    }

    pub fn properties(&self) -> Option<&PropertyMap> {
        match &self.ext {
            Extension::Property(p) => Some(p),
            _ => None,
        }
    }

    pub(crate) fn properties_mut(&mut self) -> Option<&mut PropertyMap> {
        match &mut self.ext {
            Extension::Property(p) => Some(p),
            _ => None,
        }
    }
}
