//! The diagram manager.
//!
//! [`Mdd`] owns two arenas: one for nodes and one for diagrams. Diagrams only
//! hold [`NodeId`] handles to their root, terminal and layer members, and nodes
//! only hold handles to each other, so there are no ownership cycles. Every
//! operation goes through the manager.
//!
//! # Layout
//!
//! A diagram of size `n` has `n` layers. Layer 0 holds the root, layer `n - 1`
//! holds the terminal node (`tt`), and every arc goes from layer `i` to layer
//! `i + 1`. A root-to-`tt` path therefore carries exactly `n - 1` labels.
//!
//! # Example
//!
//! ```
//! use mdd_rs::mdd::{DiagramKind, Mdd};
//!
//! let mut mdd = Mdd::new();
//! let d = mdd.create_diagram(DiagramKind::Plain);
//! mdd.set_size(d, 4).unwrap();
//! mdd.add_path(d, &[0, 1, 2]).unwrap();
//! mdd.add_path(d, &[1, 1, 2]).unwrap();
//! mdd.reduce(d).unwrap();
//!
//! assert_eq!(mdd.count_paths(d).unwrap(), 2u32.into());
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;

use log::debug;
use num_bigint::BigUint;

use crate::arena::{Arena, Recycle};
use crate::error::{MddError, Result};
use crate::layer::Layer;
use crate::node::{Node, NodeKind, OutArcs};
use crate::reference::{DiagramId, NodeId};
use crate::types::{Cost, Label};

/// Diagram variant. Fixes the kind of every node the diagram creates.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DiagramKind {
    #[default]
    Plain,
    Cost,
    Property,
}

impl DiagramKind {
    pub fn node_kind(self) -> NodeKind {
        match self {
            DiagramKind::Plain => NodeKind::Plain,
            DiagramKind::Cost => NodeKind::Cost,
            DiagramKind::Property => NodeKind::Property,
        }
    }
}

/// Manager configuration.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MddConfig {
    /// Initial capacity of the node arena.
    pub node_capacity: usize,
    /// Initial size (`2^bits`) of the memo table used by intersection.
    pub cache_bits: usize,
}

impl Default for MddConfig {
    fn default() -> Self {
        Self {
            node_capacity: 1 << 10,
            cache_bits: 14,
        }
    }
}

impl MddConfig {
    pub fn with_node_capacity(mut self, node_capacity: usize) -> Self {
        self.node_capacity = node_capacity;
        self
    }

    pub fn with_cache_bits(mut self, cache_bits: usize) -> Self {
        assert!(cache_bits <= 31, "Cache bits should be in the range 0..=31");
        self.cache_bits = cache_bits;
        self
    }
}

/// A layered diagram: root, terminal and the ordered sequence of layers.
#[derive(Debug, Default)]
pub struct Diagram {
    kind: DiagramKind,
    root: Option<NodeId>,
    tt: Option<NodeId>,
    layers: Vec<Layer>,
}

impl Recycle for Diagram {
    type Kind = DiagramKind;

    fn prepare(&mut self, kind: DiagramKind) {
        self.kind = kind;
        self.root = None;
        self.tt = None;
        self.layers.clear();
    }
}

impl Diagram {
    pub fn kind(&self) -> DiagramKind {
        self.kind
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn tt(&self) -> Option<NodeId> {
        self.tt
    }

    /// Number of layers (0 until the size is set).
    pub fn size(&self) -> usize {
        self.layers.len()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }
}

pub struct Mdd {
    nodes: Arena<Node>,
    diagrams: Arena<Diagram>,
    config: MddConfig,
}

impl Mdd {
    pub fn new() -> Self {
        Self::with_config(MddConfig::default())
    }

    pub fn with_config(config: MddConfig) -> Self {
        Self {
            nodes: Arena::with_capacity(config.node_capacity),
            diagrams: Arena::new(),
            config,
        }
    }

    pub fn config(&self) -> &MddConfig {
        &self.config
    }
}

impl Default for Mdd {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Mdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mdd")
            .field("nodes", &self.nodes.len())
            .field("node_slots", &self.nodes.slots())
            .field("diagrams", &self.diagrams.len())
            .finish()
    }
}

// Pool management.
impl Mdd {
    /// Number of live nodes across all diagrams.
    pub fn live_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live diagrams.
    pub fn live_diagrams(&self) -> usize {
        self.diagrams.len()
    }

    /// Allocate a detached node of the given kind.
    pub fn allocate_node(&mut self, kind: NodeKind) -> NodeId {
        NodeId::new(self.nodes.allocate(kind))
    }

    /// Allocate a detached node of the diagram's node kind.
    pub fn new_node(&mut self, d: DiagramId) -> Result<NodeId> {
        let kind = self.kind(d)?.node_kind();
        Ok(self.allocate_node(kind))
    }

    /// Release a node. Parents and children are not touched.
    pub fn free_node(&mut self, node: NodeId) -> Result<()> {
        self.nodes.free(node.handle())
    }

    /// Create a new diagram together with its root node.
    pub fn create_diagram(&mut self, kind: DiagramKind) -> DiagramId {
        let root = self.allocate_node(kind.node_kind());
        let handle = self.diagrams.allocate(kind);
        let d = DiagramId::new(handle);
        if let Ok(diagram) = self.diagrams.get_mut(handle) {
            diagram.root = Some(root);
        }
        debug!("create_diagram(kind = {:?}) -> {} with root {}", kind, d, root);
        d
    }

    /// Release a diagram and every node it holds.
    pub fn free_diagram(&mut self, d: DiagramId) -> Result<()> {
        let diagram = self.diagram(d)?;
        let mut members: BTreeSet<NodeId> = diagram.layers.iter().flat_map(|l| l.iter()).collect();
        members.extend(diagram.root);
        members.extend(diagram.tt);

        let mut freed = 0;
        for node in members {
            if self.nodes.contains(node.handle()) {
                self.free_node(node)?;
                freed += 1;
            }
        }
        self.diagrams.free(d.handle())?;
        debug!("free_diagram(d = {}): released {} nodes", d, freed);
        Ok(())
    }

    pub fn diagram(&self, d: DiagramId) -> Result<&Diagram> {
        self.diagrams.get(d.handle())
    }

    fn diagram_mut(&mut self, d: DiagramId) -> Result<&mut Diagram> {
        self.diagrams.get_mut(d.handle())
    }

    pub fn node(&self, node: NodeId) -> Result<&Node> {
        self.nodes.get(node.handle())
    }

    pub(crate) fn node_mut(&mut self, node: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(node.handle())
    }

    pub fn children(&self, node: NodeId) -> Result<&OutArcs> {
        Ok(self.node(node)?.arcs())
    }
}

// Diagram accessors.
impl Mdd {
    pub fn kind(&self, d: DiagramId) -> Result<DiagramKind> {
        Ok(self.diagram(d)?.kind)
    }

    /// Number of layers. Fails if the size was never set.
    pub fn size(&self, d: DiagramId) -> Result<usize> {
        match self.diagram(d)?.size() {
            0 => Err(MddError::SizeNotSet),
            n => Ok(n),
        }
    }

    pub fn root(&self, d: DiagramId) -> Result<NodeId> {
        self.diagram(d)?
            .root
            .ok_or(MddError::StaleHandle(d.handle()))
    }

    /// The terminal node. Exists once the size is set.
    pub fn tt(&self, d: DiagramId) -> Result<NodeId> {
        self.diagram(d)?.tt.ok_or(MddError::SizeNotSet)
    }

    pub fn layer(&self, d: DiagramId, layer: usize) -> Result<&Layer> {
        let size = self.size(d)?;
        self.diagram(d)?
            .layers
            .get(layer)
            .ok_or(MddError::LayerOutOfRange { layer, size })
    }

    /// Nodes of a layer, collected so the caller may mutate the manager.
    pub(crate) fn layer_nodes(&self, d: DiagramId, layer: usize) -> Result<Vec<NodeId>> {
        Ok(self.layer(d, layer)?.iter().collect())
    }

    pub fn node_count(&self, d: DiagramId) -> Result<usize> {
        Ok(self.diagram(d)?.layers.iter().map(Layer::len).sum())
    }

    pub fn arc_count(&self, d: DiagramId) -> Result<usize> {
        let diagram = self.diagram(d)?;
        let mut count = 0;
        for layer in &diagram.layers {
            for node in layer.iter() {
                count += self.node(node)?.arcs().len();
            }
        }
        Ok(count)
    }

    /// Number of accepted root-to-terminal paths.
    pub fn count_paths(&self, d: DiagramId) -> Result<BigUint> {
        let size = self.size(d)?;
        let tt = self.tt(d)?;
        let mut counts: HashMap<NodeId, BigUint> = HashMap::new();
        counts.insert(tt, BigUint::from(1u32));

        for level in (0..size - 1).rev() {
            for node in self.layer(d, level)?.iter() {
                let mut total = BigUint::default();
                for (_, child) in self.node(node)?.arcs().iter() {
                    if let Some(c) = counts.get(&child) {
                        total += c;
                    }
                }
                counts.insert(node, total);
            }
        }

        Ok(counts.remove(&self.root(d)?).unwrap_or_default())
    }
}

// Construction.
impl Mdd {
    /// Fix the number of layers.
    ///
    /// The first call places the root in layer 0 and creates the terminal in
    /// the last layer. Later calls move the terminal to the new last layer;
    /// growing keeps all existing layers, shrinking is only allowed when the
    /// dropped layers hold nothing but the terminal.
    pub fn set_size(&mut self, d: DiagramId, size: usize) -> Result<()> {
        if size < 2 {
            return Err(MddError::InvalidSize(size));
        }
        let diagram = self.diagram(d)?;
        let old_size = diagram.size();
        let (kind, root, tt) = (diagram.kind, diagram.root, diagram.tt);
        if size == old_size {
            return Ok(());
        }
        if size < old_size {
            let dropped = &diagram.layers[size - 1..];
            if dropped.iter().flat_map(|l| l.iter()).any(|n| Some(n) != tt) {
                return Err(MddError::ShrinkNonEmpty(size));
            }
        }
        debug!("set_size(d = {}, size = {} -> {})", d, old_size, size);

        let tt = match tt {
            Some(tt) => tt,
            None => self.allocate_node(kind.node_kind()),
        };
        let diagram = self.diagram_mut(d)?;
        if let Some(last) = diagram.layers.last_mut() {
            last.remove(tt);
        }
        diagram.layers.resize_with(size, Layer::default);
        if let (0, Some(root)) = (old_size, root) {
            diagram.layers[0].insert(root);
        }
        diagram.layers[size - 1].insert(tt);
        diagram.tt = Some(tt);
        Ok(())
    }

    /// Replace the root and return the previous one, now detached.
    ///
    /// The node kind must match the diagram kind: a cost diagram only accepts
    /// a cost node as its root.
    pub fn set_root(&mut self, d: DiagramId, node: NodeId) -> Result<NodeId> {
        let expected = self.kind(d)?.node_kind();
        let found = self.node(node)?.kind();
        if expected != found {
            return Err(MddError::RootKindMismatch { expected, found });
        }
        let old = self.root(d)?;
        let diagram = self.diagram_mut(d)?;
        diagram.root = Some(node);
        if let Some(top) = diagram.layers.first_mut() {
            top.remove(old);
            top.insert(node);
        }
        Ok(old)
    }

    /// Insert a node into a layer.
    pub fn add_node(&mut self, d: DiagramId, node: NodeId, layer: usize) -> Result<()> {
        let size = self.size(d)?;
        if layer >= size {
            return Err(MddError::LayerOutOfRange { layer, size });
        }
        self.node(node)?;
        self.diagram_mut(d)?.layers[layer].insert(node);
        Ok(())
    }

    /// Insert or overwrite the arc `source --label--> destination`.
    ///
    /// On a cost node this is an arc of cost 0.
    pub fn add_edge(&mut self, source: NodeId, label: Label, destination: NodeId) -> Result<()> {
        let cost = match self.node(source)?.kind() {
            NodeKind::Cost => Some(0),
            _ => None,
        };
        self.link(source, label, destination, cost)
    }

    /// Follow the `label` arc of `source`, creating a fresh node in `layer`
    /// and the arc to it if the arc does not exist yet.
    pub fn add_node_and_edge(
        &mut self,
        d: DiagramId,
        source: NodeId,
        label: Label,
        layer: usize,
    ) -> Result<NodeId> {
        if let Some(child) = self.node(source)?.child(label) {
            return Ok(child);
        }
        let child = self.new_node(d)?;
        self.add_node(d, child, layer)?;
        self.add_edge(source, label, child)?;
        Ok(child)
    }

    /// Add the path spelled by `labels` from the root to the terminal,
    /// reusing existing arcs along the way.
    pub fn add_path(&mut self, d: DiagramId, labels: &[Label]) -> Result<()> {
        self.add_path_with(d, labels.iter().map(|&label| (label, None)))
    }

    pub(crate) fn add_path_with(
        &mut self,
        d: DiagramId,
        steps: impl ExactSizeIterator<Item = (Label, Option<Cost>)>,
    ) -> Result<()> {
        let size = self.size(d)?;
        if steps.len() != size - 1 {
            return Err(MddError::PathLength {
                expected: size - 1,
                found: steps.len(),
            });
        }
        let tt = self.tt(d)?;
        let mut current = self.root(d)?;
        for (i, (label, cost)) in steps.enumerate() {
            let layer = i + 1;
            let next = if layer == size - 1 {
                tt
            } else {
                match self.node(current)?.child(label) {
                    Some(child) => child,
                    None => {
                        let child = self.new_node(d)?;
                        self.add_node(d, child, layer)?;
                        child
                    }
                }
            };
            match cost {
                Some(cost) => self.link(current, label, next, Some(cost))?,
                None if self.node(current)?.child(label) != Some(next) => {
                    self.add_edge(current, label, next)?
                }
                None => {}
            }
            current = next;
        }
        Ok(())
    }

    /// Set an arc, keeping the mirrored in-arcs of cost nodes consistent.
    pub(crate) fn link(
        &mut self,
        source: NodeId,
        label: Label,
        destination: NodeId,
        cost: Option<Cost>,
    ) -> Result<()> {
        let dest_kind = self.node(destination)?.kind();
        let node = self.node_mut(source)?;
        let is_cost = node.kind() == NodeKind::Cost;
        if cost.is_some() && !is_cost {
            return Err(MddError::NotACostNode(source));
        }
        if is_cost && dest_kind != NodeKind::Cost {
            return Err(MddError::NotACostNode(destination));
        }

        let old = node.arcs_mut().insert(label, destination);
        let Some(arcs) = node.cost_arcs_mut() else {
            return Ok(());
        };
        let cost = cost.unwrap_or(0);
        arcs.costs.insert(label, cost);

        if let Some(old) = old.filter(|&old| old != destination) {
            self.drop_in_arc(old, source, label);
        }
        if let Some(arcs) = self.node_mut(destination)?.cost_arcs_mut() {
            arcs.parents.insert(source, label, cost);
        }
        Ok(())
    }

    /// Remove the `label` arc of `source`, if any.
    pub(crate) fn unlink(&mut self, source: NodeId, label: Label) -> Result<Option<NodeId>> {
        let node = self.node_mut(source)?;
        let old = node.arcs_mut().remove(label);
        if let Some(arcs) = node.cost_arcs_mut() {
            arcs.costs.remove(&label);
        }
        if let Some(old) = old {
            self.drop_in_arc(old, source, label);
        }
        Ok(old)
    }

    /// Remove `(parent, label)` from the in-arcs of `child`. A child that is
    /// already freed is skipped.
    fn drop_in_arc(&mut self, child: NodeId, parent: NodeId, label: Label) {
        if let Ok(node) = self.node_mut(child) {
            if let Some(arcs) = node.cost_arcs_mut() {
                arcs.parents.remove(parent, label);
            }
        }
    }

    /// Take a node out of its layer, detach it from its children, and free it.
    pub(crate) fn discard_node(&mut self, d: DiagramId, layer: usize, node: NodeId) -> Result<()> {
        self.diagram_mut(d)?.layers[layer].remove(node);
        let arcs: Vec<(Label, NodeId)> = self.children(node)?.iter().collect();
        for (label, child) in arcs {
            self.drop_in_arc(child, node, label);
        }
        self.free_node(node)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_size_must_be_set() {
        let mut mdd = Mdd::new();
        let d = mdd.create_diagram(DiagramKind::Plain);
        assert_eq!(mdd.add_path(d, &[1, 2]), Err(MddError::SizeNotSet));
        assert_eq!(mdd.reduce(d), Err(MddError::SizeNotSet));
        assert_eq!(mdd.tt(d), Err(MddError::SizeNotSet));
        assert_eq!(mdd.set_size(d, 1), Err(MddError::InvalidSize(1)));
    }

    #[test]
    fn test_set_size_places_root_and_tt() {
        let mut mdd = Mdd::new();
        let d = mdd.create_diagram(DiagramKind::Plain);
        mdd.set_size(d, 3).unwrap();

        let root = mdd.root(d).unwrap();
        let tt = mdd.tt(d).unwrap();
        assert!(mdd.layer(d, 0).unwrap().contains(root));
        assert!(mdd.layer(d, 2).unwrap().contains(tt));
        assert!(mdd.layer(d, 1).unwrap().is_empty());
        assert_eq!(
            mdd.layer(d, 3).unwrap_err(),
            MddError::LayerOutOfRange { layer: 3, size: 3 }
        );
    }

    #[test]
    fn test_grow_keeps_layers() {
        let mut mdd = Mdd::new();
        let d = mdd.create_diagram(DiagramKind::Plain);
        mdd.set_size(d, 3).unwrap();
        let root = mdd.root(d).unwrap();
        let n = mdd.add_node_and_edge(d, root, 7, 1).unwrap();

        mdd.set_size(d, 5).unwrap();
        let tt = mdd.tt(d).unwrap();
        assert!(mdd.layer(d, 1).unwrap().contains(n));
        assert!(!mdd.layer(d, 2).unwrap().contains(tt));
        assert!(mdd.layer(d, 4).unwrap().contains(tt));

        assert_eq!(mdd.set_size(d, 2), Err(MddError::ShrinkNonEmpty(2)));
        mdd.set_size(d, 3).unwrap();
        assert!(mdd.layer(d, 2).unwrap().contains(tt));
    }

    #[test]
    fn test_add_path_shares_prefixes() {
        let mut mdd = Mdd::new();
        let d = mdd.create_diagram(DiagramKind::Plain);
        mdd.set_size(d, 4).unwrap();
        mdd.add_path(d, &[0, 1, 2]).unwrap();
        mdd.add_path(d, &[0, 2, 2]).unwrap();

        assert_eq!(mdd.layer(d, 1).unwrap().len(), 1);
        assert_eq!(mdd.layer(d, 2).unwrap().len(), 2);
        assert_eq!(mdd.node_count(d).unwrap(), 5);
        assert_eq!(mdd.arc_count(d).unwrap(), 5);
        assert_eq!(mdd.count_paths(d).unwrap(), BigUint::from(2u32));
    }

    #[test]
    fn test_add_path_length() {
        let mut mdd = Mdd::new();
        let d = mdd.create_diagram(DiagramKind::Plain);
        mdd.set_size(d, 4).unwrap();
        assert_eq!(
            mdd.add_path(d, &[0, 1]),
            Err(MddError::PathLength {
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn test_add_edge_overwrites() {
        let mut mdd = Mdd::new();
        let a = mdd.allocate_node(NodeKind::Plain);
        let b = mdd.allocate_node(NodeKind::Plain);
        let c = mdd.allocate_node(NodeKind::Plain);
        mdd.add_edge(a, 1, b).unwrap();
        mdd.add_edge(a, 1, c).unwrap();
        assert_eq!(mdd.children(a).unwrap().len(), 1);
        assert_eq!(mdd.node(a).unwrap().child(1), Some(c));
    }

    #[test]
    fn test_free_diagram_releases_nodes() {
        let mut mdd = Mdd::new();
        let d = mdd.create_diagram(DiagramKind::Plain);
        mdd.set_size(d, 4).unwrap();
        mdd.add_path(d, &[0, 1, 2]).unwrap();
        assert_eq!(mdd.live_nodes(), 4);

        mdd.free_diagram(d).unwrap();
        assert_eq!(mdd.live_nodes(), 0);
        assert_eq!(mdd.live_diagrams(), 0);
        assert!(mdd.size(d).is_err());
        assert!(matches!(mdd.free_diagram(d), Err(MddError::StaleHandle(_))));
    }

    #[test]
    fn test_stale_node_handle() {
        let mut mdd = Mdd::new();
        let a = mdd.allocate_node(NodeKind::Plain);
        mdd.free_node(a).unwrap();
        let b = mdd.allocate_node(NodeKind::Plain);
        assert_eq!(a.index(), b.index());
        assert_eq!(mdd.node(a).unwrap_err(), MddError::StaleHandle(a.handle()));
        assert_eq!(mdd.free_node(a), Err(MddError::StaleHandle(a.handle())));
    }

    #[test]
    fn test_set_root_kind() {
        let mut mdd = Mdd::new();
        let d = mdd.create_diagram(DiagramKind::Plain);
        mdd.set_size(d, 2).unwrap();
        let old = mdd.root(d).unwrap();
        let fresh = mdd.allocate_node(NodeKind::Plain);
        assert_eq!(mdd.set_root(d, fresh).unwrap(), old);
        assert!(mdd.layer(d, 0).unwrap().contains(fresh));
        assert!(!mdd.layer(d, 0).unwrap().contains(old));

        let wrong = mdd.allocate_node(NodeKind::Property);
        assert_eq!(
            mdd.set_root(d, wrong),
            Err(MddError::RootKindMismatch {
                expected: NodeKind::Plain,
                found: NodeKind::Property
            })
        );
    }
}
