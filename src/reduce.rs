//! Reduction: canonicalization by merging structurally equivalent nodes.
//!
//! Layers are processed bottom-up. Before a node is grouped, its arcs are
//! rewritten against the decisions already taken for the layer below:
//! arcs into merged nodes are redirected to the representative, arcs into
//! removed dead ends are dropped. Nodes are then grouped by their exact
//! `(label, child, cost)` signature and every group collapses into one
//! representative. A final top-down sweep frees nodes no longer reachable
//! from the root.
//!
//! After reduction no two nodes of a layer share a signature, every node
//! except the terminal has an outgoing arc (the root of an empty diagram is
//! the only exception), and every node except the terminal is reachable.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use log::{debug, trace};

use crate::error::Result;
use crate::mdd::Mdd;
use crate::node::{Node, NodeKind};
use crate::reference::{DiagramId, NodeId};
use crate::types::{Cost, Label};

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
struct Signature {
    kind: NodeKind,
    arcs: Vec<(Label, NodeId, Cost)>,
}

impl Signature {
    fn of(node: &Node) -> Self {
        Self {
            kind: node.kind(),
            arcs: node
                .arcs()
                .iter()
                .map(|(label, child)| (label, child, node.cost(label).unwrap_or(0)))
                .collect(),
        }
    }
}

/// What happened to a node during the bottom-up pass.
#[derive(Debug, Copy, Clone)]
enum Fate {
    Merged(NodeId),
    Removed,
}

impl Mdd {
    /// Reduce the diagram to canonical form.
    ///
    /// Idempotent, and preserves the set of accepted label sequences.
    pub fn reduce(&mut self, d: DiagramId) -> Result<()> {
        let size = self.size(d)?;
        let root = self.root(d)?;
        let tt = self.tt(d)?;
        debug!("reduce(d = {}, size = {})", d, size);

        let mut fates: HashMap<NodeId, Fate> = HashMap::new();
        let mut merged = 0;
        let mut removed = 0;

        // Paths end at `tt` only; anything else in the terminal layer is a dead end.
        for node in self.layer_nodes(d, size - 1)? {
            if node != tt {
                trace!("reduce: {} in the terminal layer is a dead end", node);
                fates.insert(node, Fate::Removed);
                self.discard_node(d, size - 1, node)?;
                removed += 1;
            }
        }

        for level in (0..size - 1).rev() {
            let mut nodes = self.layer_nodes(d, level)?;
            // The root always represents its group.
            if let Some(pos) = nodes.iter().position(|&n| n == root) {
                nodes.swap(0, pos);
            }

            let mut groups: HashMap<Signature, NodeId> = HashMap::new();
            for node in nodes {
                self.redirect_arcs(node, &fates)?;

                let n = self.node(node)?;
                if n.arcs().is_empty() && node != root {
                    trace!("reduce: {} at L{} is a dead end", node, level);
                    fates.insert(node, Fate::Removed);
                    self.discard_node(d, level, node)?;
                    removed += 1;
                    continue;
                }

                match groups.entry(Signature::of(n)) {
                    Entry::Occupied(e) => {
                        trace!("reduce: {} at L{} merged into {}", node, level, e.get());
                        fates.insert(node, Fate::Merged(*e.get()));
                        self.discard_node(d, level, node)?;
                        merged += 1;
                    }
                    Entry::Vacant(e) => {
                        e.insert(node);
                    }
                }
            }
        }

        let pruned = self.prune_unreachable(d)?;
        debug!(
            "reduce(d = {}): merged {}, removed {} dead ends, pruned {} unreachable, {} nodes left",
            d,
            merged,
            removed,
            pruned,
            self.node_count(d)?
        );
        Ok(())
    }

    fn redirect_arcs(&mut self, node: NodeId, fates: &HashMap<NodeId, Fate>) -> Result<()> {
        let n = self.node(node)?;
        let updates: Vec<(Label, Option<NodeId>, Option<Cost>)> = n
            .arcs()
            .iter()
            .filter_map(|(label, child)| match fates.get(&child)? {
                Fate::Merged(rep) => Some((label, Some(*rep), n.cost(label))),
                Fate::Removed => Some((label, None, None)),
            })
            .collect();

        for (label, target, cost) in updates {
            match target {
                Some(rep) => self.link(node, label, rep, cost)?,
                None => {
                    self.unlink(node, label)?;
                }
            }
        }
        Ok(())
    }

    /// Free every node, other than the terminal, that no arc from the root
    /// side reaches. Returns the number of freed nodes.
    fn prune_unreachable(&mut self, d: DiagramId) -> Result<usize> {
        let size = self.size(d)?;
        let tt = self.tt(d)?;
        let mut reachable: HashSet<NodeId> = HashSet::from([self.root(d)?]);
        let mut pruned = 0;

        for level in 0..size {
            let mut next = HashSet::new();
            for node in self.layer_nodes(d, level)? {
                if node != tt && !reachable.contains(&node) {
                    self.discard_node(d, level, node)?;
                    pruned += 1;
                    continue;
                }
                next.extend(self.children(node)?.iter().map(|(_, child)| child));
            }
            reachable = next;
        }
        Ok(pruned)
    }
}
