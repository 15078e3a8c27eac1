//! Cost diagrams: arcs carry a cost, mirrored on the destination node so that
//! both top-down and bottom-up dynamic programs can walk the diagram.

use std::collections::HashMap;

use log::debug;

use crate::error::{MddError, Result};
use crate::mdd::{DiagramKind, Mdd};
use crate::node::{InArcs, NodeKind};
use crate::reference::{DiagramId, NodeId};
use crate::types::{Cost, Label};

/// Direction of optimization for the cost dynamic programs.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Objective {
    Minimize,
    Maximize,
}

impl Objective {
    fn pick(self, a: Cost, b: Cost) -> Cost {
        match self {
            Objective::Minimize => a.min(b),
            Objective::Maximize => a.max(b),
        }
    }

    fn relax(self, best: &mut HashMap<NodeId, Cost>, node: NodeId, value: Cost) {
        best.entry(node)
            .and_modify(|v| *v = self.pick(*v, value))
            .or_insert(value);
    }
}

impl Mdd {
    /// Insert or overwrite the arc `source --label--> destination` with a cost.
    /// Both ends must be cost nodes.
    pub fn add_arc(
        &mut self,
        source: NodeId,
        label: Label,
        destination: NodeId,
        cost: Cost,
    ) -> Result<()> {
        if self.node(destination)?.kind() != NodeKind::Cost {
            return Err(MddError::NotACostNode(destination));
        }
        self.link(source, label, destination, Some(cost))
    }

    /// Add a path of `(label, cost)` steps from the root to the terminal,
    /// reusing existing arcs and overwriting their costs.
    pub fn add_cost_path(&mut self, d: DiagramId, steps: &[(Label, Cost)]) -> Result<()> {
        self.require_cost_diagram(d)?;
        self.add_path_with(d, steps.iter().map(|&(label, cost)| (label, Some(cost))))
    }

    /// Cost of the `label` arc of a cost node, `None` if there is no such arc.
    pub fn arc_cost(&self, node: NodeId, label: Label) -> Result<Option<Cost>> {
        let n = self.node(node)?;
        if n.kind() != NodeKind::Cost {
            return Err(MddError::NotACostNode(node));
        }
        Ok(n.cost(label))
    }

    /// Incoming arcs of a cost node.
    pub fn in_arcs(&self, node: NodeId) -> Result<&InArcs> {
        self.node(node)?
            .in_arcs()
            .ok_or(MddError::NotACostNode(node))
    }

    /// Best accumulated cost from the root to every reachable node.
    pub fn top_down_costs(&self, d: DiagramId, objective: Objective) -> Result<HashMap<NodeId, Cost>> {
        self.require_cost_diagram(d)?;
        let size = self.size(d)?;
        let mut best = HashMap::from([(self.root(d)?, 0)]);

        for level in 0..size - 1 {
            for node in self.layer(d, level)?.iter() {
                let Some(&here) = best.get(&node) else {
                    continue;
                };
                let n = self.node(node)?;
                for (label, child) in n.arcs().iter() {
                    let cost = n.cost(label).ok_or(MddError::NotACostNode(node))?;
                    objective.relax(&mut best, child, here + cost);
                }
            }
        }
        Ok(best)
    }

    /// Best cost from every node to the terminal, following the mirrored
    /// in-arcs upwards.
    pub fn bottom_up_costs(&self, d: DiagramId, objective: Objective) -> Result<HashMap<NodeId, Cost>> {
        self.require_cost_diagram(d)?;
        let size = self.size(d)?;
        let mut best = HashMap::from([(self.tt(d)?, 0)]);

        for level in (1..size).rev() {
            for node in self.layer(d, level)?.iter() {
                let Some(&here) = best.get(&node) else {
                    continue;
                };
                for (parent, _, cost) in self.in_arcs(node)?.iter() {
                    objective.relax(&mut best, parent, here + cost);
                }
            }
        }
        Ok(best)
    }

    /// Remove every arc whose cheapest root-to-terminal path through it costs
    /// more than `budget`, then reduce. Returns the number of removed arcs.
    pub fn prune_by_cost(&mut self, d: DiagramId, budget: Cost) -> Result<usize> {
        let down = self.top_down_costs(d, Objective::Minimize)?;
        let up = self.bottom_up_costs(d, Objective::Minimize)?;
        let size = self.size(d)?;

        let mut doomed: Vec<(NodeId, Label)> = Vec::new();
        for level in 0..size - 1 {
            for node in self.layer(d, level)?.iter() {
                let n = self.node(node)?;
                for (label, child) in n.arcs().iter() {
                    let through = match (down.get(&node), n.cost(label), up.get(&child)) {
                        (Some(a), Some(c), Some(b)) => Some(a + c + b),
                        _ => None,
                    };
                    if through.map_or(true, |total| total > budget) {
                        doomed.push((node, label));
                    }
                }
            }
        }

        debug!(
            "prune_by_cost(d = {}, budget = {}): removing {} arcs",
            d,
            budget,
            doomed.len()
        );
        for &(node, label) in &doomed {
            self.unlink(node, label)?;
        }
        self.reduce(d)?;
        Ok(doomed.len())
    }

    fn require_cost_diagram(&self, d: DiagramId) -> Result<()> {
        match self.kind(d)? {
            DiagramKind::Cost => Ok(()),
            _ => Err(MddError::NotACostNode(self.root(d)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn sample(mdd: &mut Mdd) -> DiagramId {
        let d = mdd.create_diagram(DiagramKind::Cost);
        mdd.set_size(d, 4).unwrap();
        mdd.add_cost_path(d, &[(0, 1), (0, 2), (0, 3)]).unwrap();
        mdd.add_cost_path(d, &[(0, 1), (1, 5), (0, 1)]).unwrap();
        mdd.add_cost_path(d, &[(1, 4), (0, 0), (1, 0)]).unwrap();
        d
    }

    #[test]
    fn test_add_arc_mirrors_in_arcs() {
        let mut mdd = Mdd::new();
        let a = mdd.allocate_node(NodeKind::Cost);
        let b = mdd.allocate_node(NodeKind::Cost);
        let c = mdd.allocate_node(NodeKind::Cost);

        mdd.add_arc(a, 3, b, 7).unwrap();
        assert_eq!(mdd.arc_cost(a, 3).unwrap(), Some(7));
        assert_eq!(mdd.in_arcs(b).unwrap().iter().collect::<Vec<_>>(), vec![(a, 3, 7)]);

        // Overwriting moves the mirrored arc to the new destination.
        mdd.add_arc(a, 3, c, 2).unwrap();
        assert!(mdd.in_arcs(b).unwrap().is_empty());
        assert_eq!(mdd.in_arcs(c).unwrap().iter().collect::<Vec<_>>(), vec![(a, 3, 2)]);
    }

    #[test]
    fn test_add_arc_requires_cost_nodes() {
        let mut mdd = Mdd::new();
        let a = mdd.allocate_node(NodeKind::Cost);
        let p = mdd.allocate_node(NodeKind::Plain);
        assert_eq!(mdd.add_arc(a, 0, p, 1), Err(MddError::NotACostNode(p)));
        assert_eq!(mdd.add_arc(p, 0, a, 1), Err(MddError::NotACostNode(p)));
        assert_eq!(mdd.in_arcs(p).unwrap_err(), MddError::NotACostNode(p));
    }

    #[test]
    fn test_cost_root_must_be_cost_node() {
        let mut mdd = Mdd::new();
        let d = mdd.create_diagram(DiagramKind::Cost);
        let plain = mdd.allocate_node(NodeKind::Plain);
        assert_eq!(
            mdd.set_root(d, plain),
            Err(MddError::RootKindMismatch {
                expected: NodeKind::Cost,
                found: NodeKind::Plain
            })
        );
        let fresh = mdd.allocate_node(NodeKind::Cost);
        assert!(mdd.set_root(d, fresh).is_ok());
    }

    #[test]
    fn test_top_down_and_bottom_up_agree() {
        let mut mdd = Mdd::new();
        let d = sample(&mut mdd);
        let root = mdd.root(d).unwrap();
        let tt = mdd.tt(d).unwrap();

        let down_min = mdd.top_down_costs(d, Objective::Minimize).unwrap();
        let up_min = mdd.bottom_up_costs(d, Objective::Minimize).unwrap();
        assert_eq!(down_min[&tt], 4);
        assert_eq!(up_min[&root], 4);

        let down_max = mdd.top_down_costs(d, Objective::Maximize).unwrap();
        let up_max = mdd.bottom_up_costs(d, Objective::Maximize).unwrap();
        assert_eq!(down_max[&tt], 7);
        assert_eq!(up_max[&root], 7);
    }

    #[test]
    fn test_prune_by_cost() {
        let mut mdd = Mdd::new();
        let d = sample(&mut mdd);
        assert_eq!(mdd.count_paths(d).unwrap(), 3u32.into());

        mdd.prune_by_cost(d, 6).unwrap();
        let mut paths: Vec<_> = mdd.paths(d).unwrap().collect();
        paths.sort();
        assert_eq!(paths, vec![vec![0, 0, 0], vec![1, 0, 1]]);
    }

    #[test]
    fn test_cost_dp_on_plain_diagram() {
        let mut mdd = Mdd::new();
        let d = mdd.create_diagram(DiagramKind::Plain);
        mdd.set_size(d, 2).unwrap();
        assert!(mdd.top_down_costs(d, Objective::Minimize).is_err());
        assert!(mdd.add_cost_path(d, &[(0, 1)]).is_err());
    }
}
